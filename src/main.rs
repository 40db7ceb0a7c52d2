use tracing::info;
use varausvahti::startup;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting Varausvahti");

    // Load configuration
    let config = startup::load_config().await?;

    // Start the sync monitor
    startup::start_monitor(config).await
}
