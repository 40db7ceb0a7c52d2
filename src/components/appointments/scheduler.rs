use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use super::handle::AppointmentsHandle;
use crate::config::Config;

/// Start the background refresh task. It reloads the collection from the
/// booking service on a fixed interval and logs a summary of the derived
/// metrics. An interval of 0 disables the task.
pub async fn start_scheduler(config: Arc<RwLock<Config>>, handle: AppointmentsHandle) {
    let interval_secs = {
        let config_read = config.read().await;
        config_read.refresh_interval_secs
    };

    if interval_secs == 0 {
        info!("Background refresh disabled");
        return;
    }

    info!("Refreshing appointments every {} seconds", interval_secs);

    tokio::spawn(async move {
        loop {
            sleep(Duration::from_secs(interval_secs)).await;

            match handle.load().await {
                Ok(_) => match handle.views().await {
                    Ok(views) => {
                        let metrics = &views.metrics;
                        info!(
                            "Refreshed {} appointments ({} completed, {} minutes booked)",
                            metrics.total, metrics.completed_count, metrics.total_duration_minutes
                        );
                    }
                    Err(e) => {
                        error!("Failed to compute appointment views: {}", e);
                    }
                },
                Err(e) => {
                    error!("Failed to refresh appointments: {}", e);
                }
            }
        }
    });
}
