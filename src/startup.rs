use crate::components::{appointments::Appointments, ComponentManager};
use crate::config::Config;
use crate::error::Error;
use crate::shutdown;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Initialize components and run the sync monitor until shutdown
pub async fn start_monitor(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    // Initialize component manager
    let mut component_manager = ComponentManager::new(Arc::clone(&config));

    // Register the appointments component unless disabled in the config
    let appointments_enabled = {
        let config_read = config.read().await;
        config_read.is_component_enabled("appointments")
    };
    if appointments_enabled {
        component_manager.register(Appointments::new());
    } else {
        info!("Appointments component is disabled");
    }

    // Create a shared component manager
    let component_manager = Arc::new(component_manager);

    // Initialize components
    if let Err(e) = component_manager.init_all().await {
        error!("Failed to initialize components: {:?}", e);
    }

    // Pick up the appointments handle for the snapshot log task
    let appointments_handle = match component_manager
        .get_component_by_name("appointments")
        .and_then(|c| c.as_any().downcast_ref::<Appointments>())
    {
        Some(component) => component.get_handle().await,
        None => None,
    };

    // Log the collection state at startup and again on every change
    let watch_task = tokio::spawn(async move {
        let Some(handle) = appointments_handle else {
            return;
        };
        let Ok(mut snapshots) = handle.subscribe().await else {
            return;
        };

        loop {
            let snapshot = snapshots.borrow_and_update().clone();
            info!(
                "Collection now holds {} appointments ({:?})",
                snapshot.appointments.len(),
                snapshot.load_state
            );
            if snapshots.changed().await.is_err() {
                break;
            }
        }
    });

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Clone component manager for shutdown handler
    let shutdown_components = Arc::clone(&component_manager);

    // Spawn signal handler task
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components).await;
    });

    info!("Sync monitor running");

    // Wait for either the watcher to end or a shutdown signal
    tokio::select! {
        result = watch_task => {
            info!("Snapshot watcher ended");
            match result {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!("Watcher task error: {:?}", e);
                    Err(Error::Other(format!("Watcher task error: {}", e)).into())
                }
            }
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, shutting down monitor...");
            Ok(())
        }
    }
}
