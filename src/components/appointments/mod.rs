use crate::components::Component;
use crate::config::Config;
use crate::error::SyncResult;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;

mod actor;
mod client;
mod handle;
pub mod models;
mod scheduler;
mod store;
mod time;
mod views;

pub use client::{AppointmentsApi, RestAppointmentsApi};
pub use handle::AppointmentsHandle;
pub use models::{Appointment, AppointmentStatus, DeleteOutcome};
pub use store::{LoadState, StoreSnapshot};
pub use views::{AggregateMetrics, DerivedViews, SlotHistogram, TimeSlot, UNKNOWN_DATE_KEY};

/// Appointment book component keeping a local collection in sync with the
/// remote booking service
pub struct Appointments {
    handle: RwLock<Option<AppointmentsHandle>>,
}

impl Appointments {
    pub fn new() -> Self {
        Self {
            handle: RwLock::new(None),
        }
    }

    /// Get the appointments handle if the component has been initialized
    pub async fn get_handle(&self) -> Option<AppointmentsHandle> {
        let handle_lock = self.handle.read().await;
        handle_lock.clone()
    }
}

impl Default for Appointments {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Component for Appointments {
    fn name(&self) -> &'static str {
        "appointments"
    }

    async fn init(&self, config: Arc<RwLock<Config>>) -> SyncResult<()> {
        let handle = {
            let mut handle_lock = self.handle.write().await;
            if handle_lock.is_none() {
                *handle_lock = Some(AppointmentsHandle::from_config(Arc::clone(&config)).await?);
            }
            handle_lock.as_ref().unwrap().clone()
        };

        // Initial load; a failure leaves the empty failed state in place
        // and the background refresh retries later
        if let Err(e) = handle.load().await {
            error!("Initial appointment load failed: {}", e);
        }

        scheduler::start_scheduler(config, handle).await;

        Ok(())
    }

    async fn shutdown(&self) -> SyncResult<()> {
        let handle_lock = self.handle.read().await;
        if let Some(handle) = &*handle_lock {
            handle.shutdown().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
