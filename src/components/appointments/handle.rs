use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::actor::{AppointmentsActor, AppointmentsActorHandle};
use super::client::{AppointmentsApi, RestAppointmentsApi};
use super::models::{Appointment, DeleteOutcome};
use super::store::StoreSnapshot;
use super::views::DerivedViews;
use crate::config::Config;
use crate::error::{not_found_error, validation_error, SyncResult};

/// Handle for the appointment book. Every mutation is remote-first: the
/// booking service confirms the change, and only the confirmed record is
/// applied to the local collection.
///
/// Network calls run on the caller's task, so loads and mutations may
/// overlap; the actor behind this handle serializes the state writes.
#[derive(Clone)]
pub struct AppointmentsHandle {
    actor_handle: AppointmentsActorHandle,
    api: Arc<dyn AppointmentsApi>,
    config: Arc<RwLock<Config>>,
    _actor_task: Arc<JoinHandle<()>>,
}

impl AppointmentsHandle {
    /// Create a new handle backed by the given API client
    pub fn new(config: Arc<RwLock<Config>>, api: Arc<dyn AppointmentsApi>) -> Self {
        let (mut actor, actor_handle) = AppointmentsActor::new(Arc::clone(&config));

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle,
            api,
            config,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Create a new handle talking to the booking service named in the config
    pub async fn from_config(config: Arc<RwLock<Config>>) -> SyncResult<Self> {
        let api = {
            let config_read = config.read().await;
            RestAppointmentsApi::from_config(&config_read)?
        };

        Ok(Self::new(config, Arc::new(api)))
    }

    /// Fetch the full collection from the booking service and replace the
    /// local one with it. Overlapping loads settle last-wins: a completion
    /// that has been superseded by a newer load is discarded.
    pub async fn load(&self) -> SyncResult<StoreSnapshot> {
        let generation = self.actor_handle.begin_load().await?;

        match self.api.fetch_all().await {
            Ok(records) => {
                let applied = self
                    .actor_handle
                    .complete_load(generation, Ok(records))
                    .await?;
                if !applied {
                    debug!("Load {} superseded by a newer load", generation);
                }
                self.actor_handle.snapshot().await
            }
            Err(e) => {
                let applied = self
                    .actor_handle
                    .complete_load(generation, Err(e.to_string()))
                    .await?;
                if applied {
                    error!("Failed to load appointments: {}", e);
                    Err(e)
                } else {
                    // A newer load owns the outcome now
                    debug!("Load {} superseded by a newer load", generation);
                    self.actor_handle.snapshot().await
                }
            }
        }
    }

    /// Book a new appointment. The draft's id is assigned by the service;
    /// the confirmed record is appended to the collection and returned.
    pub async fn create(&self, draft: &Appointment) -> SyncResult<Appointment> {
        let Some(owner_id) = self.owner_id().await else {
            return Err(validation_error(
                "An owner id is required to book appointments (set APPOINTMENTS_OWNER_ID)",
            ));
        };

        let confirmed = match self.api.create(draft, &owner_id).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to book appointment: {}", e);
                return Err(e);
            }
        };

        self.actor_handle.apply_create(confirmed.clone()).await?;
        Ok(confirmed)
    }

    /// Push an edited record to the booking service and replace the local
    /// copy with the confirmed one. A confirmed record whose id is no
    /// longer in the collection leaves the collection untouched.
    pub async fn update(&self, record: &Appointment) -> SyncResult<Appointment> {
        let confirmed = match self.api.update(record).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to update appointment: {}", e);
                return Err(e);
            }
        };

        let replaced = self.actor_handle.apply_update(confirmed.clone()).await?;
        if !replaced {
            if let Some(id) = confirmed.id() {
                warn!("Updated appointment {} is not in the local collection", id);
            }
        }
        Ok(confirmed)
    }

    /// Cancel an appointment by id. The record keeps its place in the
    /// collection with its status set to cancelled.
    pub async fn cancel(&self, id: &str) -> SyncResult<Appointment> {
        let Some(owner_id) = self.owner_id().await else {
            return Err(validation_error(
                "An owner id is required to cancel appointments (set APPOINTMENTS_OWNER_ID)",
            ));
        };

        let Some(record) = self.actor_handle.find(id.to_string()).await? else {
            return Err(not_found_error(&format!(
                "Appointment {} is not in the local collection",
                id
            )));
        };

        let confirmed = match self.api.cancel(&record, &owner_id).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to cancel appointment {}: {}", id, e);
                return Err(e);
            }
        };

        self.actor_handle.apply_cancel(id.to_string()).await?;
        Ok(confirmed)
    }

    /// Remove an appointment from the local collection. The remote delete
    /// is best-effort only, so the record may come back on the next load.
    pub async fn delete(&self, id: &str) -> SyncResult<DeleteOutcome> {
        let remote_removed = match self.api.delete_remote(id).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Remote delete of appointment {} failed: {}", id, e);
                false
            }
        };

        let removed_locally = self.actor_handle.apply_delete(id.to_string()).await?;
        if removed_locally && !remote_removed {
            warn!(
                "Appointment {} removed locally but not confirmed removed on the server",
                id
            );
        }

        Ok(DeleteOutcome {
            id: id.to_string(),
            removed_locally,
            remote_removed,
        })
    }

    /// Get the current snapshot of the collection and its load state
    pub async fn snapshot(&self) -> SyncResult<StoreSnapshot> {
        self.actor_handle.snapshot().await
    }

    /// Get the derived views for the current collection
    pub async fn views(&self) -> SyncResult<Arc<DerivedViews>> {
        self.actor_handle.views().await
    }

    /// Subscribe to snapshot changes
    pub async fn subscribe(&self) -> SyncResult<watch::Receiver<StoreSnapshot>> {
        self.actor_handle.subscribe().await
    }

    /// Shutdown the appointments actor
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.actor_handle.shutdown().await
    }

    async fn owner_id(&self) -> Option<String> {
        let config_read = self.config.read().await;
        config_read.owner_id.clone()
    }
}
