use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, info, warn};

use super::models::Appointment;
use super::store::{AppointmentStore, LoadCompletion, StoreSnapshot};
use super::views::{DerivedViews, ViewCache};
use crate::config::Config;
use crate::error::{component_error, SyncResult};

/// The appointments actor that owns the canonical store and serializes
/// every write to it
pub struct AppointmentsActor {
    config: Arc<RwLock<Config>>,
    store: AppointmentStore,
    view_cache: ViewCache,
    snapshot_tx: watch::Sender<StoreSnapshot>,
    command_rx: mpsc::Receiver<AppointmentsCommand>,
}

/// Commands that can be sent to the appointments actor
pub enum AppointmentsCommand {
    /// Mark a load as started and reply with its generation ticket
    BeginLoad(mpsc::Sender<u64>),
    /// Settle a load; replies whether it was applied or discarded as stale
    CompleteLoad {
        generation: u64,
        outcome: Result<Vec<Appointment>, String>,
        reply: mpsc::Sender<bool>,
    },
    ApplyCreate(Appointment, mpsc::Sender<()>),
    ApplyUpdate(Appointment, mpsc::Sender<bool>),
    ApplyCancel(String, mpsc::Sender<bool>),
    ApplyDelete(String, mpsc::Sender<bool>),
    Find(String, mpsc::Sender<Option<Appointment>>),
    GetSnapshot(mpsc::Sender<StoreSnapshot>),
    GetViews(mpsc::Sender<Arc<DerivedViews>>),
    Subscribe(mpsc::Sender<watch::Receiver<StoreSnapshot>>),
    Shutdown,
}

/// Handle for communicating with the appointments actor
#[derive(Clone)]
pub struct AppointmentsActorHandle {
    command_tx: mpsc::Sender<AppointmentsCommand>,
}

impl AppointmentsActorHandle {
    /// Send a command carrying a reply channel and wait for the response
    async fn request<T>(
        &self,
        command: impl FnOnce(mpsc::Sender<T>) -> AppointmentsCommand,
    ) -> SyncResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(command(response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))
    }

    pub async fn begin_load(&self) -> SyncResult<u64> {
        self.request(AppointmentsCommand::BeginLoad).await
    }

    pub async fn complete_load(
        &self,
        generation: u64,
        outcome: Result<Vec<Appointment>, String>,
    ) -> SyncResult<bool> {
        self.request(|reply| AppointmentsCommand::CompleteLoad {
            generation,
            outcome,
            reply,
        })
        .await
    }

    pub async fn apply_create(&self, record: Appointment) -> SyncResult<()> {
        self.request(|reply| AppointmentsCommand::ApplyCreate(record, reply))
            .await
    }

    pub async fn apply_update(&self, record: Appointment) -> SyncResult<bool> {
        self.request(|reply| AppointmentsCommand::ApplyUpdate(record, reply))
            .await
    }

    pub async fn apply_cancel(&self, id: String) -> SyncResult<bool> {
        self.request(|reply| AppointmentsCommand::ApplyCancel(id, reply))
            .await
    }

    pub async fn apply_delete(&self, id: String) -> SyncResult<bool> {
        self.request(|reply| AppointmentsCommand::ApplyDelete(id, reply))
            .await
    }

    pub async fn find(&self, id: String) -> SyncResult<Option<Appointment>> {
        self.request(|reply| AppointmentsCommand::Find(id, reply))
            .await
    }

    pub async fn snapshot(&self) -> SyncResult<StoreSnapshot> {
        self.request(AppointmentsCommand::GetSnapshot).await
    }

    pub async fn views(&self) -> SyncResult<Arc<DerivedViews>> {
        self.request(AppointmentsCommand::GetViews).await
    }

    pub async fn subscribe(&self) -> SyncResult<watch::Receiver<StoreSnapshot>> {
        self.request(AppointmentsCommand::Subscribe).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> SyncResult<()> {
        let _ = self.command_tx.send(AppointmentsCommand::Shutdown).await;
        Ok(())
    }
}

impl AppointmentsActor {
    /// Create a new actor and return its handle
    pub fn new(config: Arc<RwLock<Config>>) -> (Self, AppointmentsActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let store = AppointmentStore::new();
        let (snapshot_tx, _) = watch::channel(store.snapshot());

        let actor = Self {
            config,
            store,
            view_cache: ViewCache::new(),
            snapshot_tx,
            command_rx,
        };

        let handle = AppointmentsActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Appointments actor started");

        // Process commands
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                AppointmentsCommand::BeginLoad(reply) => {
                    let generation = self.store.begin_load();
                    self.publish();
                    let _ = reply.send(generation).await;
                }
                AppointmentsCommand::CompleteLoad {
                    generation,
                    outcome,
                    reply,
                } => {
                    let applied = match self.store.complete_load(generation, outcome) {
                        LoadCompletion::Applied { resurrected } => {
                            for id in &resurrected {
                                warn!(
                                    "Appointment {} was removed locally but is still present on the server",
                                    id
                                );
                            }
                            self.publish();
                            true
                        }
                        LoadCompletion::Stale => {
                            debug!("Discarding stale load completion (generation {})", generation);
                            false
                        }
                    };
                    let _ = reply.send(applied).await;
                }
                AppointmentsCommand::ApplyCreate(record, reply) => {
                    self.store.apply_create(record);
                    self.publish();
                    let _ = reply.send(()).await;
                }
                AppointmentsCommand::ApplyUpdate(record, reply) => {
                    let replaced = self.store.apply_update(&record);
                    if replaced {
                        self.publish();
                    }
                    let _ = reply.send(replaced).await;
                }
                AppointmentsCommand::ApplyCancel(id, reply) => {
                    let cancelled = self.store.apply_cancel(&id);
                    if cancelled {
                        self.publish();
                    }
                    let _ = reply.send(cancelled).await;
                }
                AppointmentsCommand::ApplyDelete(id, reply) => {
                    let removed = self.store.apply_delete(&id);
                    if removed {
                        self.publish();
                    }
                    let _ = reply.send(removed).await;
                }
                AppointmentsCommand::Find(id, reply) => {
                    let _ = reply.send(self.store.find(&id)).await;
                }
                AppointmentsCommand::GetSnapshot(reply) => {
                    let _ = reply.send(self.store.snapshot()).await;
                }
                AppointmentsCommand::GetViews(reply) => {
                    // Get the recency limit from config
                    let recent_limit = {
                        let config_read = self.config.read().await;
                        config_read.recent_limit
                    };
                    let snapshot = self.store.snapshot();
                    let views = self.view_cache.views_for(&snapshot.appointments, recent_limit);
                    let _ = reply.send(views).await;
                }
                AppointmentsCommand::Subscribe(reply) => {
                    let _ = reply.send(self.snapshot_tx.subscribe()).await;
                }
                AppointmentsCommand::Shutdown => {
                    info!("Appointments actor shutting down");
                    break;
                }
            }
        }

        info!("Appointments actor shut down");
    }

    /// Publish the current snapshot. The watch value is replaced even when
    /// nobody is subscribed yet, so a late subscriber starts from the
    /// current state rather than the founding snapshot.
    fn publish(&self) {
        self.snapshot_tx.send_replace(self.store.snapshot());
    }
}
