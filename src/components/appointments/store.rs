use std::collections::HashSet;
use std::sync::Arc;

use super::models::{Appointment, AppointmentStatus};

/// Ternary loading state of the canonical collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// A load is running; a fresh store stays here until the first load settles
    InFlight,
    /// The last load replaced the collection successfully
    Loaded,
    /// The last load failed and the collection was cleared
    Failed,
}

/// Immutable point-in-time view of the canonical collection
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub appointments: Arc<Vec<Appointment>>,
    pub load_state: LoadState,
    pub last_error: Option<String>,
}

/// Whether a load completion was applied or superseded by a newer load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadCompletion {
    /// The completion was current. `resurrected` lists locally-deleted ids
    /// that came back with the fresh collection, meaning the remote side
    /// never removed them.
    Applied { resurrected: Vec<String> },
    /// A newer load had begun in the meantime; this completion was discarded
    Stale,
}

/// The canonical appointment collection and its mutation rules.
///
/// This is the only writer of appointment state. It performs no network
/// I/O; sequencing remote calls against these mutations is the handle's
/// job. Readers get `Arc`-shared snapshots and never see the internal
/// buffer.
#[derive(Debug)]
pub struct AppointmentStore {
    appointments: Arc<Vec<Appointment>>,
    load_state: LoadState,
    last_error: Option<String>,
    generation: u64,
    /// Ids removed locally since the last successful load
    deleted_ids: HashSet<String>,
}

impl AppointmentStore {
    pub fn new() -> Self {
        Self {
            appointments: Arc::new(Vec::new()),
            load_state: LoadState::InFlight,
            last_error: None,
            generation: 0,
            deleted_ids: HashSet::new(),
        }
    }

    /// Current snapshot; cheap, the collection is shared not copied
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            appointments: Arc::clone(&self.appointments),
            load_state: self.load_state,
            last_error: self.last_error.clone(),
        }
    }

    /// Mark a load as started and hand out its generation ticket. A later
    /// `complete_load` with an older ticket is discarded.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.load_state = LoadState::InFlight;
        self.generation
    }

    /// Settle a load. Success atomically replaces the whole collection and
    /// clears the error; failure clears the collection and records the
    /// error. Either way the loading state leaves in-flight, unless the
    /// ticket is stale.
    pub fn complete_load(
        &mut self,
        generation: u64,
        outcome: Result<Vec<Appointment>, String>,
    ) -> LoadCompletion {
        if generation != self.generation {
            return LoadCompletion::Stale;
        }

        match outcome {
            Ok(records) => {
                let resurrected: Vec<String> = records
                    .iter()
                    .filter_map(|record| record.id())
                    .filter(|id| self.deleted_ids.contains(*id))
                    .map(|id| id.to_string())
                    .collect();

                self.appointments = Arc::new(records);
                self.load_state = LoadState::Loaded;
                self.last_error = None;
                self.deleted_ids.clear();

                LoadCompletion::Applied { resurrected }
            }
            Err(message) => {
                self.appointments = Arc::new(Vec::new());
                self.load_state = LoadState::Failed;
                self.last_error = Some(message);

                LoadCompletion::Applied {
                    resurrected: Vec::new(),
                }
            }
        }
    }

    /// Append a confirmed record. If the id is already present the existing
    /// element is replaced in place instead, keeping at most one element
    /// per id (covers retried creates).
    pub fn apply_create(&mut self, record: Appointment) {
        if let Some(id) = record.id() {
            self.deleted_ids.remove(id);
        }

        let mut records = self.appointments.as_ref().clone();
        let existing = record
            .id()
            .and_then(|id| records.iter().position(|r| r.id() == Some(id)));
        match existing {
            Some(index) => records[index] = record,
            None => records.push(record),
        }
        self.appointments = Arc::new(records);
    }

    /// Replace the element whose id matches; no-op when absent. Returns
    /// whether anything was replaced.
    pub fn apply_update(&mut self, record: &Appointment) -> bool {
        let Some(id) = record.id() else {
            return false;
        };
        let Some(index) = self.appointments.iter().position(|r| r.id() == Some(id)) else {
            return false;
        };

        let mut records = self.appointments.as_ref().clone();
        records[index] = record.clone();
        self.appointments = Arc::new(records);
        true
    }

    /// Set status to cancelled in place; no-op when absent
    pub fn apply_cancel(&mut self, id: &str) -> bool {
        let Some(index) = self.appointments.iter().position(|r| r.id() == Some(id)) else {
            return false;
        };

        let mut records = self.appointments.as_ref().clone();
        records[index].status = AppointmentStatus::Cancelled;
        self.appointments = Arc::new(records);
        true
    }

    /// Remove the element whose id matches and remember the id for the
    /// resurrection check on the next load; no-op when absent
    pub fn apply_delete(&mut self, id: &str) -> bool {
        let Some(index) = self.appointments.iter().position(|r| r.id() == Some(id)) else {
            return false;
        };

        let mut records = self.appointments.as_ref().clone();
        records.remove(index);
        self.appointments = Arc::new(records);
        self.deleted_ids.insert(id.to_string());
        true
    }

    /// Look up a record by id, cloned out of the collection
    pub fn find(&self, id: &str) -> Option<Appointment> {
        self.appointments
            .iter()
            .find(|r| r.id() == Some(id))
            .cloned()
    }
}

impl Default for AppointmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> Appointment {
        Appointment {
            id: Some(id.to_string()),
            client_name: format!("Client {}", id),
            date: "2024-03-05".to_string(),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            duration_minutes: 60,
            ..Default::default()
        }
    }

    fn ids(store: &AppointmentStore) -> Vec<String> {
        store
            .snapshot()
            .appointments
            .iter()
            .map(|r| r.id().unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_new_store_is_empty_and_in_flight() {
        let store = AppointmentStore::new();
        let snapshot = store.snapshot();
        assert!(snapshot.appointments.is_empty());
        assert_eq!(snapshot.load_state, LoadState::InFlight);
        assert_eq!(snapshot.last_error, None);
    }

    #[test]
    fn test_load_success_replaces_collection() {
        let mut store = AppointmentStore::new();
        store.apply_create(record("old"));

        let generation = store.begin_load();
        assert_eq!(store.snapshot().load_state, LoadState::InFlight);

        let completion = store.complete_load(generation, Ok(vec![record("a"), record("b")]));
        assert_eq!(
            completion,
            LoadCompletion::Applied {
                resurrected: Vec::new()
            }
        );
        assert_eq!(ids(&store), vec!["a", "b"]);
        assert_eq!(store.snapshot().load_state, LoadState::Loaded);
        assert_eq!(store.snapshot().last_error, None);
    }

    #[test]
    fn test_load_failure_clears_collection() {
        let mut store = AppointmentStore::new();
        let generation = store.begin_load();
        store.complete_load(generation, Ok(vec![record("a")]));

        let generation = store.begin_load();
        let completion = store.complete_load(generation, Err("connection refused".to_string()));
        assert!(matches!(completion, LoadCompletion::Applied { .. }));

        let snapshot = store.snapshot();
        assert!(snapshot.appointments.is_empty());
        assert_eq!(snapshot.load_state, LoadState::Failed);
        assert_eq!(snapshot.last_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_stale_load_completion_is_discarded() {
        let mut store = AppointmentStore::new();
        let first = store.begin_load();
        let second = store.begin_load();

        // Second load settles first and wins
        assert!(matches!(
            store.complete_load(second, Ok(vec![record("winner")])),
            LoadCompletion::Applied { .. }
        ));
        // First settles late; its whole view is discarded
        assert_eq!(
            store.complete_load(first, Ok(vec![record("loser")])),
            LoadCompletion::Stale
        );
        assert_eq!(ids(&store), vec!["winner"]);
        assert_eq!(store.snapshot().load_state, LoadState::Loaded);

        // A stale failure must not clear state either
        assert_eq!(
            store.complete_load(first, Err("late failure".to_string())),
            LoadCompletion::Stale
        );
        assert_eq!(ids(&store), vec!["winner"]);
    }

    #[test]
    fn test_apply_create_appends() {
        let mut store = AppointmentStore::new();
        store.apply_create(record("a"));
        store.apply_create(record("b"));
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_apply_create_with_known_id_replaces_in_place() {
        let mut store = AppointmentStore::new();
        store.apply_create(record("a"));
        store.apply_create(record("b"));

        let mut retried = record("a");
        retried.note = Some("second attempt".to_string());
        store.apply_create(retried);

        assert_eq!(ids(&store), vec!["a", "b"]);
        assert_eq!(
            store.find("a").unwrap().note.as_deref(),
            Some("second attempt")
        );
    }

    #[test]
    fn test_apply_update_replaces_and_is_idempotent() {
        let mut store = AppointmentStore::new();
        store.apply_create(record("a"));

        let mut updated = record("a");
        updated.client_name = "Renamed".to_string();
        assert!(store.apply_update(&updated));
        let after_once = store.snapshot().appointments;

        assert!(store.apply_update(&updated));
        let after_twice = store.snapshot().appointments;

        assert_eq!(*after_once, *after_twice);
        assert_eq!(store.find("a").unwrap().client_name, "Renamed");
    }

    #[test]
    fn test_apply_update_without_match_is_noop() {
        let mut store = AppointmentStore::new();
        store.apply_create(record("a"));
        let before = store.snapshot().appointments;

        assert!(!store.apply_update(&record("ghost")));
        let after = store.snapshot().appointments;

        // The untouched collection keeps its identity
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_apply_cancel_sets_status_in_place() {
        let mut store = AppointmentStore::new();
        store.apply_create(record("a"));
        store.apply_create(record("b"));

        assert!(store.apply_cancel("a"));
        assert_eq!(store.find("a").unwrap().status, AppointmentStatus::Cancelled);
        assert_eq!(store.find("b").unwrap().status, AppointmentStatus::Scheduled);
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_apply_cancel_on_absent_id_is_noop() {
        let mut store = AppointmentStore::new();
        store.apply_create(record("a"));
        let before = store.snapshot().appointments;

        assert!(!store.apply_cancel("ghost"));
        assert!(Arc::ptr_eq(&before, &store.snapshot().appointments));
    }

    #[test]
    fn test_apply_delete_removes_and_remembers() {
        let mut store = AppointmentStore::new();
        let generation = store.begin_load();
        store.complete_load(generation, Ok(vec![record("a"), record("b")]));

        assert!(store.apply_delete("a"));
        assert_eq!(ids(&store), vec!["b"]);
        assert!(!store.apply_delete("a"));

        // The unaffected remote still has "a"; the next load reports it
        let generation = store.begin_load();
        let completion = store.complete_load(generation, Ok(vec![record("a"), record("b")]));
        assert_eq!(
            completion,
            LoadCompletion::Applied {
                resurrected: vec!["a".to_string()]
            }
        );
        assert_eq!(ids(&store), vec!["a", "b"]);

        // The remembered set resets after a successful load
        let generation = store.begin_load();
        let completion = store.complete_load(generation, Ok(vec![record("a")]));
        assert_eq!(
            completion,
            LoadCompletion::Applied {
                resurrected: Vec::new()
            }
        );
    }

    #[test]
    fn test_mutation_produces_fresh_snapshot() {
        let mut store = AppointmentStore::new();
        store.apply_create(record("a"));
        let before = store.snapshot().appointments;

        assert!(store.apply_cancel("a"));
        let after = store.snapshot().appointments;

        assert!(!Arc::ptr_eq(&before, &after));
        // The earlier snapshot is untouched by the later mutation
        assert_eq!(before[0].status, AppointmentStatus::Scheduled);
        assert_eq!(after[0].status, AppointmentStatus::Cancelled);
    }

    #[test]
    fn test_find() {
        let mut store = AppointmentStore::new();
        store.apply_create(record("a"));
        assert_eq!(store.find("a").unwrap().id(), Some("a"));
        assert!(store.find("b").is_none());
    }
}
