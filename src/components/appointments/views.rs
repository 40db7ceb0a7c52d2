use std::collections::BTreeMap;
use std::sync::Arc;

use super::models::{Appointment, AppointmentStatus};
use super::time::{normalize_date, start_hour};

/// Sentinel bucket for appointments whose date does not parse. Lenient by
/// policy: such records are kept visible, not discarded.
pub const UNKNOWN_DATE_KEY: &str = "unknown";

/// Time-of-day bucket derived from the start hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    /// Morning before 12, afternoon before 17, evening from 17 on
    pub fn for_hour(hour: u32) -> Self {
        if hour < 12 {
            TimeSlot::Morning
        } else if hour < 17 {
            TimeSlot::Afternoon
        } else {
            TimeSlot::Evening
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "Morning",
            TimeSlot::Afternoon => "Afternoon",
            TimeSlot::Evening => "Evening",
        }
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Display aggregates over the whole collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateMetrics {
    pub total: usize,
    pub completed_count: usize,
    pub total_duration_minutes: u64,
    /// Reported as 0 for an empty collection rather than failing the division
    pub average_duration_minutes: f64,
}

/// Appointment counts per time slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotHistogram {
    pub morning: usize,
    pub afternoon: usize,
    pub evening: usize,
}

impl SlotHistogram {
    /// Buckets in their fixed reporting order
    pub fn slots(&self) -> [(TimeSlot, usize); 3] {
        [
            (TimeSlot::Morning, self.morning),
            (TimeSlot::Afternoon, self.afternoon),
            (TimeSlot::Evening, self.evening),
        ]
    }
}

/// All derived views of one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedViews {
    pub by_date: BTreeMap<String, Vec<Appointment>>,
    pub recent: Vec<Appointment>,
    pub metrics: AggregateMetrics,
    pub histogram: SlotHistogram,
}

/// Group appointments by calendar day, preserving collection order within
/// each day. Unparseable dates land under [`UNKNOWN_DATE_KEY`].
pub fn by_date_index(appointments: &[Appointment]) -> BTreeMap<String, Vec<Appointment>> {
    let mut index: BTreeMap<String, Vec<Appointment>> = BTreeMap::new();
    for appointment in appointments {
        let key = normalize_date(&appointment.date)
            .unwrap_or_else(|| UNKNOWN_DATE_KEY.to_string());
        index.entry(key).or_default().push(appointment.clone());
    }
    index
}

/// First `limit` elements in current storage order. There is no recency
/// sort; callers seed order by loading in remote-provided order.
pub fn recent_appointments(appointments: &[Appointment], limit: usize) -> Vec<Appointment> {
    appointments.iter().take(limit).cloned().collect()
}

pub fn aggregate_metrics(appointments: &[Appointment]) -> AggregateMetrics {
    let total = appointments.len();
    let completed_count = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Completed)
        .count();
    let total_duration_minutes: u64 = appointments
        .iter()
        .map(|a| u64::from(a.duration_minutes))
        .sum();
    let average_duration_minutes = if total == 0 {
        0.0
    } else {
        total_duration_minutes as f64 / total as f64
    };

    AggregateMetrics {
        total,
        completed_count,
        total_duration_minutes,
        average_duration_minutes,
    }
}

/// Count appointments per start-hour bucket. Records without a parseable
/// start hour have no bucket and are not counted.
pub fn slot_histogram(appointments: &[Appointment]) -> SlotHistogram {
    let mut histogram = SlotHistogram::default();
    for appointment in appointments {
        let Some(hour) = start_hour(&appointment.start_time) else {
            continue;
        };
        match TimeSlot::for_hour(hour) {
            TimeSlot::Morning => histogram.morning += 1,
            TimeSlot::Afternoon => histogram.afternoon += 1,
            TimeSlot::Evening => histogram.evening += 1,
        }
    }
    histogram
}

/// Compute every view of a snapshot in one pass over the inputs
pub fn compute_views(appointments: &[Appointment], recent_limit: usize) -> DerivedViews {
    DerivedViews {
        by_date: by_date_index(appointments),
        recent: recent_appointments(appointments, recent_limit),
        metrics: aggregate_metrics(appointments),
        histogram: slot_histogram(appointments),
    }
}

/// Memoizes the derived views of the most recent snapshot, keyed by the
/// shared collection's identity and the recency limit they were computed
/// with. Repeated reads between mutations reuse the cached views instead
/// of recomputing them; a changed limit recomputes.
#[derive(Debug, Default)]
pub struct ViewCache {
    cached: Option<(Arc<Vec<Appointment>>, usize, Arc<DerivedViews>)>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self { cached: None }
    }

    pub fn views_for(
        &mut self,
        appointments: &Arc<Vec<Appointment>>,
        recent_limit: usize,
    ) -> Arc<DerivedViews> {
        if let Some((snapshot, limit, views)) = &self.cached {
            if Arc::ptr_eq(snapshot, appointments) && *limit == recent_limit {
                return Arc::clone(views);
            }
        }

        let views = Arc::new(compute_views(appointments, recent_limit));
        self.cached = Some((Arc::clone(appointments), recent_limit, Arc::clone(&views)));
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(
        id: &str,
        date: &str,
        start_time: &str,
        duration_minutes: u32,
        status: AppointmentStatus,
    ) -> Appointment {
        Appointment {
            id: Some(id.to_string()),
            client_name: format!("Client {}", id),
            date: date.to_string(),
            start_time: start_time.to_string(),
            end_time: String::new(),
            duration_minutes,
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_by_date_index_partitions_collection() {
        let appointments = vec![
            appointment("1", "2024-03-05", "09:00", 30, AppointmentStatus::Scheduled),
            appointment("2", "2024-03-06", "10:00", 30, AppointmentStatus::Scheduled),
            appointment("3", "2024-03-05", "11:00", 30, AppointmentStatus::Scheduled),
            appointment("4", "sometime soon", "12:00", 30, AppointmentStatus::Scheduled),
        ];

        let index = by_date_index(&appointments);

        // Every element lands in exactly one bucket
        let bucketed: usize = index.values().map(Vec::len).sum();
        assert_eq!(bucketed, appointments.len());

        // Collection order is preserved within a day
        let march_5 = &index["2024-03-05"];
        assert_eq!(march_5.len(), 2);
        assert_eq!(march_5[0].id(), Some("1"));
        assert_eq!(march_5[1].id(), Some("3"));

        assert_eq!(index["2024-03-06"].len(), 1);
    }

    #[test]
    fn test_by_date_index_buckets_unparseable_under_unknown() {
        let appointments = vec![
            appointment("1", "", "09:00", 30, AppointmentStatus::Scheduled),
            appointment("2", "next week", "10:00", 30, AppointmentStatus::Scheduled),
        ];

        let index = by_date_index(&appointments);
        let unknown = &index[UNKNOWN_DATE_KEY];
        assert_eq!(unknown.len(), 2);
        assert_eq!(unknown[0].id(), Some("1"));
        assert_eq!(unknown[1].id(), Some("2"));
    }

    #[test]
    fn test_by_date_index_accepts_datetime_representations() {
        // A record that bypassed ingress normalization still finds its day
        let appointments = vec![appointment(
            "1",
            "2024-03-05T09:30:00Z",
            "09:30",
            30,
            AppointmentStatus::Scheduled,
        )];

        let index = by_date_index(&appointments);
        assert_eq!(index["2024-03-05"].len(), 1);
    }

    #[test]
    fn test_recent_appointments_takes_leading_elements() {
        let appointments: Vec<Appointment> = (0..7)
            .map(|i| {
                appointment(
                    &i.to_string(),
                    "2024-03-05",
                    "09:00",
                    30,
                    AppointmentStatus::Scheduled,
                )
            })
            .collect();

        let recent = recent_appointments(&appointments, 5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id(), Some("0"));
        assert_eq!(recent[4].id(), Some("4"));

        assert_eq!(recent_appointments(&appointments, 100).len(), 7);
        assert!(recent_appointments(&appointments, 0).is_empty());
    }

    #[test]
    fn test_aggregate_metrics_of_empty_collection() {
        let metrics = aggregate_metrics(&[]);
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.completed_count, 0);
        assert_eq!(metrics.total_duration_minutes, 0);
        // Guarded division, reported as zero
        assert_eq!(metrics.average_duration_minutes, 0.0);
    }

    #[test]
    fn test_dashboard_scenario() {
        let appointments = vec![
            appointment("1", "2024-03-05", "09:00", 60, AppointmentStatus::Scheduled),
            appointment("2", "2024-03-05", "14:00", 90, AppointmentStatus::Completed),
        ];

        let metrics = aggregate_metrics(&appointments);
        assert_eq!(metrics.total, 2);
        assert_eq!(metrics.completed_count, 1);
        assert_eq!(metrics.total_duration_minutes, 150);
        assert_eq!(metrics.average_duration_minutes, 75.0);

        let histogram = slot_histogram(&appointments);
        assert_eq!(histogram.morning, 1);
        assert_eq!(histogram.afternoon, 1);
        assert_eq!(histogram.evening, 0);
    }

    #[test]
    fn test_slot_histogram_hour_boundaries() {
        let appointments = vec![
            appointment("1", "2024-03-05", "00:30", 30, AppointmentStatus::Scheduled),
            appointment("2", "2024-03-05", "11:59", 30, AppointmentStatus::Scheduled),
            appointment("3", "2024-03-05", "12:00", 30, AppointmentStatus::Scheduled),
            appointment("4", "2024-03-05", "16:59", 30, AppointmentStatus::Scheduled),
            appointment("5", "2024-03-05", "17:00", 30, AppointmentStatus::Scheduled),
            appointment("6", "2024-03-05", "23:00", 30, AppointmentStatus::Scheduled),
        ];

        let histogram = slot_histogram(&appointments);
        assert_eq!(histogram.morning, 2);
        assert_eq!(histogram.afternoon, 2);
        assert_eq!(histogram.evening, 2);
    }

    #[test]
    fn test_slot_histogram_skips_unparseable_start_times() {
        let appointments = vec![
            appointment("1", "2024-03-05", "09:00", 30, AppointmentStatus::Scheduled),
            appointment("2", "2024-03-05", "whenever", 30, AppointmentStatus::Scheduled),
        ];

        let histogram = slot_histogram(&appointments);
        assert_eq!(histogram.morning, 1);
        assert_eq!(histogram.afternoon, 0);
        assert_eq!(histogram.evening, 0);
    }

    #[test]
    fn test_slot_reporting_order_is_fixed() {
        let histogram = SlotHistogram {
            morning: 3,
            afternoon: 1,
            evening: 2,
        };
        let labels: Vec<&str> = histogram
            .slots()
            .iter()
            .map(|(slot, _)| slot.label())
            .collect();
        assert_eq!(labels, vec!["Morning", "Afternoon", "Evening"]);
    }

    #[test]
    fn test_view_cache_reuses_by_snapshot_identity() {
        let snapshot = Arc::new(vec![appointment(
            "1",
            "2024-03-05",
            "09:00",
            60,
            AppointmentStatus::Scheduled,
        )]);
        let mut cache = ViewCache::new();

        let first = cache.views_for(&snapshot, 5);
        let second = cache.views_for(&snapshot, 5);
        assert!(Arc::ptr_eq(&first, &second));

        // A content-equal but distinct snapshot recomputes
        let copied = Arc::new(snapshot.as_ref().clone());
        let third = cache.views_for(&copied, 5);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn test_view_cache_recomputes_when_limit_changes() {
        let snapshot = Arc::new(vec![
            appointment("1", "2024-03-05", "09:00", 30, AppointmentStatus::Scheduled),
            appointment("2", "2024-03-05", "10:00", 30, AppointmentStatus::Scheduled),
            appointment("3", "2024-03-05", "11:00", 30, AppointmentStatus::Scheduled),
        ]);
        let mut cache = ViewCache::new();

        let wide = cache.views_for(&snapshot, 5);
        assert_eq!(wide.recent.len(), 3);

        // Same collection, narrower limit: the cached views no longer apply
        let narrow = cache.views_for(&snapshot, 2);
        assert!(!Arc::ptr_eq(&wide, &narrow));
        assert_eq!(narrow.recent.len(), 2);
        assert_eq!(narrow.recent[1].id(), Some("2"));
    }
}
