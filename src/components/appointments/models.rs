use serde::{Deserialize, Serialize};

/// Lifecycle status of an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single appointment record as held locally and exchanged with the
/// booking service. Field names on the wire follow the service's JSON
/// (`_id`, `userId`, `clientName`, `startTime`, `endTime`, `duration`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Assigned by the remote service; `None` until the record is persisted
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The user the appointment was booked for
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub client_name: String,
    /// Calendar date, canonical form YYYY-MM-DD after ingress normalization
    #[serde(default)]
    pub date: String,
    /// Wall-clock HH:MM
    #[serde(default)]
    pub start_time: String,
    /// Wall-clock HH:MM, expected after start_time but not enforced
    #[serde(default)]
    pub end_time: String,
    /// Stored independently of start/end times; never derived from them
    #[serde(rename = "duration", default)]
    pub duration_minutes: u32,
    /// Missing on the wire means scheduled
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Appointment {
    /// Identifier if the record has been persisted remotely
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Response envelope of the list endpoint
#[derive(Debug, Deserialize)]
pub struct AppointmentListPayload {
    pub appointments: Vec<Appointment>,
}

/// Response envelope of the single-record endpoints
#[derive(Debug, Deserialize)]
pub struct AppointmentPayload {
    pub appointment: Appointment,
}

/// Result of a delete, which is local-first because the remote side may
/// not support removal at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub id: String,
    /// Whether the record was present locally and removed
    pub removed_locally: bool,
    /// Whether the remote service confirmed the removal; `false` means the
    /// record was removed locally but is not guaranteed removed on the server
    pub remote_removed: bool,
}
