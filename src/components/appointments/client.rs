use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::models::{Appointment, AppointmentListPayload, AppointmentPayload, AppointmentStatus};
use super::time::normalize_date;
use crate::config::Config;
use crate::error::{config_error, remote_api_error, validation_error, SyncResult};

/// Contract over the remote booking service. A trait so tests can swap in
/// an in-memory fake; the real service is spoken to over HTTP.
#[async_trait]
pub trait AppointmentsApi: Send + Sync {
    /// Every appointment visible to the caller, dates normalized
    async fn fetch_all(&self) -> SyncResult<Vec<Appointment>>;

    /// Book a new appointment for the owner; returns the confirmed record
    /// with its server-assigned id
    async fn create(&self, draft: &Appointment, owner_id: &str) -> SyncResult<Appointment>;

    /// Full-record replace by id; returns the confirmed record
    async fn update(&self, record: &Appointment) -> SyncResult<Appointment>;

    /// Cancel by sending the full current record with status flipped to
    /// cancelled; returns the confirmed record
    async fn cancel(&self, record: &Appointment, owner_id: &str) -> SyncResult<Appointment>;

    /// Best-effort removal. The service may not offer deletion at all;
    /// `Ok(false)` means the remote side did not confirm the removal.
    async fn delete_remote(&self, id: &str) -> SyncResult<bool>;
}

/// HTTP implementation of [`AppointmentsApi`]
pub struct RestAppointmentsApi {
    base_url: String,
    client: Client,
}

impl RestAppointmentsApi {
    pub fn new(base_url: &str, request_timeout: Duration) -> SyncResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| config_error(&format!("Invalid API base URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| config_error(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &Config) -> SyncResult<Self> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> SyncResult<Url> {
        let url = format!("{}/{}", self.base_url, path);
        Url::parse(&url).map_err(|e| remote_api_error(&format!("Failed to build URL {}: {}", url, e)))
    }

    /// Check the status and decode the body, reading the error body on
    /// non-success responses
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> SyncResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(remote_api_error(&format!(
                "Failed to {}: HTTP {} - {}",
                context, status, error_body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| remote_api_error(&format!("Failed to parse {} response: {}", context, e)))
    }
}

#[async_trait]
impl AppointmentsApi for RestAppointmentsApi {
    async fn fetch_all(&self) -> SyncResult<Vec<Appointment>> {
        let url = self.endpoint("appointments")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| remote_api_error(&format!("Failed to fetch appointments: {}", e)))?;

        let payload: AppointmentListPayload = Self::decode(response, "fetch appointments").await?;
        Ok(normalize_records(payload.appointments))
    }

    async fn create(&self, draft: &Appointment, owner_id: &str) -> SyncResult<Appointment> {
        let url = self.endpoint("book/appointment")?;

        let mut body = draft.clone();
        body.owner_id = Some(owner_id.to_string());

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| remote_api_error(&format!("Failed to book appointment: {}", e)))?;

        let payload: AppointmentPayload = Self::decode(response, "book appointment").await?;
        Ok(normalize_record(payload.appointment))
    }

    async fn update(&self, record: &Appointment) -> SyncResult<Appointment> {
        let id = record
            .id()
            .ok_or_else(|| validation_error("Cannot update an appointment without an id"))?;
        let url = self.endpoint(&format!("appointments/{}", id))?;

        let response = self
            .client
            .put(url)
            .json(record)
            .send()
            .await
            .map_err(|e| remote_api_error(&format!("Failed to update appointment: {}", e)))?;

        let payload: AppointmentPayload = Self::decode(response, "update appointment").await?;
        Ok(normalize_record(payload.appointment))
    }

    async fn cancel(&self, record: &Appointment, owner_id: &str) -> SyncResult<Appointment> {
        let id = record
            .id()
            .ok_or_else(|| validation_error("Cannot cancel an appointment without an id"))?;
        let url = self.endpoint(&format!("appointments/{}/{}", owner_id, id))?;

        // The cancel route wants the full record, not a patch
        let mut body = record.clone();
        body.status = AppointmentStatus::Cancelled;

        let response = self
            .client
            .put(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| remote_api_error(&format!("Failed to cancel appointment: {}", e)))?;

        let payload: AppointmentPayload = Self::decode(response, "cancel appointment").await?;
        Ok(normalize_record(payload.appointment))
    }

    async fn delete_remote(&self, id: &str) -> SyncResult<bool> {
        let url = self.endpoint(&format!("appointments/{}", id))?;

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| remote_api_error(&format!("Failed to delete appointment: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }

        // The service predates deletion; a missing route is not an error
        if matches!(status.as_u16(), 404 | 405 | 501) {
            return Ok(false);
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        Err(remote_api_error(&format!(
            "Failed to delete appointment: HTTP {} - {}",
            status, error_body
        )))
    }
}

/// Normalize the date field of a record fresh off the wire. Unparseable
/// dates stay as-is and end up in the "unknown" view bucket.
fn normalize_record(mut record: Appointment) -> Appointment {
    if let Some(date) = normalize_date(&record.date) {
        record.date = date;
    }
    record
}

fn normalize_records(records: Vec<Appointment>) -> Vec<Appointment> {
    records.into_iter().map(normalize_record).collect()
}
