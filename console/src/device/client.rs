//! Device status client
//!
//! Thin request layer over the device endpoints. It raises only on transport
//! or HTTP failures and never interprets business payloads: an enrollment
//! status of `failed` is returned as data, not as an error.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use openapi_client::models::{EnrollRequest, FingerprintRecord};

use crate::device::status::DeviceStatus;
use crate::errors::DashboardError;
use crate::http::client::HttpClient;

/// Raw enrollment progress as reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollStatusReport {
    pub status: String,
    pub message: Option<String>,
}

impl EnrollStatusReport {
    pub fn new(status: impl Into<String>, message: Option<&str>) -> Self {
        Self {
            status: status.into(),
            message: message.map(str::to_string),
        }
    }
}

/// A fingerprint registered on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub finger_id: String,
    pub employee_id: Option<String>,
    pub created_at: Option<String>,
}

/// Device subsystem operations used by the door controller and enrollment poller
#[async_trait]
pub trait DeviceStatusClient: Send + Sync {
    /// Read the current device snapshot
    async fn fetch_status(&self, device_id: &str) -> Result<DeviceStatus, DashboardError>;

    /// Release the door latch. Best effort: the physical result must be
    /// confirmed with a later status read.
    async fn send_door_open(&self, device_id: &str) -> Result<(), DashboardError>;

    /// Lock the door again
    async fn send_door_close(&self, device_id: &str) -> Result<(), DashboardError>;

    /// Start a fingerprint capture for an employee, returning the fingerprint id
    async fn start_enroll(&self, device_id: &str, employee_id: &str)
        -> Result<String, DashboardError>;

    /// Read the progress of a capture started with [`start_enroll`](Self::start_enroll)
    async fn fetch_enroll_status(
        &self,
        device_id: &str,
        fingerprint_id: &str,
    ) -> Result<EnrollStatusReport, DashboardError>;

    async fn delete_fingerprint(
        &self,
        device_id: &str,
        fingerprint_id: &str,
    ) -> Result<(), DashboardError>;

    async fn list_fingerprints(
        &self,
        device_id: &str,
        employee_id: &str,
    ) -> Result<Vec<Fingerprint>, DashboardError>;
}

/// [`DeviceStatusClient`] backed by the backend HTTP API
pub struct HttpDeviceClient {
    http_client: Arc<HttpClient>,
}

impl HttpDeviceClient {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl DeviceStatusClient for HttpDeviceClient {
    async fn fetch_status(&self, device_id: &str) -> Result<DeviceStatus, DashboardError> {
        let response = self.http_client.get_device_status(device_id).await?;
        Ok(DeviceStatus::from_response(device_id, &response))
    }

    async fn send_door_open(&self, device_id: &str) -> Result<(), DashboardError> {
        let ack = self.http_client.open_door(device_id).await?;
        debug!("Door open acknowledged by {}: {}", device_id, ack);
        Ok(())
    }

    async fn send_door_close(&self, device_id: &str) -> Result<(), DashboardError> {
        // The backend has no lock command; the latch re-engages on its own
        // once the door shuts, so closing is acknowledged locally.
        debug!("Door close acknowledged locally for {}", device_id);
        Ok(())
    }

    async fn start_enroll(
        &self,
        device_id: &str,
        employee_id: &str,
    ) -> Result<String, DashboardError> {
        let employee_id = employee_id.trim();
        if employee_id.is_empty() {
            return Err(DashboardError::Validation("employee id is empty".to_string()));
        }

        let request = EnrollRequest {
            employee_id: id_to_value(employee_id),
        };
        let response = self.http_client.enroll_fingerprint(device_id, &request).await?;

        response
            .finger_id
            .as_ref()
            .or(response.id.as_ref())
            .and_then(value_to_id)
            .ok_or_else(|| {
                DashboardError::Internal("Enrollment response carries no fingerprint id".to_string())
            })
    }

    async fn fetch_enroll_status(
        &self,
        device_id: &str,
        fingerprint_id: &str,
    ) -> Result<EnrollStatusReport, DashboardError> {
        let response = self
            .http_client
            .get_enroll_status(device_id, fingerprint_id)
            .await?;
        Ok(EnrollStatusReport {
            status: response.status,
            message: response.message,
        })
    }

    async fn delete_fingerprint(
        &self,
        device_id: &str,
        fingerprint_id: &str,
    ) -> Result<(), DashboardError> {
        self.http_client
            .delete_fingerprint(device_id, fingerprint_id)
            .await
    }

    async fn list_fingerprints(
        &self,
        device_id: &str,
        employee_id: &str,
    ) -> Result<Vec<Fingerprint>, DashboardError> {
        let records = self
            .http_client
            .list_fingerprints(device_id, employee_id)
            .await?;
        Ok(records.iter().filter_map(fingerprint_from_record).collect())
    }
}

fn fingerprint_from_record(record: &FingerprintRecord) -> Option<Fingerprint> {
    Some(Fingerprint {
        finger_id: value_to_id(&record.finger_id)?,
        employee_id: record.employee_id.as_ref().and_then(value_to_id),
        created_at: record.created_at.clone(),
    })
}

/// Backend ids arrive as numbers or strings
pub fn value_to_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric ids are sent back as numbers
fn id_to_value(id: &str) -> serde_json::Value {
    match id.parse::<i64>() {
        Ok(n) => serde_json::Value::from(n),
        Err(_) => serde_json::Value::from(id),
    }
}
