//! Device API client

use openapi_client::models::{
    DeviceStatusResponse, EnrollRequest, EnrollResponse, EnrollStatusResponse, FingerprintRecord,
};

use crate::errors::DashboardError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// `/api/v1/devices/{device_id}/...` with every segment escaped
    fn device_path(&self, device_id: &str, rest: &[&str]) -> Result<String, DashboardError> {
        let mut segments = vec!["api", "v1", "devices", device_id];
        segments.extend_from_slice(rest);
        self.encoded_path(&segments)
    }

    /// Get device status
    pub async fn get_device_status(
        &self,
        device_id: &str,
    ) -> Result<DeviceStatusResponse, DashboardError> {
        let path = self.device_path(device_id, &["status"])?;
        let body: Option<DeviceStatusResponse> = self.get(&path).await?;
        Ok(body.unwrap_or_default())
    }

    /// Ask the device to release the door latch
    pub async fn open_door(&self, device_id: &str) -> Result<serde_json::Value, DashboardError> {
        let path = self.device_path(device_id, &["door", "open"])?;
        self.post_empty(&path).await
    }

    /// Put the device in fingerprint enrollment mode
    pub async fn enroll_fingerprint(
        &self,
        device_id: &str,
        request: &EnrollRequest,
    ) -> Result<EnrollResponse, DashboardError> {
        let path = self.device_path(device_id, &["fingerprints", "enroll"])?;
        let body: Option<EnrollResponse> = self.post(&path, request).await?;
        Ok(body.unwrap_or_default())
    }

    /// Get the progress of an enrollment
    pub async fn get_enroll_status(
        &self,
        device_id: &str,
        finger_id: &str,
    ) -> Result<EnrollStatusResponse, DashboardError> {
        let path = self.device_path(device_id, &["fingerprints", finger_id, "enroll-status"])?;
        let body: Option<EnrollStatusResponse> = self.get(&path).await?;
        Ok(body.unwrap_or_default())
    }

    /// Remove a fingerprint from the device
    pub async fn delete_fingerprint(
        &self,
        device_id: &str,
        finger_id: &str,
    ) -> Result<(), DashboardError> {
        let path = self.device_path(device_id, &["fingerprints", finger_id])?;
        self.delete(&path).await
    }

    /// List fingerprints registered for an employee
    pub async fn list_fingerprints(
        &self,
        device_id: &str,
        employee_id: &str,
    ) -> Result<Vec<FingerprintRecord>, DashboardError> {
        let path = self.device_path(device_id, &["fingerprints"])?;
        let body: Option<Vec<FingerprintRecord>> = self
            .get_query(&path, &[("employee_id", employee_id)])
            .await?;
        Ok(body.unwrap_or_default())
    }
}
