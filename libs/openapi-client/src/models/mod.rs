//! Backend API models

use serde::{Deserialize, Serialize};

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response. The backend returns the session object verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
}

/// Device status as reported by `GET /devices/{id}/status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceStatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub door_state: Option<String>,
}

/// Enrollment request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollRequest {
    pub employee_id: serde_json::Value,
}

/// Enrollment response. Older firmware answers with `id`, newer with `finger_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrollResponse {
    #[serde(default)]
    pub finger_id: Option<serde_json::Value>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// Enrollment progress as reported by the device
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrollStatusResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// A fingerprint registered on the device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub finger_id: serde_json::Value,
    #[serde(default)]
    pub employee_id: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Employee as listed by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: serde_json::Value,
    #[serde(default)]
    pub emp_code: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// One attendance row from the daily attendance query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_id: serde_json::Value,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub work_date: Option<String>,
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One day of the attendance chart aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStatsRow {
    pub date: String,
    #[serde(default)]
    pub on_time: u32,
    #[serde(default)]
    pub late: u32,
    #[serde(default)]
    pub absent: u32,
}

/// The stats endpoint answers either with a bare list or with `{ data: [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DailyStatsResponse {
    List(Vec<DailyStatsRow>),
    Wrapped { data: Vec<DailyStatsRow> },
}

impl DailyStatsResponse {
    pub fn into_rows(self) -> Vec<DailyStatsRow> {
        match self {
            DailyStatsResponse::List(rows) => rows,
            DailyStatsResponse::Wrapped { data } => data,
        }
    }
}

/// Error body returned by the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}
