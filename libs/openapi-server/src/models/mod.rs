//! Operator API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Door panel state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorView {
    pub device_id: String,
    pub door_state: String,
    pub online: bool,
    pub busy: bool,
    pub can_unlock: bool,
    pub can_close: bool,
    pub observed_at: Option<DateTime<Utc>>,
}

/// Start enrollment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartEnrollmentRequest {
    pub employee_id: String,
}

/// Enrollment progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentView {
    pub employee_id: String,
    pub fingerprint_id: Option<String>,
    pub status: String,
    pub attempts_made: u32,
    pub started_at: DateTime<Utc>,
    pub error: Option<ErrorResponse>,
}

/// Attendance counters for today
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsView {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
}

/// One bar group of the weekly chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPointView {
    pub name: String,
    pub present: u32,
    pub late: u32,
    pub absent: u32,
}

/// One attendance row, formatted for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRowView {
    pub employee_id: String,
    pub full_name: String,
    pub date: String,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub late: bool,
}

/// Dashboard overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub employee_count: usize,
    pub stats: StatsView,
    pub chart: Vec<ChartPointView>,
    pub recent_attendance: Vec<AttendanceRowView>,
    pub door: DoorView,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub errors: Vec<String>,
}

/// Fingerprint registered for an employee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintView {
    pub finger_id: String,
    pub employee_id: Option<String>,
    pub created_at: Option<String>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
