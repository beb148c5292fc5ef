//! Enrollment session and status classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::EnrollStatusReport;

/// Lifecycle of one enrollment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Pending,
    Success,
    Failed,
    TimedOut,
}

impl EnrollmentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EnrollmentStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Success => "success",
            EnrollmentStatus::Failed => "failed",
            EnrollmentStatus::TimedOut => "timed_out",
        }
    }
}

/// One fingerprint capture for one employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentSession {
    pub device_id: String,
    pub employee_id: String,
    /// Assigned by the device once the capture has started
    pub fingerprint_id: Option<String>,
    pub status: EnrollmentStatus,
    pub attempts_made: u32,
    pub started_at: DateTime<Utc>,
    pub last_message: Option<String>,
}

impl EnrollmentSession {
    pub fn new(device_id: &str, employee_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            employee_id: employee_id.to_string(),
            fingerprint_id: None,
            status: EnrollmentStatus::Pending,
            attempts_made: 0,
            started_at: Utc::now(),
            last_message: None,
        }
    }
}

/// How a device report resolves the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pending,
    Success,
    Failed { duplicate: bool },
}

/// Classify a raw device report
pub fn classify(report: &EnrollStatusReport) -> Verdict {
    match report.status.trim().to_ascii_lowercase().as_str() {
        "success" | "ok" | "completed" => Verdict::Success,
        "failed" | "error" | "unknown" => Verdict::Failed {
            duplicate: report.message.as_deref().map(is_duplicate_message).unwrap_or(false),
        },
        _ => Verdict::Pending,
    }
}

/// Whether a failure message means the finger is already registered
pub fn is_duplicate_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("duplicate") || message.contains("already")
}
