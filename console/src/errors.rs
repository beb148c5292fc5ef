//! Error types for the console

use thiserror::Error;

use crate::door::DoorState;

/// Main error type for the console
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Duplicate fingerprint: {0}")]
    DuplicateFingerprint(String),

    #[error("Enrollment failed: {0}")]
    EnrollmentFailed(String),

    #[error("Cannot {command} while door is {state}")]
    InvalidState {
        state: DoorState,
        command: &'static str,
    },

    #[error("A door command is already in flight")]
    Busy,

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Enrollment cancelled")]
    Cancelled,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Shutdown error: {0}")]
    Shutdown(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DashboardError {
    /// Stable machine-readable code
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Connectivity(_) => "connectivity",
            DashboardError::NotFound(_) => "not_found",
            DashboardError::Validation(_) => "validation",
            DashboardError::Conflict(_) => "conflict",
            DashboardError::DuplicateFingerprint(_) => "duplicate_fingerprint",
            DashboardError::EnrollmentFailed(_) => "enrollment_failed",
            DashboardError::InvalidState { .. } => "invalid_state",
            DashboardError::Busy => "busy",
            DashboardError::Timeout(_) => "timeout",
            DashboardError::Cancelled => "cancelled",
            DashboardError::Unauthorized(_) => "unauthorized",
            DashboardError::Forbidden(_) => "forbidden",
            DashboardError::Io(_) => "io",
            DashboardError::Json(_) => "json",
            DashboardError::Config(_) => "config",
            DashboardError::Server(_) => "server",
            DashboardError::Shutdown(_) => "shutdown",
            DashboardError::Internal(_) => "internal",
        }
    }

    /// Transient failures that may succeed when retried unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, DashboardError::Connectivity(_))
    }

    /// Short operator-facing message
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Connectivity(_) => {
                "Device unreachable, check the connection and try again".to_string()
            }
            DashboardError::NotFound(what) => format!("Not found: {}", what),
            DashboardError::Validation(msg) => format!("Invalid request: {}", msg),
            DashboardError::Conflict(msg) => format!("Already in progress: {}", msg),
            DashboardError::DuplicateFingerprint(_) => {
                "Fingerprint already enrolled, use a different finger".to_string()
            }
            DashboardError::EnrollmentFailed(msg) => format!("Fingerprint enrollment failed: {}", msg),
            DashboardError::InvalidState { state, command } => {
                format!("Cannot {} while the door is {}", command, state)
            }
            DashboardError::Busy => "Door is processing a command, please wait".to_string(),
            DashboardError::Timeout(_) => {
                "No finger detected in time, please start the scan again".to_string()
            }
            DashboardError::Cancelled => "Enrollment cancelled".to_string(),
            DashboardError::Unauthorized(_) => "Session expired, please log in again".to_string(),
            DashboardError::Forbidden(_) => {
                "Your account is not allowed to use the admin console".to_string()
            }
            other => format!("Unexpected error: {}", other),
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return DashboardError::Internal(format!("Malformed response: {}", err));
        }
        DashboardError::Connectivity(err.to_string())
    }
}
