//! Latest enrollment progress per employee, for display

use std::collections::HashMap;
use std::sync::RwLock;

use crate::enroll::session::EnrollmentSession;
use crate::errors::DashboardError;

/// Outcome of a finished session, as shown to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentFailure {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct EnrollmentEntry {
    pub session: EnrollmentSession,
    pub failure: Option<EnrollmentFailure>,
}

/// In-memory table of the most recent session per employee
#[derive(Default)]
pub struct ProgressBoard {
    entries: RwLock<HashMap<String, EnrollmentEntry>>,
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a progress callback
    pub fn update(&self, session: &EnrollmentSession) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            session.employee_id.clone(),
            EnrollmentEntry {
                session: session.clone(),
                failure: None,
            },
        );
    }

    /// Attach the final error of a session, if it ended with one
    pub fn finish(&self, employee_id: &str, result: &Result<EnrollmentSession, DashboardError>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match result {
            Ok(session) => {
                entries.insert(
                    employee_id.to_string(),
                    EnrollmentEntry {
                        session: session.clone(),
                        failure: None,
                    },
                );
            }
            // a replacement session already owns the entry
            Err(DashboardError::Cancelled) => {}
            Err(e) => {
                if let Some(entry) = entries.get_mut(employee_id) {
                    entry.failure = Some(EnrollmentFailure {
                        kind: e.kind(),
                        message: e.user_message(),
                    });
                }
            }
        }
    }

    pub fn get(&self, employee_id: &str) -> Option<EnrollmentEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(employee_id).cloned()
    }

    pub fn remove(&self, employee_id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(employee_id);
    }
}
