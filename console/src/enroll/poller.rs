//! Enrollment poller
//!
//! Starts a capture on the device, then polls its status at a fixed interval
//! until the device reports a terminal status or the attempt budget runs out.
//! At most one session per employee is active; starting another one cancels
//! the previous session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::device::DeviceStatusClient;
use crate::enroll::session::{classify, EnrollmentSession, EnrollmentStatus, Verdict};
use crate::errors::DashboardError;

/// Enrollment poller options
#[derive(Debug, Clone)]
pub struct Options {
    /// Delay between status polls
    pub interval: Duration,

    /// Maximum number of status polls per session
    pub max_attempts: u32,

    /// Cancel an active session for the same employee instead of failing with `Conflict`
    pub replace_active: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
            replace_active: true,
        }
    }
}

struct ActiveSession {
    id: u64,
    cancel_tx: watch::Sender<bool>,
}

/// A claimed enrollment slot, consumed by [`EnrollmentPoller::run`]
#[derive(Debug)]
pub struct Ticket {
    id: u64,
    device_id: String,
    employee_id: String,
    cancel_rx: watch::Receiver<bool>,
}

impl Ticket {
    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }
}

/// Removes the session from the active table on every exit path
struct Registration<'a> {
    poller: &'a EnrollmentPoller,
    employee_id: String,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut active = self.poller.lock_active();
        if active.get(&self.employee_id).map(|s| s.id) == Some(self.id) {
            active.remove(&self.employee_id);
        }
    }
}

/// Drives fingerprint enrollment sessions
pub struct EnrollmentPoller {
    client: Arc<dyn DeviceStatusClient>,
    options: Options,
    active: Mutex<HashMap<String, ActiveSession>>,
    next_id: AtomicU64,
}

impl EnrollmentPoller {
    pub fn new(client: Arc<dyn DeviceStatusClient>, options: Options) -> Self {
        Self {
            client,
            options,
            active: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Run one enrollment to completion.
    ///
    /// `on_progress` observes every state change of the session. The call
    /// returns once the session is terminal or cancelled: `Ok` on success,
    /// otherwise `DuplicateFingerprint`, `EnrollmentFailed`, `Timeout`,
    /// `Cancelled`, or the error that prevented the capture from starting.
    pub async fn start<F>(
        &self,
        device_id: &str,
        employee_id: &str,
        on_progress: F,
    ) -> Result<EnrollmentSession, DashboardError>
    where
        F: Fn(&EnrollmentSession) + Send + Sync,
    {
        let ticket = self.claim(device_id, employee_id)?;
        self.run(ticket, on_progress).await
    }

    /// Reserve the employee's slot without starting the capture.
    ///
    /// The session is active (and cancellable) from this point on, so callers
    /// that hand the polling to a background task claim first and spawn after.
    pub fn claim(&self, device_id: &str, employee_id: &str) -> Result<Ticket, DashboardError> {
        let mut active = self.lock_active();

        if let Some(previous) = active.remove(employee_id) {
            if !self.options.replace_active {
                active.insert(employee_id.to_string(), previous);
                return Err(DashboardError::Conflict(format!(
                    "enrollment already running for employee {}",
                    employee_id
                )));
            }
            info!("Replacing active enrollment for employee {}", employee_id);
            let _ = previous.cancel_tx.send(true);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        active.insert(employee_id.to_string(), ActiveSession { id, cancel_tx });

        Ok(Ticket {
            id,
            device_id: device_id.to_string(),
            employee_id: employee_id.to_string(),
            cancel_rx,
        })
    }

    /// Drive a claimed session. See [`EnrollmentPoller::start`].
    pub async fn run<F>(
        &self,
        ticket: Ticket,
        on_progress: F,
    ) -> Result<EnrollmentSession, DashboardError>
    where
        F: Fn(&EnrollmentSession) + Send + Sync,
    {
        let Ticket {
            id,
            device_id,
            employee_id,
            mut cancel_rx,
        } = ticket;
        let registration = Registration {
            poller: self,
            employee_id: employee_id.clone(),
            id,
        };
        let (device_id, employee_id) = (device_id.as_str(), employee_id.as_str());

        if is_cancelled(&cancel_rx) {
            return Err(DashboardError::Cancelled);
        }
        let mut session = EnrollmentSession::new(device_id, employee_id);
        info!("Starting enrollment for employee {} on {}", employee_id, device_id);

        let fingerprint_id = match self.client.start_enroll(device_id, employee_id).await {
            Ok(id) => id,
            Err(e) => {
                if is_cancelled(&cancel_rx) {
                    return Err(DashboardError::Cancelled);
                }
                warn!("Enrollment for employee {} could not start: {}", employee_id, e);
                session.status = EnrollmentStatus::Failed;
                session.last_message = Some(e.to_string());
                on_progress(&session);
                return Err(e);
            }
        };
        if is_cancelled(&cancel_rx) {
            return Err(DashboardError::Cancelled);
        }
        session.fingerprint_id = Some(fingerprint_id.clone());
        on_progress(&session);

        while session.attempts_made < self.options.max_attempts {
            tokio::select! {
                biased;
                _ = cancel_rx.changed() => {
                    debug!("Enrollment {} cancelled while waiting", registration.id);
                    return Err(DashboardError::Cancelled);
                }
                _ = tokio::time::sleep(self.options.interval) => {}
            }

            let result = self.client.fetch_enroll_status(device_id, &fingerprint_id).await;
            if is_cancelled(&cancel_rx) {
                return Err(DashboardError::Cancelled);
            }
            session.attempts_made += 1;

            let report = match result {
                Ok(report) => report,
                Err(e) if e.is_retryable() => {
                    warn!(
                        "Enrollment poll {}/{} for {} failed: {}",
                        session.attempts_made, self.options.max_attempts, fingerprint_id, e
                    );
                    session.last_message = Some(e.to_string());
                    on_progress(&session);
                    continue;
                }
                Err(e) => {
                    session.status = EnrollmentStatus::Failed;
                    session.last_message = Some(e.to_string());
                    on_progress(&session);
                    return Err(e);
                }
            };

            session.last_message = report.message.clone();
            match classify(&report) {
                Verdict::Pending => {
                    debug!(
                        "Enrollment {} pending ({}/{})",
                        fingerprint_id, session.attempts_made, self.options.max_attempts
                    );
                    on_progress(&session);
                }
                Verdict::Success => {
                    info!("Fingerprint {} enrolled for employee {}", fingerprint_id, employee_id);
                    session.status = EnrollmentStatus::Success;
                    on_progress(&session);
                    return Ok(session);
                }
                Verdict::Failed { duplicate } => {
                    session.status = EnrollmentStatus::Failed;
                    on_progress(&session);
                    let message = report.message.unwrap_or_else(|| report.status.clone());
                    warn!("Enrollment {} failed: {}", fingerprint_id, message);
                    return Err(if duplicate {
                        DashboardError::DuplicateFingerprint(message)
                    } else {
                        DashboardError::EnrollmentFailed(message)
                    });
                }
            }
        }

        session.status = EnrollmentStatus::TimedOut;
        on_progress(&session);
        warn!(
            "Enrollment {} timed out after {} polls",
            fingerprint_id, session.attempts_made
        );
        Err(DashboardError::Timeout(format!(
            "no result after {} polls",
            session.attempts_made
        )))
    }

    /// Stop the session for `employee_id`. Returns whether one was active.
    pub fn cancel(&self, employee_id: &str) -> bool {
        match self.lock_active().remove(employee_id) {
            Some(session) => {
                info!("Cancelling enrollment for employee {}", employee_id);
                let _ = session.cancel_tx.send(true);
                true
            }
            None => false,
        }
    }

    /// Stop every active session
    pub fn cancel_all(&self) {
        let drained: Vec<(String, ActiveSession)> = self.lock_active().drain().collect();
        for (employee_id, session) in drained {
            debug!("Cancelling enrollment for employee {}", employee_id);
            let _ = session.cancel_tx.send(true);
        }
    }

    pub fn is_polling(&self, employee_id: &str) -> bool {
        self.lock_active().contains_key(employee_id)
    }

    pub fn active_count(&self) -> usize {
        self.lock_active().len()
    }

    fn lock_active(&self) -> MutexGuard<'_, HashMap<String, ActiveSession>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn is_cancelled(cancel_rx: &watch::Receiver<bool>) -> bool {
    *cancel_rx.borrow() || cancel_rx.has_changed().is_err()
}
