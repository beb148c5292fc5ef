//! Door controller
//!
//! Mediates operator intent with device acknowledgment:
//!
//! ```text
//! Locked --unlock--> Unlocked --(open delay)--> Open --close--> Locked
//! ```
//!
//! `Unlocked -> Open` is driven by a timer standing in for the person pushing
//! the door; there is no door sensor. Any successful status read overrides
//! local state (last fetch wins) and cancels a pending open timer unless the
//! device still reports `unlocked`. A failed read moves to `Unknown`, which
//! blocks commands until a read succeeds.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::device::{DeviceStatusClient, DoorState};
use crate::door::fsm::{DoorEvent, DoorFsm, Transition};
use crate::errors::DashboardError;

const EVENT_CAPACITY: usize = 32;

/// Door controller options
#[derive(Debug, Clone)]
pub struct Options {
    /// Delay between unlock acknowledgment and the simulated open
    pub open_delay: Duration,

    /// State assumed before the first status read
    pub initial_state: DoorState,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            open_delay: Duration::from_secs(2),
            initial_state: DoorState::Locked,
        }
    }
}

/// Emitted on every observable state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorTransition {
    pub from: DoorState,
    pub to: DoorState,
    pub at: DateTime<Utc>,
}

/// Point-in-time view of the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorSnapshot {
    pub device_id: String,
    pub state: DoorState,
    pub online: bool,
    pub busy: bool,
    pub observed_at: Option<DateTime<Utc>>,
}

impl DoorSnapshot {
    pub fn can_unlock(&self) -> bool {
        !self.busy && self.state == DoorState::Locked
    }

    pub fn can_close(&self) -> bool {
        !self.busy && self.state == DoorState::Open
    }
}

struct ControlState {
    fsm: DoorFsm,
    busy: bool,
    online: bool,
    observed_at: Option<DateTime<Utc>>,
    pending_open: Option<JoinHandle<()>>,
    open_epoch: u64,
}

struct Inner {
    device_id: String,
    client: Arc<dyn DeviceStatusClient>,
    options: Options,
    state: Mutex<ControlState>,
    events: broadcast::Sender<DoorTransition>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply(&self, state: &mut ControlState, event: DoorEvent) -> Result<(), DashboardError> {
        if let Some(Transition { from, to }) = state.fsm.process(event)? {
            info!("Door {}: {} -> {}", self.device_id, from, to);
            let _ = self.events.send(DoorTransition {
                from,
                to,
                at: Utc::now(),
            });
        }
        Ok(())
    }
}

fn cancel_pending_open(state: &mut ControlState) {
    if let Some(handle) = state.pending_open.take() {
        handle.abort();
    }
    state.open_epoch += 1;
}

/// Clears the busy flag on every exit path of a command
struct CommandGuard<'a> {
    inner: &'a Inner,
}

impl Drop for CommandGuard<'_> {
    fn drop(&mut self) {
        self.inner.lock().busy = false;
    }
}

/// Door state machine for one device
pub struct DoorController {
    inner: Arc<Inner>,
}

impl DoorController {
    pub fn new(
        device_id: impl Into<String>,
        client: Arc<dyn DeviceStatusClient>,
        options: Options,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let state = ControlState {
            fsm: DoorFsm::new(options.initial_state),
            busy: false,
            online: false,
            observed_at: None,
            pending_open: None,
            open_epoch: 0,
        };

        Self {
            inner: Arc::new(Inner {
                device_id: device_id.into(),
                client,
                options,
                state: Mutex::new(state),
                events,
            }),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    pub fn state(&self) -> DoorState {
        self.inner.lock().fsm.state()
    }

    pub fn snapshot(&self) -> DoorSnapshot {
        let state = self.inner.lock();
        DoorSnapshot {
            device_id: self.inner.device_id.clone(),
            state: state.fsm.state(),
            online: state.online,
            busy: state.busy,
            observed_at: state.observed_at,
        }
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> broadcast::Receiver<DoorTransition> {
        self.inner.events.subscribe()
    }

    /// Release the latch. Valid only from `Locked`.
    ///
    /// If a status read moves the door while the command is in flight, the
    /// reported state is kept and the call fails with `InvalidState`.
    pub async fn request_unlock(&self) -> Result<(), DashboardError> {
        let _guard = self.begin_command(DoorEvent::UnlockAcked)?;

        if let Err(e) = self.inner.client.send_door_open(&self.inner.device_id).await {
            warn!("Unlock of {} failed: {}", self.inner.device_id, e);
            return Err(e);
        }

        let mut state = self.inner.lock();
        let current = state.fsm.state();
        if current != DoorState::Locked {
            // A status read landed while the command was in flight and wins
            warn!(
                "Unlock acknowledged but door {} is now {}, keeping reported state",
                self.inner.device_id, current
            );
            return Err(DashboardError::InvalidState {
                state: current,
                command: "unlock",
            });
        }
        self.inner.apply(&mut state, DoorEvent::UnlockAcked)?;
        self.schedule_open(&mut state);
        Ok(())
    }

    /// Lock the door again. Valid only from `Open`.
    pub async fn request_close(&self) -> Result<(), DashboardError> {
        let _guard = self.begin_command(DoorEvent::CloseAcked)?;

        if let Err(e) = self.inner.client.send_door_close(&self.inner.device_id).await {
            warn!("Close of {} failed: {}", self.inner.device_id, e);
            return Err(e);
        }

        let mut state = self.inner.lock();
        let current = state.fsm.state();
        if current != DoorState::Open {
            warn!(
                "Close acknowledged but door {} is now {}, keeping reported state",
                self.inner.device_id, current
            );
            return Err(DashboardError::InvalidState {
                state: current,
                command: "close",
            });
        }
        self.inner.apply(&mut state, DoorEvent::CloseAcked)
    }

    /// Reconcile with the device. Never fails: a failed read degrades to `Unknown`.
    pub async fn refresh_status(&self) -> DoorSnapshot {
        match self.inner.client.fetch_status(&self.inner.device_id).await {
            Ok(status) => {
                let mut state = self.inner.lock();
                if status.door_state != DoorState::Unlocked {
                    cancel_pending_open(&mut state);
                }
                state.online = status.online;
                state.observed_at = Some(status.observed_at);
                if let Err(e) = self
                    .inner
                    .apply(&mut state, DoorEvent::Reported(status.door_state))
                {
                    warn!("Ignoring status report: {}", e);
                }
            }
            Err(e) => {
                warn!("Status read for {} failed: {}", self.inner.device_id, e);
                let mut state = self.inner.lock();
                cancel_pending_open(&mut state);
                state.online = false;
                if let Err(e) = self.inner.apply(&mut state, DoorEvent::ReadFailed) {
                    warn!("Ignoring failed read: {}", e);
                }
            }
        }
        self.snapshot()
    }

    /// Cancel the pending open timer. Called on teardown.
    pub fn stop(&self) {
        let mut state = self.inner.lock();
        cancel_pending_open(&mut state);
        debug!("Door controller for {} stopped", self.inner.device_id);
    }

    fn begin_command(&self, command: DoorEvent) -> Result<CommandGuard<'_>, DashboardError> {
        let mut state = self.inner.lock();
        if state.busy {
            return Err(DashboardError::Busy);
        }
        state.fsm.check(command)?;
        state.busy = true;
        Ok(CommandGuard { inner: &self.inner })
    }

    fn schedule_open(&self, state: &mut ControlState) {
        cancel_pending_open(state);
        let epoch = state.open_epoch;
        let delay = self.inner.options.open_delay;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        debug!("Door {} expected open in {:?}", self.inner.device_id, delay);
        state.pending_open = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut state = inner.lock();
            if state.open_epoch != epoch {
                return;
            }
            state.pending_open = None;
            if state.fsm.state() == DoorState::Unlocked {
                if let Err(e) = inner.apply(&mut state, DoorEvent::OpenElapsed) {
                    warn!("Simulated open rejected: {}", e);
                }
            }
        }));
    }
}

impl Drop for DoorController {
    fn drop(&mut self) {
        self.stop();
    }
}
