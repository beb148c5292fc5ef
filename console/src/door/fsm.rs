//! Finite State Machine for the door lock

use crate::device::DoorState;
use crate::errors::DashboardError;

/// Door event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorEvent {
    /// Device acknowledged the unlock command
    UnlockAcked,

    /// Simulated push delay elapsed after an unlock
    OpenElapsed,

    /// Close command acknowledged
    CloseAcked,

    /// Authoritative status read
    Reported(DoorState),

    /// Status read failed
    ReadFailed,
}

impl DoorEvent {
    fn command(&self) -> &'static str {
        match self {
            DoorEvent::UnlockAcked => "unlock",
            DoorEvent::OpenElapsed => "open",
            DoorEvent::CloseAcked => "close",
            DoorEvent::Reported(_) | DoorEvent::ReadFailed => "refresh",
        }
    }
}

/// A state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: DoorState,
    pub to: DoorState,
}

/// Door FSM
#[derive(Debug, Clone)]
pub struct DoorFsm {
    state: DoorState,
}

impl DoorFsm {
    pub fn new(initial: DoorState) -> Self {
        Self { state: initial }
    }

    /// Get current state
    pub fn state(&self) -> DoorState {
        self.state
    }

    /// Validate that `command` may be issued in the current state
    pub fn check(&self, command: DoorEvent) -> Result<(), DashboardError> {
        let allowed = matches!(
            (self.state, command),
            (DoorState::Locked, DoorEvent::UnlockAcked)
                | (DoorState::Unlocked, DoorEvent::OpenElapsed)
                | (DoorState::Open, DoorEvent::CloseAcked)
                | (_, DoorEvent::Reported(_))
                | (_, DoorEvent::ReadFailed)
        );
        if allowed {
            Ok(())
        } else {
            Err(DashboardError::InvalidState {
                state: self.state,
                command: command.command(),
            })
        }
    }

    /// Process an event. Returns the transition, or `None` when the state is unchanged.
    pub fn process(&mut self, event: DoorEvent) -> Result<Option<Transition>, DashboardError> {
        self.check(event)?;

        let new_state = match event {
            DoorEvent::UnlockAcked => DoorState::Unlocked,
            DoorEvent::OpenElapsed => DoorState::Open,
            DoorEvent::CloseAcked => DoorState::Locked,
            DoorEvent::Reported(reported) => reported,
            DoorEvent::ReadFailed => DoorState::Unknown,
        };

        if new_state == self.state {
            return Ok(None);
        }

        let transition = Transition {
            from: self.state,
            to: new_state,
        };
        self.state = new_state;
        Ok(Some(transition))
    }
}

impl Default for DoorFsm {
    fn default() -> Self {
        Self::new(DoorState::Locked)
    }
}
