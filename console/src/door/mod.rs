//! Door lock state machine and controller

pub mod controller;
pub mod fsm;

pub use crate::device::DoorState;
pub use controller::{DoorController, DoorSnapshot, DoorTransition};
