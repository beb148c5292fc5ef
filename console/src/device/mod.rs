//! Device subsystem: status snapshots and the request layer

pub mod client;
pub mod status;

pub use client::{DeviceStatusClient, EnrollStatusReport, Fingerprint, HttpDeviceClient};
pub use status::{DeviceStatus, DoorState};
