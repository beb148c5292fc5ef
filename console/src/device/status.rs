//! Door and device status types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use openapi_client::models::DeviceStatusResponse;

/// Door state as tracked by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    /// Latch engaged, the only state that accepts an unlock command
    Locked,

    /// Latch released, waiting for someone to push the door
    Unlocked,

    /// Door physically open
    Open,

    /// Last status read failed; all commands are blocked
    Unknown,
}

impl DoorState {
    /// Parse a backend `door_state` value. Missing values default to locked.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            None => DoorState::Locked,
            Some(v) => match v.as_str() {
                "" | "locked" => DoorState::Locked,
                "unlocked" => DoorState::Unlocked,
                "open" | "opened" => DoorState::Open,
                _ => DoorState::Unknown,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DoorState::Locked => "locked",
            DoorState::Unlocked => "unlocked",
            DoorState::Open => "open",
            DoorState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one device, superseded wholesale by the next fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: String,
    pub online: bool,
    pub door_state: DoorState,
    pub observed_at: DateTime<Utc>,
}

impl DeviceStatus {
    /// Build a snapshot from the backend status body
    pub fn from_response(device_id: &str, response: &DeviceStatusResponse) -> Self {
        let online = response
            .status
            .as_deref()
            .map(|s| s.trim().eq_ignore_ascii_case("online"))
            .unwrap_or(false);

        Self {
            device_id: device_id.to_string(),
            online,
            door_state: DoorState::from_wire(response.door_state.as_deref()),
            observed_at: Utc::now(),
        }
    }
}
