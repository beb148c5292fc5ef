//! Settings file management

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::DashboardError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// Also write daily log files under the storage layout
    #[serde(default)]
    pub log_to_file: bool,

    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub device: DeviceSettings,

    #[serde(default)]
    pub dashboard: DashboardSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_to_file: false,
            backend: BackendSettings::default(),
            device: DeviceSettings::default(),
            dashboard: DashboardSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file does not exist
    pub async fn load(file: &File) -> Result<Self, DashboardError> {
        if !file.exists().await {
            info!("No settings file at {}, using defaults", file.path().display());
            return Ok(Self::default());
        }
        file.read_json().await.map_err(|e| {
            DashboardError::Config(format!(
                "Invalid settings file {}: {}",
                file.path().display(),
                e
            ))
        })
    }
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Door and enrollment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    #[serde(default = "default_device_id")]
    pub device_id: String,

    #[serde(default = "default_open_delay_ms")]
    pub open_delay_ms: u64,

    #[serde(default = "default_enroll_interval_ms")]
    pub enroll_interval_ms: u64,

    #[serde(default = "default_enroll_max_attempts")]
    pub enroll_max_attempts: u32,
}

fn default_device_id() -> String {
    "esp32-EC:E3:34:BF:CD:C0".to_string()
}

fn default_open_delay_ms() -> u64 {
    2000
}

fn default_enroll_interval_ms() -> u64 {
    2000
}

fn default_enroll_max_attempts() -> u32 {
    30
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            open_delay_ms: default_open_delay_ms(),
            enroll_interval_ms: default_enroll_interval_ms(),
            enroll_max_attempts: default_enroll_max_attempts(),
        }
    }
}

/// Dashboard refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Check-ins after this time (HH:MM:SS) are late
    #[serde(default = "default_late_after")]
    pub late_after: String,
}

fn default_refresh_interval() -> u64 {
    5
}

fn default_late_after() -> String {
    "09:00:00".to_string()
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            late_after: default_late_after(),
        }
    }
}

/// Local operator API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
        }
    }
}
