//! Application configuration options

use std::time::Duration;

use chrono::NaiveTime;
use tracing::warn;

use crate::dashboard::poller as dashboard;
use crate::door::controller as door;
use crate::enroll::poller as enroll;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Backend API base URL
    pub backend_base_url: String,

    /// Per-request timeout for backend calls
    pub request_timeout: Duration,

    /// Device whose door and scanner this console drives
    pub device_id: String,

    /// Storage layout paths
    pub layout: StorageLayout,

    /// Enable local HTTP server
    pub enable_server: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Door controller options
    pub door: door::Options,

    /// Enrollment poller options
    pub enrollment: enroll::Options,

    /// Dashboard poller options
    pub dashboard: dashboard::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            backend_base_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(30),
            device_id: "esp32-EC:E3:34:BF:CD:C0".to_string(),
            layout: StorageLayout::default(),
            enable_server: true,
            server: ServerOptions::default(),
            door: door::Options::default(),
            enrollment: enroll::Options::default(),
            dashboard: dashboard::Options::default(),
        }
    }
}

impl AppOptions {
    /// Build runtime options from the settings file
    pub fn from_settings(settings: &Settings, layout: StorageLayout) -> Self {
        let defaults = dashboard::Options::default();
        let late_after = match NaiveTime::parse_from_str(&settings.dashboard.late_after, "%H:%M:%S")
        {
            Ok(time) => time,
            Err(e) => {
                warn!(
                    "Invalid late_after '{}' ({}), using {}",
                    settings.dashboard.late_after, e, defaults.late_after
                );
                defaults.late_after
            }
        };

        Self {
            lifecycle: LifecycleOptions::default(),
            backend_base_url: settings.backend.base_url.clone(),
            request_timeout: Duration::from_secs(settings.backend.request_timeout_secs),
            device_id: settings.device.device_id.clone(),
            layout,
            enable_server: settings.server.enabled,
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            door: door::Options {
                open_delay: Duration::from_millis(settings.device.open_delay_ms),
                ..Default::default()
            },
            enrollment: enroll::Options {
                interval: Duration::from_millis(settings.device.enroll_interval_ms),
                max_attempts: settings.device.enroll_max_attempts,
                ..Default::default()
            },
            dashboard: dashboard::Options {
                interval: Duration::from_secs(settings.dashboard.refresh_interval_secs),
                late_after,
            },
        }
    }
}

/// Lifecycle options for the console
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(10),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
