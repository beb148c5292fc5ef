//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::device::{DeviceStatusClient, HttpDeviceClient};
use crate::door::DoorController;
use crate::enroll::board::ProgressBoard;
use crate::enroll::EnrollmentPoller;
use crate::errors::DashboardError;
use crate::http::client::HttpClient;
use crate::session::SessionContext;

/// Main application state
pub struct AppState {
    /// Device this console drives
    pub device_id: String,

    /// Operator session
    pub session: Arc<SessionContext>,

    /// HTTP client for backend communication
    pub http_client: Arc<HttpClient>,

    /// Device operations
    pub device_client: Arc<dyn DeviceStatusClient>,

    pub door: Arc<DoorController>,

    pub enrollment: Arc<EnrollmentPoller>,

    /// Latest enrollment progress per employee
    pub board: Arc<ProgressBoard>,
}

impl AppState {
    /// Initialize application state
    pub async fn init(options: &AppOptions) -> Result<Self, DashboardError> {
        info!("Initializing application state...");

        let session = Arc::new(SessionContext::load(options.layout.session_file()).await?);
        match session.current() {
            Some(current) => info!(
                "Restored session for {}",
                current.username.as_deref().unwrap_or("unknown user")
            ),
            None => info!("No operator session; run with --login to sign in"),
        }

        let http_client = Arc::new(HttpClient::new(
            &options.backend_base_url,
            session.clone(),
            options.request_timeout,
        )?);

        let device_client: Arc<dyn DeviceStatusClient> =
            Arc::new(HttpDeviceClient::new(http_client.clone()));

        Ok(Self::with_client(
            options,
            session,
            http_client,
            device_client,
        ))
    }

    /// Assemble state around an existing device client
    pub fn with_client(
        options: &AppOptions,
        session: Arc<SessionContext>,
        http_client: Arc<HttpClient>,
        device_client: Arc<dyn DeviceStatusClient>,
    ) -> Self {
        let door = Arc::new(DoorController::new(
            &options.device_id,
            device_client.clone(),
            options.door.clone(),
        ));
        let enrollment = Arc::new(EnrollmentPoller::new(
            device_client.clone(),
            options.enrollment.clone(),
        ));

        Self {
            device_id: options.device_id.clone(),
            session,
            http_client,
            device_client,
            door,
            enrollment,
            board: Arc::new(ProgressBoard::new()),
        }
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), DashboardError> {
        info!("Shutting down application state...");
        self.enrollment.cancel_all();
        self.door.stop();
        Ok(())
    }
}
