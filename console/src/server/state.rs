//! Server state

use std::sync::Arc;

use tokio::sync::watch;

use crate::app::state::AppState;
use crate::dashboard::DashboardSnapshot;
use crate::device::DeviceStatusClient;
use crate::door::DoorController;
use crate::enroll::board::ProgressBoard;
use crate::enroll::EnrollmentPoller;
use crate::session::SessionContext;

/// Server state shared across handlers
pub struct ServerState {
    pub device_id: String,
    pub session: Arc<SessionContext>,
    pub device_client: Arc<dyn DeviceStatusClient>,
    pub door: Arc<DoorController>,
    pub enrollment: Arc<EnrollmentPoller>,
    pub board: Arc<ProgressBoard>,
    pub dashboard: watch::Receiver<DashboardSnapshot>,
}

impl ServerState {
    pub fn new(app_state: &AppState, dashboard: watch::Receiver<DashboardSnapshot>) -> Self {
        Self {
            device_id: app_state.device_id.clone(),
            session: app_state.session.clone(),
            device_client: app_state.device_client.clone(),
            door: app_state.door.clone(),
            enrollment: app_state.enrollment.clone(),
            board: app_state.board.clone(),
            dashboard,
        }
    }
}
