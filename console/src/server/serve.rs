//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::DashboardError;
use crate::server::handlers::{
    cancel_enrollment_handler, close_handler, dashboard_handler, delete_fingerprint_handler,
    door_handler, get_enrollment_handler, health_handler, list_fingerprints_handler,
    refresh_door_handler, start_enrollment_handler, unlock_handler,
};
use crate::server::state::ServerState;

/// Operator API routes
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_handler))
        // Dashboard
        .route("/dashboard", get(dashboard_handler))
        // Door
        .route("/door", get(door_handler))
        .route("/door/unlock", post(unlock_handler))
        .route("/door/close", post(close_handler))
        .route("/door/refresh", post(refresh_door_handler))
        // Enrollment
        .route("/enrollments", post(start_enrollment_handler))
        .route(
            "/enrollments/{employee_id}",
            get(get_enrollment_handler).delete(cancel_enrollment_handler),
        )
        // Fingerprints
        .route("/fingerprints", get(list_fingerprints_handler))
        .route("/fingerprints/{finger_id}", delete(delete_fingerprint_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), DashboardError>>, DashboardError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DashboardError::Server(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| DashboardError::Server(e.to_string()))
    });

    Ok(handle)
}
