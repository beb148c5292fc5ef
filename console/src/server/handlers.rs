//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use openapi_server::models::{
    AttendanceRowView, ChartPointView, DashboardView, DoorView, EnrollmentView, ErrorResponse,
    FingerprintView, HealthResponse, StartEnrollmentRequest, StatsView,
};

use crate::dashboard::DashboardSnapshot;
use crate::door::DoorSnapshot;
use crate::enroll::board::EnrollmentEntry;
use crate::enroll::EnrollmentSession;
use crate::errors::DashboardError;
use crate::server::auth::RequireAdmin;
use crate::server::errors::ApiResult;
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "fingerdoor".to_string(),
        version: version.version,
    })
}

pub async fn dashboard_handler(
    State(state): State<Arc<ServerState>>,
    _admin: RequireAdmin,
) -> Json<DashboardView> {
    let snapshot = state.dashboard.borrow().clone();
    Json(dashboard_view(&snapshot, &state.door.snapshot()))
}

fn dashboard_view(snapshot: &DashboardSnapshot, door: &DoorSnapshot) -> DashboardView {
    DashboardView {
        employee_count: snapshot.employee_count(),
        stats: StatsView {
            total: snapshot.stats.total,
            present: snapshot.stats.present,
            absent: snapshot.stats.absent,
            late: snapshot.stats.late,
        },
        chart: snapshot
            .chart
            .iter()
            .map(|point| ChartPointView {
                name: point.name.clone(),
                present: point.present,
                late: point.late,
                absent: point.absent,
            })
            .collect(),
        recent_attendance: snapshot
            .attendance
            .iter()
            .map(|row| AttendanceRowView {
                employee_id: row.employee_id.clone(),
                full_name: row.full_name.clone(),
                date: row.date.clone(),
                check_in: row.check_in.clone(),
                check_out: row.check_out.clone(),
                late: row.late,
            })
            .collect(),
        door: door_view(door),
        refreshed_at: snapshot.refreshed_at,
        errors: snapshot.errors.messages(),
    }
}

fn door_view(snapshot: &DoorSnapshot) -> DoorView {
    DoorView {
        device_id: snapshot.device_id.clone(),
        door_state: snapshot.state.as_str().to_string(),
        online: snapshot.online,
        busy: snapshot.busy,
        can_unlock: snapshot.can_unlock(),
        can_close: snapshot.can_close(),
        observed_at: snapshot.observed_at,
    }
}

pub async fn door_handler(
    State(state): State<Arc<ServerState>>,
    _admin: RequireAdmin,
) -> Json<DoorView> {
    Json(door_view(&state.door.snapshot()))
}

pub async fn unlock_handler(
    State(state): State<Arc<ServerState>>,
    RequireAdmin(admin): RequireAdmin,
) -> ApiResult<Json<DoorView>> {
    info!(
        "Unlock requested by {}",
        admin.username.as_deref().unwrap_or("admin")
    );
    state.door.request_unlock().await?;
    Ok(Json(door_view(&state.door.snapshot())))
}

pub async fn close_handler(
    State(state): State<Arc<ServerState>>,
    _admin: RequireAdmin,
) -> ApiResult<Json<DoorView>> {
    state.door.request_close().await?;
    Ok(Json(door_view(&state.door.snapshot())))
}

pub async fn refresh_door_handler(
    State(state): State<Arc<ServerState>>,
    _admin: RequireAdmin,
) -> Json<DoorView> {
    Json(door_view(&state.door.refresh_status().await))
}

fn enrollment_view(entry: &EnrollmentEntry) -> EnrollmentView {
    EnrollmentView {
        employee_id: entry.session.employee_id.clone(),
        fingerprint_id: entry.session.fingerprint_id.clone(),
        status: entry.session.status.as_str().to_string(),
        attempts_made: entry.session.attempts_made,
        started_at: entry.session.started_at,
        error: entry.failure.as_ref().map(|failure| ErrorResponse {
            error: failure.kind.to_string(),
            message: failure.message.clone(),
        }),
    }
}

/// Start a capture in the background. Progress is read back through
/// `GET /enrollments/{employee_id}`.
pub async fn start_enrollment_handler(
    State(state): State<Arc<ServerState>>,
    _admin: RequireAdmin,
    Json(request): Json<StartEnrollmentRequest>,
) -> ApiResult<(StatusCode, Json<EnrollmentView>)> {
    let employee_id = request.employee_id.trim().to_string();
    if employee_id.is_empty() {
        return Err(DashboardError::Validation("employee_id is required".to_string()).into());
    }
    // Claim before spawning so a cancel that follows the 202 finds the session
    let ticket = state.enrollment.claim(&state.device_id, &employee_id)?;

    let pending = EnrollmentSession::new(&state.device_id, &employee_id);
    state.board.update(&pending);

    let poller = state.enrollment.clone();
    let board = state.board.clone();
    tokio::spawn(async move {
        let employee_id = ticket.employee_id().to_string();
        let progress_board = board.clone();
        let result = poller
            .run(ticket, move |session| progress_board.update(session))
            .await;
        if let Err(e) = &result {
            warn!("Enrollment for employee {} ended: {}", employee_id, e);
        }
        board.finish(&employee_id, &result);
    });

    let entry = EnrollmentEntry {
        session: pending,
        failure: None,
    };
    Ok((StatusCode::ACCEPTED, Json(enrollment_view(&entry))))
}

pub async fn get_enrollment_handler(
    State(state): State<Arc<ServerState>>,
    _admin: RequireAdmin,
    Path(employee_id): Path<String>,
) -> ApiResult<Json<EnrollmentView>> {
    let entry = state.board.get(&employee_id).ok_or_else(|| {
        DashboardError::NotFound(format!("enrollment for employee {}", employee_id))
    })?;
    Ok(Json(enrollment_view(&entry)))
}

pub async fn cancel_enrollment_handler(
    State(state): State<Arc<ServerState>>,
    _admin: RequireAdmin,
    Path(employee_id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.enrollment.cancel(&employee_id) {
        return Err(DashboardError::NotFound(format!(
            "active enrollment for employee {}",
            employee_id
        ))
        .into());
    }
    state.board.remove(&employee_id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct FingerprintQuery {
    pub employee_id: String,
}

pub async fn list_fingerprints_handler(
    State(state): State<Arc<ServerState>>,
    _admin: RequireAdmin,
    Query(query): Query<FingerprintQuery>,
) -> ApiResult<Json<Vec<FingerprintView>>> {
    let fingerprints = state
        .device_client
        .list_fingerprints(&state.device_id, &query.employee_id)
        .await?;

    Ok(Json(
        fingerprints
            .into_iter()
            .map(|fp| FingerprintView {
                finger_id: fp.finger_id,
                employee_id: fp.employee_id,
                created_at: fp.created_at,
            })
            .collect(),
    ))
}

pub async fn delete_fingerprint_handler(
    State(state): State<Arc<ServerState>>,
    _admin: RequireAdmin,
    Path(finger_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .device_client
        .delete_fingerprint(&state.device_id, &finger_id)
        .await?;
    info!("Deleted fingerprint {}", finger_id);
    Ok(StatusCode::NO_CONTENT)
}
