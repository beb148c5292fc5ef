//! HTTP device client tests against a throwaway local backend

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use fingerdoor::app::login::{login, logout, manage_session, SessionCommand};
use fingerdoor::app::options::AppOptions;
use fingerdoor::device::{DeviceStatusClient, DoorState, HttpDeviceClient};
use fingerdoor::errors::DashboardError;
use fingerdoor::filesys::file::File;
use fingerdoor::http::client::HttpClient;
use fingerdoor::session::{Session, SessionContext};
use fingerdoor::storage::layout::StorageLayout;

const TOKEN: &str = "admin-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn device_status(Path(device_id): Path<String>) -> impl IntoResponse {
    match device_id.as_str() {
        "esp32-a" => (
            StatusCode::OK,
            Json(json!({"status": "Online", "door_state": "OPEN"})),
        ),
        "esp32-quiet" => (StatusCode::OK, Json(json!({"status": "offline"}))),
        "esp32-odd" => (
            StatusCode::OK,
            Json(json!({"status": "online", "door_state": "ajar"})),
        ),
        "esp32-down" => (
            StatusCode::BAD_GATEWAY,
            Json(json!({"detail": "device gateway unavailable"})),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Device not found"})),
        ),
    }
}

async fn open_door(headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Could not validate credentials"})),
        );
    }
    (StatusCode::OK, Json(json!({"message": "Door opened"})))
}

#[derive(Deserialize)]
struct EnrollBody {
    employee_id: Value,
}

async fn enroll(Json(body): Json<EnrollBody>) -> impl IntoResponse {
    match body.employee_id.as_i64() {
        Some(7) => (StatusCode::OK, Json(json!({"id": 42}))),
        Some(8) => (StatusCode::OK, Json(json!({"finger_id": "fp-8"}))),
        _ => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "Employee not found"})),
        ),
    }
}

async fn enroll_status(Path((_, finger_id)): Path<(String, String)>) -> impl IntoResponse {
    let status = if finger_id == "42" { "pending" } else { "success" };
    Json(json!({"status": status, "message": "Place finger"}))
}

#[derive(Deserialize)]
struct FingerprintQuery {
    employee_id: String,
}

async fn fingerprints(Query(query): Query<FingerprintQuery>) -> impl IntoResponse {
    Json(json!([
        {"finger_id": 42, "employee_id": query.employee_id.parse::<i64>().unwrap_or(0), "created_at": "2025-03-14T08:00:00"},
        {"finger_id": null}
    ]))
}

async fn delete_fingerprint(Path((_, finger_id)): Path<(String, String)>) -> impl IntoResponse {
    if finger_id == "42" || finger_id == "x/../door/open" {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Fingerprint not found"})),
        )
            .into_response()
    }
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
}

async fn user_login(Json(body): Json<LoginBody>) -> impl IntoResponse {
    match body.username.as_str() {
        "admin" => (
            StatusCode::OK,
            Json(json!({"access_token": TOKEN, "role": "Admin", "user_id": 1})),
        ),
        "staff" => (
            StatusCode::OK,
            Json(json!({"access_token": "staff-token", "role": "employee"})),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        ),
    }
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/api/v1/users/login", post(user_login))
        .route("/api/v1/devices/{device_id}/status", get(device_status))
        .route("/api/v1/devices/{device_id}/door/open", post(open_door))
        .route("/api/v1/devices/{device_id}/fingerprints/enroll", post(enroll))
        .route(
            "/api/v1/devices/{device_id}/fingerprints/{finger_id}/enroll-status",
            get(enroll_status),
        )
        .route("/api/v1/devices/{device_id}/fingerprints", get(fingerprints))
        .route(
            "/api/v1/devices/{device_id}/fingerprints/{finger_id}",
            delete(delete_fingerprint),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn client_with(session: Arc<SessionContext>) -> (Arc<HttpClient>, HttpDeviceClient) {
    let base_url = spawn_backend().await;
    let http_client = Arc::new(HttpClient::new(&base_url, session, Duration::from_secs(5)).unwrap());
    let device_client = HttpDeviceClient::new(http_client.clone());
    (http_client, device_client)
}

async fn admin_context() -> Arc<SessionContext> {
    let session = Arc::new(SessionContext::in_memory());
    session
        .set(Session::new(TOKEN.to_string(), "admin".to_string()))
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn test_fetch_status_parses_wire_values() {
    let (_, client) = client_with(admin_context().await).await;

    let status = client.fetch_status("esp32-a").await.unwrap();
    assert!(status.online);
    assert_eq!(status.door_state, DoorState::Open);
    assert_eq!(status.device_id, "esp32-a");

    let status = client.fetch_status("esp32-quiet").await.unwrap();
    assert!(!status.online);
    assert_eq!(status.door_state, DoorState::Locked);

    let status = client.fetch_status("esp32-odd").await.unwrap();
    assert_eq!(status.door_state, DoorState::Unknown);
}

#[tokio::test]
async fn test_status_errors_are_classified() {
    let (_, client) = client_with(admin_context().await).await;

    let err = client.fetch_status("esp32-gone").await.unwrap_err();
    assert!(matches!(err, DashboardError::NotFound(ref d) if d == "Device not found"));

    let err = client.fetch_status("esp32-down").await.unwrap_err();
    assert!(matches!(err, DashboardError::Connectivity(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_backend_is_connectivity() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let http_client = Arc::new(
        HttpClient::new(
            &format!("http://{}", addr),
            Arc::new(SessionContext::in_memory()),
            Duration::from_secs(2),
        )
        .unwrap(),
    );
    let client = HttpDeviceClient::new(http_client);

    let err = client.send_door_open("esp32-a").await.unwrap_err();
    assert!(matches!(err, DashboardError::Connectivity(_)));
}

#[tokio::test]
async fn test_open_door_sends_bearer_token() {
    let (_, client) = client_with(admin_context().await).await;
    client.send_door_open("esp32-a").await.unwrap();
    // closing has no backend call
    client.send_door_close("esp32-a").await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_clears_persisted_session() {
    let dir = tempfile::tempdir().unwrap();
    let file = File::new(dir.path().join("session.json"));
    let session = Arc::new(SessionContext::load(file.clone()).await.unwrap());
    session
        .set(Session::new("stale-token".to_string(), "admin".to_string()))
        .await
        .unwrap();
    assert!(file.exists().await);

    let (_, client) = client_with(session.clone()).await;
    let err = client.send_door_open("esp32-a").await.unwrap_err();

    assert!(matches!(err, DashboardError::Unauthorized(_)));
    assert!(session.current().is_none());
    assert!(!file.exists().await);
    assert!(matches!(
        session.require_admin(),
        Err(DashboardError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_enrollment_endpoints() {
    let (_, client) = client_with(admin_context().await).await;

    assert_eq!(client.start_enroll("esp32-a", "7").await.unwrap(), "42");
    assert_eq!(client.start_enroll("esp32-a", "8").await.unwrap(), "fp-8");

    let err = client.start_enroll("esp32-a", "99").await.unwrap_err();
    assert!(matches!(err, DashboardError::Validation(ref d) if d == "Employee not found"));

    let err = client.start_enroll("esp32-a", "  ").await.unwrap_err();
    assert!(matches!(err, DashboardError::Validation(_)));

    let report = client.fetch_enroll_status("esp32-a", "42").await.unwrap();
    assert_eq!(report.status, "pending");
    assert_eq!(report.message.as_deref(), Some("Place finger"));
}

#[tokio::test]
async fn test_fingerprint_endpoints() {
    let (_, client) = client_with(admin_context().await).await;

    let fingerprints = client.list_fingerprints("esp32-a", "7").await.unwrap();
    assert_eq!(fingerprints.len(), 1);
    assert_eq!(fingerprints[0].finger_id, "42");
    assert_eq!(fingerprints[0].employee_id.as_deref(), Some("7"));

    client.delete_fingerprint("esp32-a", "42").await.unwrap();
    let err = client.delete_fingerprint("esp32-a", "43").await.unwrap_err();
    assert!(matches!(err, DashboardError::NotFound(_)));
}

#[tokio::test]
async fn test_login_requires_admin_role() {
    let (http_client, _) = client_with(Arc::new(SessionContext::in_memory())).await;

    let err = login(&http_client, "staff", "secret").await.unwrap_err();
    assert!(matches!(err, DashboardError::Forbidden(_)));
    assert!(http_client.session().current().is_none());

    let err = login(&http_client, "nobody", "secret").await.unwrap_err();
    assert!(matches!(err, DashboardError::Unauthorized(_)));

    let err = login(&http_client, "", "secret").await.unwrap_err();
    assert!(matches!(err, DashboardError::Validation(_)));

    let session = login(&http_client, "admin", "secret").await.unwrap();
    assert!(session.is_admin());
    assert_eq!(session.user_id.as_deref(), Some("1"));
    assert_eq!(http_client.session().bearer().as_deref(), Some(TOKEN));

    logout(&http_client).await.unwrap();
    assert!(http_client.session().current().is_none());
}

#[tokio::test]
async fn test_path_segments_are_escaped() {
    let (_, client) = client_with(admin_context().await).await;

    // reaches the fingerprint route with the id intact, not the door route
    client
        .delete_fingerprint("esp32-a", "x/../door/open")
        .await
        .unwrap();

    let err = client.delete_fingerprint("esp32-a", "..").await.unwrap_err();
    assert!(matches!(err, DashboardError::Validation(_)));
}

#[tokio::test]
async fn test_failed_login_keeps_current_session() {
    let dir = tempfile::tempdir().unwrap();
    let file = File::new(dir.path().join("session.json"));
    let session = Arc::new(SessionContext::load(file.clone()).await.unwrap());
    session
        .set(Session::new(TOKEN.to_string(), "admin".to_string()))
        .await
        .unwrap();

    let (http_client, _) = client_with(session.clone()).await;
    let err = login(&http_client, "nobody", "wrong").await.unwrap_err();

    assert!(matches!(err, DashboardError::Unauthorized(_)));
    assert_eq!(session.bearer().as_deref(), Some(TOKEN));
    assert!(file.exists().await);
}

#[tokio::test]
async fn test_session_commands_use_stored_session() {
    let dir = tempfile::tempdir().unwrap();
    let options = AppOptions {
        backend_base_url: spawn_backend().await,
        layout: StorageLayout::new(dir.path()),
        ..Default::default()
    };
    let session_file = options.layout.session_file();

    let login_as = |username: &str, password: &str| SessionCommand::Login {
        username: username.to_string(),
        password: password.to_string(),
    };

    let session = manage_session(&options, &login_as("admin", "secret"))
        .await
        .unwrap()
        .unwrap();
    assert!(session.is_admin());
    assert!(session_file.exists().await);

    let err = manage_session(&options, &login_as("nobody", "wrong"))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("logging in as 'nobody'"));
    assert!(matches!(
        err.downcast_ref::<DashboardError>(),
        Some(DashboardError::Unauthorized(_))
    ));
    // the admin session survives a failed login
    assert!(session_file.exists().await);

    assert!(manage_session(&options, &SessionCommand::Logout)
        .await
        .unwrap()
        .is_none());
    assert!(!session_file.exists().await);
}
