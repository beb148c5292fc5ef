//! Error responses for the operator API

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use openapi_server::models::ErrorResponse;

use crate::errors::DashboardError;

/// Handler error: a [`DashboardError`] rendered as a JSON body
#[derive(Debug)]
pub struct ApiError(pub DashboardError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error kind
pub fn status_code(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::InvalidState { .. }
        | DashboardError::Busy
        | DashboardError::Conflict(_)
        | DashboardError::DuplicateFingerprint(_) => StatusCode::CONFLICT,
        DashboardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
        DashboardError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
        DashboardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        DashboardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DashboardError::Forbidden(_) => StatusCode::FORBIDDEN,
        DashboardError::EnrollmentFailed(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "Operator API request failed");
        }

        let body = ErrorResponse {
            error: self.0.kind().to_string(),
            message: self.0.user_message(),
        };
        (status, Json(body)).into_response()
    }
}
