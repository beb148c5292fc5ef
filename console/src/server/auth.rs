//! Admin guard for operator routes

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::server::errors::ApiError;
use crate::server::state::ServerState;
use crate::session::Session;

/// Requires a live admin session. Rejects with 401 without one, 403 for
/// any other role.
pub struct RequireAdmin(pub Session);

impl FromRequestParts<Arc<ServerState>> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &Arc<ServerState>,
    ) -> Result<Self, Self::Rejection> {
        let session = state.session.require_admin()?;
        Ok(RequireAdmin(session))
    }
}
