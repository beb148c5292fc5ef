//! Operator login and logout

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use openapi_client::models::LoginRequest;

use crate::app::options::AppOptions;
use crate::device::client::value_to_id;
use crate::errors::DashboardError;
use crate::http::client::HttpClient;
use crate::session::{Session, SessionContext};

/// Session commands run instead of the console (`--login`, `--logout`)
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Login { username: String, password: String },
    Logout,
}

/// Run a session command against the stored session file.
/// Returns the new session after a login.
pub async fn manage_session(
    options: &AppOptions,
    command: &SessionCommand,
) -> anyhow::Result<Option<Session>> {
    let session_file = options.layout.session_file();
    let session = SessionContext::load(session_file.clone())
        .await
        .with_context(|| format!("reading session file {}", session_file.path().display()))?;
    let http_client = HttpClient::new(
        &options.backend_base_url,
        Arc::new(session),
        options.request_timeout,
    )
    .context("creating backend client")?;

    match command {
        SessionCommand::Logout => {
            logout(&http_client).await.context("logging out")?;
            Ok(None)
        }
        SessionCommand::Login { username, password } => {
            let session = login(&http_client, username, password)
                .await
                .with_context(|| format!("logging in as '{}'", username))?;
            Ok(Some(session))
        }
    }
}

/// Exchange credentials for a session and persist it. Only admin accounts
/// may use the console; any other role is rejected and nothing is stored.
pub async fn login(
    http_client: &HttpClient,
    username: &str,
    password: &str,
) -> Result<Session, DashboardError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(DashboardError::Validation(
            "username and password are required".to_string(),
        ));
    }

    let response = http_client
        .login(&LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        })
        .await?;

    let mut session = Session::new(response.access_token, response.role);
    session.username = response.username.or_else(|| Some(username.trim().to_string()));
    session.user_id = response.user_id.as_ref().and_then(value_to_id);

    if !session.is_admin() {
        warn!("Login rejected for {}: role '{}'", username, session.role);
        return Err(DashboardError::Forbidden(format!(
            "role '{}' cannot access the admin console",
            session.role
        )));
    }

    http_client.session().set(session.clone()).await?;
    info!("Logged in as {}", username);
    Ok(session)
}

/// Forget the stored session
pub async fn logout(http_client: &HttpClient) -> Result<(), DashboardError> {
    http_client.session().clear().await?;
    info!("Logged out");
    Ok(())
}
