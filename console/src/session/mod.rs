//! Operator session
//!
//! The session returned by the backend login endpoint is held in an explicit
//! [`SessionContext`] that the HTTP client is constructed with. It is set on
//! login, cleared on logout or on any 401 response, and mirrored to a file so
//! that a restarted console keeps the operator logged in.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::DashboardError;
use crate::filesys::file::File;

/// An authenticated operator session
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub role: String,
    pub username: Option<String>,
    pub user_id: Option<String>,
}

/// On-disk representation of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    exp: Option<i64>,
}

impl Session {
    pub fn new(access_token: String, role: String) -> Self {
        Self {
            access_token: SecretString::from(access_token),
            role,
            username: None,
            user_id: None,
        }
    }

    /// Whether the role grants access to the admin console
    pub fn is_admin(&self) -> bool {
        self.role.trim().eq_ignore_ascii_case("admin")
    }

    /// Expiry of the access token, when it is a JWT carrying `exp`.
    /// The signature is not checked; the backend remains the authority.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(
            self.access_token.expose_secret(),
            &DecodingKey::from_secret(b""),
            &validation,
        )
        .ok()?;
        data.claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at().map(|exp| exp <= Utc::now()).unwrap_or(false)
    }

    fn to_stored(&self) -> StoredSession {
        StoredSession {
            access_token: self.access_token.expose_secret().to_string(),
            role: self.role.clone(),
            username: self.username.clone(),
            user_id: self.user_id.clone(),
        }
    }

    fn from_stored(stored: StoredSession) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            role: stored.role,
            username: stored.username,
            user_id: stored.user_id,
        }
    }
}

/// Holder of the current session, shared by the HTTP client and the route guard
pub struct SessionContext {
    current: RwLock<Option<Session>>,
    file: Option<File>,
}

impl SessionContext {
    /// A context that is never persisted
    pub fn in_memory() -> Self {
        Self {
            current: RwLock::new(None),
            file: None,
        }
    }

    /// A context mirrored to `file`, seeded from it when a valid session exists
    pub async fn load(file: File) -> Result<Self, DashboardError> {
        let mut current = None;
        if file.exists().await {
            let stored: StoredSession = file.read_json().await?;
            let session = Session::from_stored(stored);
            if session.is_expired() {
                info!("Stored session has expired, discarding");
                file.delete().await?;
            } else {
                debug!("Restored session for role {}", session.role);
                current = Some(session);
            }
        }

        Ok(Self {
            current: RwLock::new(current),
            file: Some(file),
        })
    }

    /// Replace the current session (login)
    pub async fn set(&self, session: Session) -> Result<(), DashboardError> {
        if let Some(file) = &self.file {
            file.write_private_json(&session.to_stored()).await?;
        }
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(session);
        Ok(())
    }

    /// Drop the current session (logout, 401)
    pub async fn clear(&self) -> Result<(), DashboardError> {
        {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            *current = None;
        }
        if let Some(file) = &self.file {
            file.delete().await?;
        }
        Ok(())
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Bearer token for outgoing requests
    pub fn bearer(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.access_token.expose_secret().to_string())
    }

    /// Route guard for admin-only views
    pub fn require_admin(&self) -> Result<Session, DashboardError> {
        let session = self
            .current()
            .ok_or_else(|| DashboardError::Unauthorized("Not logged in".to_string()))?;
        if session.is_expired() {
            return Err(DashboardError::Unauthorized("Session expired".to_string()));
        }
        if !session.is_admin() {
            return Err(DashboardError::Forbidden(format!("Role {} is not admin", session.role)));
        }
        Ok(session)
    }
}
