//! HTTP client implementation

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};
use url::Url;

use openapi_client::models::ErrorResponse;

use crate::errors::DashboardError;
use crate::session::SessionContext;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for backend communication
pub struct HttpClient {
    client: Client,
    base: Url,
    base_url: String,
    session: Arc<SessionContext>,
}

impl HttpClient {
    /// Create a new HTTP client bound to a session context
    pub fn new(
        base_url: &str,
        session: Arc<SessionContext>,
        timeout: Duration,
    ) -> Result<Self, DashboardError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| DashboardError::Config(format!("Invalid backend URL {}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DashboardError::Config(format!(
                "Unsupported backend URL scheme: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base: parsed,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the session context this client authenticates with
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Absolute path with each segment percent-encoded, for ids taken from user input
    pub fn encoded_path(&self, segments: &[&str]) -> Result<String, DashboardError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || matches!(**s, "." | ".."))
        {
            return Err(DashboardError::Validation(format!(
                "invalid path segment '{}'",
                bad
            )));
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::Config(format!("Invalid backend URL {}", self.base_url)))?
            .clear()
            .extend(segments);
        Ok(url.path().to_string())
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DashboardError> {
        let (request, authenticated) = self.request(Method::GET, path, true);
        self.execute(Method::GET, path, request, authenticated).await
    }

    /// Make a GET request with query parameters
    pub async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, DashboardError> {
        let (request, authenticated) = self.request(Method::GET, path, true);
        self.execute(Method::GET, path, request.query(query), authenticated)
            .await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DashboardError> {
        let (request, authenticated) = self.request(Method::POST, path, true);
        self.execute(Method::POST, path, request.json(body), authenticated)
            .await
    }

    /// Make a POST request without the session token (login)
    pub async fn post_public<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DashboardError> {
        let (request, authenticated) = self.request(Method::POST, path, false);
        self.execute(Method::POST, path, request.json(body), authenticated)
            .await
    }

    /// Make a POST request without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, DashboardError> {
        let (request, authenticated) = self.request(Method::POST, path, true);
        self.execute(Method::POST, path, request, authenticated).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), DashboardError> {
        let (request, authenticated) = self.request(Method::DELETE, path, true);
        let _: serde_json::Value = self
            .execute(Method::DELETE, path, request, authenticated)
            .await?;
        Ok(())
    }

    /// Build a request; the flag tells whether a bearer token was attached
    fn request(&self, method: Method, path: &str, with_token: bool) -> (RequestBuilder, bool) {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        let token = if with_token { self.session.bearer() } else { None };
        let authenticated = token.is_some();
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        (request, authenticated)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<T, DashboardError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let err = classify_failure(status, response).await;
            error!("HTTP {} {} failed: {} - {}", method, path, status, err);

            // only a rejected token invalidates the session
            if status == StatusCode::UNAUTHORIZED && authenticated {
                if let Err(e) = self.session.clear().await {
                    warn!("Failed to clear session after 401: {}", e);
                }
            }
            return Err(err);
        }

        // Some device endpoints answer 200/204 with an empty body
        let bytes = response.bytes().await?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        let body = serde_json::from_slice(&bytes)
            .map_err(|e| DashboardError::Internal(format!("Malformed response from {}: {}", path, e)))?;
        Ok(body)
    }
}

/// Map a non-success response onto the error taxonomy
async fn classify_failure(status: StatusCode, response: Response) -> DashboardError {
    let body = response.text().await.unwrap_or_default();
    let detail = error_detail(&body);

    match status {
        StatusCode::UNAUTHORIZED => DashboardError::Unauthorized(detail),
        StatusCode::FORBIDDEN => DashboardError::Forbidden(detail),
        StatusCode::NOT_FOUND => DashboardError::NotFound(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            DashboardError::Validation(detail)
        }
        StatusCode::CONFLICT => DashboardError::Conflict(detail),
        _ => DashboardError::Connectivity(format!("{}: {}", status, detail)),
    }
}

/// Pull `detail` or `message` out of an error body, falling back to the raw text
fn error_detail(body: &str) -> String {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let detail = parsed.and_then(|e| {
        e.message.or(match e.detail {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
            None => None,
        })
    });
    detail.unwrap_or_else(|| body.trim().to_string())
}
