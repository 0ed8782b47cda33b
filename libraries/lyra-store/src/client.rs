//! HTTP plumbing shared by the REST store and the auth client.

use crate::config::BackendConfig;
use crate::types::AuthSession;
use lyra_core::{LyraError, Result};
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Connection to the hosted backend.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
/// Requests carry the anon key as `apikey` and, once signed in, the user's
/// access token as the bearer credential.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    config: Arc<BackendConfig>,
    session: Arc<RwLock<Option<AuthSession>>>,
}

impl BackendClient {
    /// Create a new client with the given configuration.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let config = config.normalized()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Lyra/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(map_request_error)?;

        Ok(Self {
            http,
            config: Arc::new(config),
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the backend URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub async fn session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    pub(crate) async fn set_session(&self, session: Option<AuthSession>) {
        *self.session.write().await = session;
    }

    /// `{url}/rest/v1/{table}`
    pub(crate) fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, table)
    }

    /// `{url}/auth/v1/{path}`
    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    /// Start a request with the API key and the best available credential.
    pub(crate) async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.config.anon_key.clone(),
        };

        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    /// Send a request and turn non-success statuses into errors.
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(map_request_error)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, url = %url, error = %body, "Backend request failed");
        Err(status_error(status, body))
    }

    /// Send a request and decode the JSON body.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.execute(request).await?;
        let url = response.url().to_string();
        let value = response
            .json::<T>()
            .await
            .map_err(|e| LyraError::Malformed(format!("failed to parse response: {e}")))?;
        debug!(url = %url, "Decoded backend response");
        Ok(value)
    }
}

/// `Prefer` header asking the backend to echo written rows.
pub(crate) fn return_representation() -> HeaderValue {
    HeaderValue::from_static("return=representation")
}

/// Map transport failures. Connection problems and timeouts are retryable.
pub(crate) fn map_request_error(err: reqwest::Error) -> LyraError {
    if err.is_decode() {
        LyraError::Malformed(err.to_string())
    } else {
        LyraError::TransientIo(err.to_string())
    }
}

/// Map an HTTP error status onto the error taxonomy.
pub(crate) fn status_error(status: StatusCode, message: String) -> LyraError {
    match status {
        StatusCode::UNAUTHORIZED => LyraError::Unauthenticated,
        StatusCode::FORBIDDEN => LyraError::Unauthorized(message),
        StatusCode::NOT_FOUND => LyraError::NotFound {
            entity: "Resource".to_string(),
            id: message,
        },
        StatusCode::CONFLICT => LyraError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            LyraError::TransientIo(format!("{status}: {message}"))
        }
        s if s.is_server_error() => LyraError::TransientIo(format!("{status}: {message}")),
        _ => LyraError::Validation(format!("{status}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_invalid_config() {
        assert!(BackendClient::new(BackendConfig::new("", "key")).is_err());
        assert!(BackendClient::new(BackendConfig::new("https://example.com", "key")).is_ok());
    }

    #[test]
    fn test_url_builders() {
        let client = BackendClient::new(BackendConfig::new("https://example.com/", "key")).unwrap();
        assert_eq!(client.table_url("songs"), "https://example.com/rest/v1/songs");
        assert_eq!(
            client.auth_url("token"),
            "https://example.com/auth/v1/token"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            LyraError::Unauthenticated
        );
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "rls".into()),
            LyraError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT, "dup".into()),
            LyraError::Conflict(_)
        ));
        assert!(status_error(StatusCode::BAD_GATEWAY, String::new()).is_transient());
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient());
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "bad".into()),
            LyraError::Validation(_)
        ));
    }
}
