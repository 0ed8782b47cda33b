//! Authentication against the hosted backend.

use crate::client::BackendClient;
use crate::types::{AuthSession, PasswordGrantRequest, RefreshGrantRequest, TokenResponse};
use async_trait::async_trait;
use lyra_core::{AuthProvider, AuthUser, LyraError, Result};
use reqwest::Method;
use tracing::{debug, info, warn};

/// Password sign-in and session holder.
///
/// Shares its session with every `RestStore` built from the same
/// `BackendClient`, so store requests run with the user's credentials.
pub struct RestAuth {
    client: BackendClient,
}

impl RestAuth {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Sign in with email and password.
    ///
    /// On success the session is stored for subsequent requests.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let url = self.client.auth_url("token");
        debug!(url = %url, email = %email, "Attempting sign-in");

        let request = self
            .client
            .request(Method::POST, &url)
            .await
            .query(&[("grant_type", "password")])
            .json(&PasswordGrantRequest { email, password });

        let response = match self.client.fetch::<TokenResponse>(request).await {
            Ok(response) => response,
            Err(LyraError::Validation(message)) => {
                warn!(error = %message, "Sign-in failed: invalid credentials");
                return Err(LyraError::Unauthenticated);
            }
            Err(e) => return Err(e),
        };

        let session = session_from(response);
        let user = session.user.clone();
        self.client.set_session(Some(session)).await;

        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Exchange the refresh token for a new access token.
    pub async fn refresh(&self) -> Result<AuthUser> {
        let refresh_token = self
            .client
            .session()
            .await
            .and_then(|s| s.refresh_token)
            .ok_or(LyraError::Unauthenticated)?;

        let url = self.client.auth_url("token");
        debug!(url = %url, "Refreshing access token");

        let request = self
            .client
            .request(Method::POST, &url)
            .await
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrantRequest {
                refresh_token: &refresh_token,
            });

        let response: TokenResponse = self.client.fetch(request).await.map_err(|e| {
            warn!(error = %e, "Token refresh failed");
            match e {
                LyraError::Validation(_) => LyraError::Unauthenticated,
                other => other,
            }
        })?;

        let session = session_from(response);
        let user = session.user.clone();
        self.client.set_session(Some(session)).await;
        Ok(user)
    }

    /// Restore a session from stored tokens.
    pub async fn restore(&self, user: AuthUser, access_token: String, refresh_token: Option<String>) {
        self.client
            .set_session(Some(AuthSession {
                access_token,
                refresh_token,
                user,
            }))
            .await;
    }

    /// Sign out.
    ///
    /// The local session is cleared even when the backend call fails.
    pub async fn sign_out(&self) -> Result<()> {
        if self.client.session().await.is_none() {
            return Ok(());
        }

        let url = self.client.auth_url("logout");
        let request = self.client.request(Method::POST, &url).await;
        let result = self.client.execute(request).await.map(|_| ());

        self.client.set_session(None).await;
        info!("Signed out");
        result
    }
}

fn session_from(response: TokenResponse) -> AuthSession {
    AuthSession {
        access_token: response.access_token,
        refresh_token: Some(response.refresh_token),
        user: response.user.into(),
    }
}

#[async_trait]
impl AuthProvider for RestAuth {
    async fn current_user(&self) -> Result<Option<AuthUser>> {
        Ok(self.client.session().await.map(|s| s.user))
    }
}
