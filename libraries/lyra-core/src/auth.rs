//! Authentication provider seam

use crate::error::Result;
use crate::types::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
}

impl AuthUser {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            email: email.into(),
        }
    }
}

/// Yields the current user, or `None` for guest browsing
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<AuthUser>>;
}

/// Provider with a fixed identity
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user: Option<AuthUser>,
}

impl StaticAuth {
    /// No one signed in
    pub fn guest() -> Self {
        Self { user: None }
    }

    /// Always signed in as `user`
    pub fn signed_in(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn current_user(&self) -> Result<Option<AuthUser>> {
        Ok(self.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guest_has_no_user() {
        assert_eq!(StaticAuth::guest().current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn signed_in_yields_identity() {
        let auth = StaticAuth::signed_in(AuthUser::new("u1", "u1@example.com"));
        let user = auth.current_user().await.unwrap().unwrap();
        assert_eq!(user.id.as_str(), "u1");
    }
}
