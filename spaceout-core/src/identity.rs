use serde::{Deserialize, Serialize};
use async_trait::async_trait;
use std::fmt;
use crate::{CoreError, CoreResult};

/// Opaque, stable identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self { id: UserId::new(id), email }
    }
}

/// Source of the currently authenticated user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Option<UserIdentity>;
}

/// Identity resolved up front, e.g. from an already verified bearer token.
#[derive(Debug, Clone, Default)]
pub struct ResolvedIdentity(pub Option<UserIdentity>);

impl ResolvedIdentity {
    pub fn signed_in(user: UserIdentity) -> Self {
        Self(Some(user))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl IdentityProvider for ResolvedIdentity {
    async fn current_user(&self) -> Option<UserIdentity> {
        self.0.clone()
    }
}

/// Ledger operations never run without a user.
pub async fn require_user(provider: &dyn IdentityProvider) -> CoreResult<UserIdentity> {
    match provider.current_user().await {
        Some(user) => Ok(user),
        None => {
            tracing::debug!("Ledger call rejected: no authenticated user");
            Err(CoreError::NotAuthenticated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_require_user() {
        let anon = ResolvedIdentity::anonymous();
        assert_eq!(require_user(&anon).await, Err(CoreError::NotAuthenticated));

        let user = UserIdentity::new("user-42", Some("pilot@spaceout.io".into()));
        let signed_in = ResolvedIdentity::signed_in(user.clone());
        assert_eq!(require_user(&signed_in).await.unwrap(), user);
    }
}
