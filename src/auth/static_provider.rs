use std::collections::HashSet;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::AuthProvider;

/// A fixed token and permission set, mostly useful for scripts and tests.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default)]
pub struct StaticAuthProviderConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// An [`AuthProvider`] whose answers are held in memory.
pub struct StaticAuthProvider {
    token: RwLock<Option<String>>,
    permissions: RwLock<HashSet<String>>,
}

impl StaticAuthProvider {
    pub fn new(config: &StaticAuthProviderConfig) -> Self {
        Self {
            token: RwLock::new(config.token.clone()),
            permissions: RwLock::new(config.permissions.iter().cloned().collect()),
        }
    }

    /// Shorthand for a session with the given token and permissions.
    pub fn with_token<I, S>(token: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            token: RwLock::new(Some(token.into())),
            permissions: RwLock::new(permissions.into_iter().map(Into::into).collect()),
        }
    }

    /// Replace the token, e.g. after a refresh. `None` ends the session.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn grant(&self, permission: impl Into<String>) {
        self.permissions.write().await.insert(permission.into());
    }

    pub async fn revoke(&self, permission: &str) {
        self.permissions.write().await.remove(permission);
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn current_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    async fn has_permission(&self, permission: &str) -> bool {
        self.permissions.read().await.contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DRINKS_DETAIL_PERMISSION;

    #[tokio::test]
    async fn test_config_values_are_served() {
        let provider = StaticAuthProvider::new(&StaticAuthProviderConfig {
            token: Some("abc".to_string()),
            permissions: vec![DRINKS_DETAIL_PERMISSION.to_string()],
        });

        assert_eq!(provider.current_token().await.as_deref(), Some("abc"));
        assert!(provider.has_permission(DRINKS_DETAIL_PERMISSION).await);
        assert!(!provider.has_permission("delete:drinks").await);
    }

    #[tokio::test]
    async fn test_token_rotation_and_revocation() {
        let provider = StaticAuthProvider::with_token("first", ["post:drinks"]);

        provider.set_token(Some("second".to_string())).await;
        provider.revoke("post:drinks").await;
        provider.grant("patch:drinks").await;

        assert_eq!(provider.current_token().await.as_deref(), Some("second"));
        assert!(!provider.has_permission("post:drinks").await);
        assert!(provider.has_permission("patch:drinks").await);

        provider.set_token(None).await;
        assert!(provider.current_token().await.is_none());
    }
}
