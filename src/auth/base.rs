use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::jwt_provider::{JwtAuthProvider, JwtAuthProviderConfig};
use super::static_provider::{StaticAuthProvider, StaticAuthProviderConfig};
use crate::config::Auth0Config;

/// Permission that unlocks the detailed drinks listing.
pub const DRINKS_DETAIL_PERMISSION: &str = "get:drinks-detail";

/// Configuration options for the auth provider the store talks to.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
#[serde(tag = "type")]
pub enum AuthProviderConfig {
    #[serde(rename = "static")]
    Static(StaticAuthProviderConfig),
    #[serde(rename = "jwt")]
    Jwt(JwtAuthProviderConfig),
}

impl Default for AuthProviderConfig {
    fn default() -> Self {
        AuthProviderConfig::Jwt(JwtAuthProviderConfig::default())
    }
}

/// Supplies the bearer token for each request and answers permission
/// questions about the current session.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current bearer token, `None` when there is no session.
    async fn current_token(&self) -> Option<String>;

    /// Whether the current session grants the named permission.
    async fn has_permission(&self, permission: &str) -> bool;
}

/// Create an auth provider from its config. The JWT provider falls back to
/// the Auth0 audience when it has none of its own.
pub fn create_auth_provider(config: &AuthProviderConfig, auth0: &Auth0Config) -> Arc<dyn AuthProvider> {
    match config {
        AuthProviderConfig::Static(cfg) => {
            info!("Using static auth provider");
            Arc::new(StaticAuthProvider::new(cfg)) as Arc<dyn AuthProvider>
        }
        AuthProviderConfig::Jwt(cfg) => {
            let mut cfg = cfg.clone();
            if cfg.audience.is_none() {
                cfg.audience = Some(auth0.audience.clone());
            }
            info!("Using JWT auth provider for audience '{}'", auth0.audience);
            Arc::new(JwtAuthProvider::new(&cfg)) as Arc<dyn AuthProvider>
        }
    }
}
