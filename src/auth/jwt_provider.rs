use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::AuthProvider;

/// Config for the JWT provider. The token normally arrives through the
/// `DRINKS_AUTH__TOKEN` environment variable rather than the config file.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default)]
pub struct JwtAuthProviderConfig {
    #[serde(default)]
    pub token: Option<String>,
    /// Expected `aud` claim. Defaults to the Auth0 audience.
    #[serde(default)]
    pub audience: Option<String>,
}

/// The claims we read from an access token.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    permissions: Vec<String>,
}

/// Holds the active access token and answers permission checks from its
/// `permissions` claim.
///
/// The signature is not checked here: the API verifies every token it
/// receives, so the client only needs the claims for UI decisions. Expiry and
/// audience are still enforced so a stale token grants nothing.
pub struct JwtAuthProvider {
    token: RwLock<Option<String>>,
    validation: Validation,
}

impl JwtAuthProvider {
    pub fn new(config: &JwtAuthProviderConfig) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            token: RwLock::new(config.token.clone()),
            validation,
        }
    }

    /// Replace the active token, e.g. after the login callback.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    fn permissions(&self, token: &str) -> Vec<String> {
        match decode::<Claims>(token, &DecodingKey::from_secret(&[]), &self.validation) {
            Ok(data) => data.claims.permissions,
            Err(e) => {
                debug!("Ignoring permissions of unusable token: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    async fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .await
            .as_ref()
            .filter(|token| !token.is_empty())
            .cloned()
    }

    async fn has_permission(&self, permission: &str) -> bool {
        match self.current_token().await {
            Some(token) => self.permissions(&token).iter().any(|p| p == permission),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DRINKS_DETAIL_PERMISSION;
    use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        aud: &'a str,
        exp: u64,
        permissions: Vec<&'a str>,
    }

    fn token(aud: &str, exp: u64, permissions: Vec<&str>) -> String {
        encode(
            &Header::default(),
            &TestClaims { aud, exp, permissions },
            &EncodingKey::from_secret(b"not-checked"),
        )
        .unwrap()
    }

    fn provider(token: Option<String>) -> JwtAuthProvider {
        JwtAuthProvider::new(&JwtAuthProviderConfig {
            token,
            audience: Some("drinks".to_string()),
        })
    }

    #[tokio::test]
    async fn test_permissions_claim_is_read() {
        let jwt = token(
            "drinks",
            get_current_timestamp() + 3600,
            vec![DRINKS_DETAIL_PERMISSION, "post:drinks"],
        );
        let provider = provider(Some(jwt.clone()));

        assert_eq!(provider.current_token().await, Some(jwt));
        assert!(provider.has_permission(DRINKS_DETAIL_PERMISSION).await);
        assert!(provider.has_permission("post:drinks").await);
        assert!(!provider.has_permission("delete:drinks").await);
    }

    #[tokio::test]
    async fn test_expired_token_grants_nothing() {
        let jwt = token(
            "drinks",
            get_current_timestamp() - 3600,
            vec![DRINKS_DETAIL_PERMISSION],
        );
        let provider = provider(Some(jwt));
        assert!(!provider.has_permission(DRINKS_DETAIL_PERMISSION).await);
    }

    #[tokio::test]
    async fn test_wrong_audience_grants_nothing() {
        let jwt = token(
            "someone-else",
            get_current_timestamp() + 3600,
            vec![DRINKS_DETAIL_PERMISSION],
        );
        let provider = provider(Some(jwt));
        assert!(!provider.has_permission(DRINKS_DETAIL_PERMISSION).await);
    }

    #[tokio::test]
    async fn test_garbage_and_missing_tokens() {
        let provider = provider(Some("not-a-jwt".to_string()));
        assert!(!provider.has_permission(DRINKS_DETAIL_PERMISSION).await);

        provider.set_token(Some(String::new())).await;
        assert!(provider.current_token().await.is_none());

        provider.set_token(None).await;
        assert!(!provider.has_permission(DRINKS_DETAIL_PERMISSION).await);
    }
}
