//! Wiring from a loaded configuration to a ready `DrinkStore`.

use std::sync::Arc;

use tracing::info;

use crate::auth::create_auth_provider;
use crate::config::ConfigV1;
use crate::store::DrinkStore;
use crate::transport::ReqwestTransport;

/// Builds the reqwest transport and the configured auth provider and hands
/// both to a new store pointed at `api_server_url`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn build_store(config: &ConfigV1) -> Result<DrinkStore, reqwest::Error> {
    info!(
        environment = ?config.environment,
        api_server_url = config.api_server_url.as_str(),
        timeout_in_ms = config.http.timeout_in_ms,
        "Building drink store"
    );

    let transport = Arc::new(ReqwestTransport::new(&config.http)?);
    let auth = create_auth_provider(&config.auth, &config.auth0);

    Ok(DrinkStore::new(config.api_server_url.clone(), auth, transport))
}
