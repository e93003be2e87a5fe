use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use crate::auth::AuthProviderConfig;

/// Default location of the config file, overridable with `DRINKS_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    #[serde(default)]
    pub environment: Environment,
    pub api_server_url: String,
    pub auth0: Auth0Config,
    #[serde(default)]
    pub auth: AuthProviderConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl ConfigV1 {
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// The logging section, or the defaults for this environment.
    pub fn logging(&self) -> LoggingConfig {
        self.logging
            .clone()
            .unwrap_or_else(|| LoggingConfig::for_environment(self.environment))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Settings of the Auth0 tenant that issues our access tokens.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct Auth0Config {
    pub url: String,
    pub audience: String,
    pub client_id: String,
    pub callback_url: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

fn default_timeout_in_ms() -> u64 {
    30_000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_in_ms: default_timeout_in_ms(),
        }
    }
}

/// Build the figment for a YAML file with `DRINKS_` environment overrides,
/// e.g. `DRINKS_AUTH__TOKEN` or `DRINKS_API_SERVER_URL`.
pub fn build_figment(path: impl AsRef<Path>) -> Figment {
    Figment::new()
        .merge(Yaml::file(path.as_ref()))
        .merge(Env::prefixed("DRINKS_").ignore(&["CONFIG"]).split("__"))
}

/// Extract a `ConfigV1` out of a figment, handling version migration.
pub fn extract(source: Figment) -> Result<ConfigV1, figment::Error> {
    match source.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// Load the config from `DRINKS_CONFIG`, or `./config.yaml` when unset.
pub fn load_config() -> Result<ConfigV1, figment::Error> {
    let path = std::env::var("DRINKS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    extract(build_figment(path))
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
