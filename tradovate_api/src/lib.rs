pub mod client;
pub mod error;
pub mod types;

use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

pub use client::{OrderAck, RestClient, Session};
pub use error::ApiError;
pub use types::{Action, Environment, OrderType, PlaceOrder, Position};

pub const ENV_PREFIX: &str = "TRADOVATE_";

/// Loads `.env` into the process environment, overriding existing variables. A missing file is
/// not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv_override() {
        Ok(path) => tracing::debug!("Loaded {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to load .env: {e}"),
    }
}

/// Credentials and connection settings, read from `TRADOVATE_*` variables.
#[derive(Deserialize, Clone)]
pub struct ApiConfig {
    pub client_id: u64,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_app_id")]
    pub app_id: String,
    #[serde(default = "default_app_version")]
    pub app_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Replaces the environment's host, e.g. to point at a local mock.
    pub base_url: Option<String>,
}

fn default_app_id() -> String {
    "AuraBot".to_string()
}

fn default_app_version() -> String {
    "1.0".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        envy::prefixed(ENV_PREFIX)
            .from_env::<Self>()
            .context("Invalid TRADOVATE_* configuration")
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.env.base_url())
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("env", &self.env)
            .field("app_id", &self.app_id)
            .field("app_version", &self.app_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("base_url", &self.base_url())
            .finish()
    }
}
