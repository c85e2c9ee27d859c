pub mod dispatch;
pub mod orders;
pub mod server;
pub mod signal;
pub mod tradovate;

#[cfg(test)]
mod mock_broker;

use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use tradovate_api::{ApiError, OrderAck, PlaceOrder, Position};

pub use dispatch::{DispatchError, Dispatcher, Outcome};
pub use server::WebhookServer;
pub use signal::Signal;
pub use tradovate::TradovateBroker;

/// The two brokerage calls the bot makes. Implementations carry their own session.
pub trait Broker: Send + Sync {
    fn place_order(
        &self,
        order: &PlaceOrder,
    ) -> impl Future<Output = Result<OrderAck, ApiError>> + Send;

    fn find_positions(
        &self,
        account_id: u64,
    ) -> impl Future<Output = Result<Vec<Position>, ApiError>> + Send;
}

/// Account, instrument and sizing, read from `TRADOVATE_*` variables.
#[derive(Deserialize, Debug, Clone)]
pub struct TradingConfig {
    pub account_id: u64,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// USD budget per entry
    #[serde(default = "default_max_spend")]
    pub max_spend: f64,
    #[serde(default = "default_margin_per_contract")]
    pub margin_per_contract: f64,
}

fn default_symbol() -> String {
    "MESM5".to_string()
}

fn default_max_spend() -> f64 {
    200.
}

fn default_margin_per_contract() -> f64 {
    50.
}

impl TradingConfig {
    pub fn from_env() -> Result<Self> {
        let config: Self = envy::prefixed(tradovate_api::ENV_PREFIX)
            .from_env()
            .context("Invalid TRADOVATE_* trading configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.symbol.trim().is_empty(), "symbol must not be empty");
        ensure!(
            self.margin_per_contract.is_finite() && self.margin_per_contract > 0.,
            "margin_per_contract must be a positive number, got {}",
            self.margin_per_contract
        );
        ensure!(
            self.max_spend.is_finite() && self.max_spend >= 0.,
            "max_spend must be a non-negative number, got {}",
            self.max_spend
        );
        Ok(())
    }

    pub fn order_quantity(&self) -> u32 {
        orders::order_quantity(self.max_spend, self.margin_per_contract)
    }
}

/// Listener and startup settings, read from `AURA_*` variables.
#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Extra login attempts after the first one fails. 0 fails fast.
    #[serde(default)]
    pub auth_retries: u32,
    #[serde(default = "default_auth_retry_delay_ms")]
    pub auth_retry_delay_ms: u64,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_auth_retry_delay_ms() -> u64 {
    1000
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        envy::prefixed("AURA_")
            .from_env()
            .context("Invalid AURA_* configuration")
    }

    pub fn auth_retry_delay(&self) -> Duration {
        Duration::from_millis(self.auth_retry_delay_ms)
    }
}
