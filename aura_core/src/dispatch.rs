use anyhow::Context;
use serde::Serialize;
use tradovate_api::Action;

use crate::{
    Broker, TradingConfig,
    orders::{self, CloseOutcome, Placed},
    signal::{self, Signal},
};

/// What happened downstream of a recognised signal. Broker failures end up here rather than
/// failing the webhook call.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    OrderPlaced(Placed),
    OrderFailed { detail: String },
    PositionClosed(Placed),
    NoPosition,
    CloseFailed { detail: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown signal")]
    UnknownSignal,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct Dispatcher<B> {
    broker: B,
    config: TradingConfig,
}

impl<B: Broker> Dispatcher<B> {
    pub fn new(broker: B, config: TradingConfig) -> Self {
        Self { broker, config }
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    /// Classifies a raw webhook body and acts on it.
    pub async fn dispatch(&self, body: &[u8]) -> Result<(Signal, Outcome), DispatchError> {
        let text = std::str::from_utf8(body).context("Signal is not valid UTF-8")?;
        tracing::info!("Signal received: {}", text.trim());

        let Some(signal) = signal::classify(text) else {
            tracing::warn!("Unknown signal: {}", text.trim());
            return Err(DispatchError::UnknownSignal);
        };

        let outcome = match signal {
            Signal::Buy => self.open(Action::Buy).await,
            Signal::Sell => self.open(Action::Sell).await,
            Signal::Exit => self.close().await,
        };
        Ok((signal, outcome))
    }

    async fn open(&self, action: Action) -> Outcome {
        match orders::submit_order(&self.broker, &self.config, action).await {
            Ok(placed) => {
                tracing::info!(
                    "{action} order placed | Qty: {} | Order id: {:?}",
                    placed.quantity,
                    placed.order_id
                );
                Outcome::OrderPlaced(placed)
            }
            Err(e) => {
                let detail = error_chain(e);
                tracing::error!("Error placing {action} order: {detail}");
                Outcome::OrderFailed { detail }
            }
        }
    }

    async fn close(&self) -> Outcome {
        match orders::close_position(&self.broker, &self.config).await {
            Ok(CloseOutcome::Closed(placed)) => {
                tracing::info!(
                    "EXIT: closed {} contracts with {}",
                    placed.quantity,
                    placed.action
                );
                Outcome::PositionClosed(placed)
            }
            Ok(CloseOutcome::Flat) => {
                tracing::info!("No open {} position to close", self.config.symbol);
                Outcome::NoPosition
            }
            Err(e) => {
                let detail = error_chain(e);
                tracing::error!("Error checking or closing position: {detail}");
                Outcome::CloseFailed { detail }
            }
        }
    }
}

/// Display of `e` followed by each of its sources, e.g. `request failed: ...: operation timed out`.
fn error_chain<E>(e: E) -> String
where
    E: std::error::Error + Send + Sync + 'static,
{
    format!("{:#}", anyhow::Error::from(e))
}
