use serde::Serialize;
use tradovate_api::{Action, ApiError, PlaceOrder};

use crate::{Broker, TradingConfig};

/// Whole contracts affordable with `max_spend`, never less than one.
pub fn order_quantity(max_spend: f64, margin_per_contract: f64) -> u32 {
    // float-to-int casts saturate: NaN and negatives land on 0
    ((max_spend / margin_per_contract).floor() as u32).max(1)
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed {
    pub action: Action,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed(Placed),
    /// No nonzero position in the configured symbol.
    Flat,
}

#[derive(Debug, thiserror::Error)]
pub enum CloseError {
    #[error("position lookup failed")]
    Lookup(#[source] ApiError),
    #[error("closing order failed")]
    Order(#[source] ApiError),
}

/// Market order sized from the configured budget.
pub async fn submit_order<B: Broker>(
    broker: &B,
    config: &TradingConfig,
    action: Action,
) -> Result<Placed, ApiError> {
    let quantity = config.order_quantity();
    let order = PlaceOrder::market(config.account_id, action, &config.symbol, quantity);
    let ack = broker.place_order(&order).await?;
    Ok(Placed {
        action,
        quantity,
        order_id: ack.order_id,
    })
}

/// Flattens the first nonzero position in the configured symbol with one opposite market
/// order.
pub async fn close_position<B: Broker>(
    broker: &B,
    config: &TradingConfig,
) -> Result<CloseOutcome, CloseError> {
    let positions = broker
        .find_positions(config.account_id)
        .await
        .map_err(CloseError::Lookup)?;

    let Some((action, net_pos)) = positions
        .iter()
        .filter(|p| p.symbol.as_str() == config.symbol)
        .find_map(|p| Action::offsetting(p.net_pos).map(|action| (action, p.net_pos)))
    else {
        return Ok(CloseOutcome::Flat);
    };

    let quantity = u32::try_from(net_pos.unsigned_abs()).unwrap_or(u32::MAX);
    let order = PlaceOrder::market(config.account_id, action, &config.symbol, quantity);
    let ack = broker
        .place_order(&order)
        .await
        .map_err(CloseError::Order)?;

    Ok(CloseOutcome::Closed(Placed {
        action,
        quantity,
        order_id: ack.order_id,
    }))
}
