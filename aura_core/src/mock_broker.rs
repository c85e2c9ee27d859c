use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use axum::http::StatusCode;
use tradovate_api::{ApiError, OrderAck, PlaceOrder, Position};

use crate::{Broker, TradingConfig};

/// In-memory broker recording every order it is asked to place.
#[derive(Default)]
pub(crate) struct MockBroker {
    pub positions: Vec<Position>,
    pub fail_orders: bool,
    pub fail_lookup: bool,
    pub panic_on_order: bool,
    pub placed: Mutex<Vec<PlaceOrder>>,
    pub lookups: AtomicUsize,
}

impl MockBroker {
    pub fn with_positions(positions: Vec<Position>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    pub fn failing_orders() -> Self {
        Self {
            fail_orders: true,
            ..Default::default()
        }
    }

    pub fn failing_lookup() -> Self {
        Self {
            fail_lookup: true,
            ..Default::default()
        }
    }

    pub fn orders(&self) -> Vec<PlaceOrder> {
        self.placed.lock().unwrap().clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Broker for MockBroker {
    async fn place_order(&self, order: &PlaceOrder) -> Result<OrderAck, ApiError> {
        if self.panic_on_order {
            panic!("broker exploded");
        }
        if self.fail_orders {
            return Err(ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".into(),
            });
        }
        let mut placed = self.placed.lock().unwrap();
        placed.push(order.clone());
        Ok(OrderAck {
            order_id: Some(placed.len() as u64),
        })
    }

    async fn find_positions(&self, _account_id: u64) -> Result<Vec<Position>, ApiError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup {
            return Err(ApiError::Status {
                status: StatusCode::UNAUTHORIZED,
                body: "Expired Access Token".into(),
            });
        }
        Ok(self.positions.clone())
    }
}

pub(crate) fn position(symbol: &str, net_pos: i64) -> Position {
    Position {
        symbol: symbol.into(),
        net_pos,
    }
}

pub(crate) fn trading_config() -> TradingConfig {
    TradingConfig {
        account_id: 1427850,
        symbol: "MESM5".into(),
        max_spend: 200.,
        margin_per_contract: 50.,
    }
}
