use std::fmt;

use serde::{Deserialize, Serialize};
use smartstring::alias::String;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Demo,
    Live,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Demo => "https://demo.tradovateapi.com",
            Environment::Live => "https://live.tradovateapi.com",
        }
    }
}

/// Order side, serialized exactly as the order endpoint expects: `"Buy"` / `"Sell"`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    /// The side that flattens a signed net position. `None` when already flat.
    pub fn offsetting(net_pos: i64) -> Option<Self> {
        match net_pos {
            0 => None,
            n if n > 0 => Some(Action::Sell),
            _ => Some(Action::Buy),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => f.write_str("Buy"),
            Action::Sell => f.write_str("Sell"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderType {
    Market,
}

/// Body of `POST /v1/order/placeorder`.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub account_id: u64,
    pub action: Action,
    pub symbol: String,
    pub order_qty: u32,
    pub order_type: OrderType,
    pub is_automated: bool,
}

impl PlaceOrder {
    pub fn market(account_id: u64, action: Action, symbol: &str, order_qty: u32) -> Self {
        Self {
            account_id,
            action,
            symbol: symbol.into(),
            order_qty,
            order_type: OrderType::Market,
            is_automated: true,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaceOrderResponse {
    pub order_id: Option<u64>,
    pub failure_reason: Option<String>,
    pub failure_text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessTokenRequest<'a> {
    pub name: &'a str,
    pub password: &'a str,
    pub app_id: &'a str,
    pub app_version: &'a str,
    pub cid: u64,
    pub sec: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessTokenResponse {
    pub access_token: Option<std::string::String>,
    pub expiration_time: Option<String>,
    pub error_text: Option<String>,
}

/// One entry of `GET /v1/position/find/{accountId}`. Other fields are ignored.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default)]
    pub symbol: String,
    pub net_pos: i64,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_place_order_wire_format() {
        let order = PlaceOrder::market(1427850, Action::Buy, "MESM5", 4);
        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            json!({
                "accountId": 1427850,
                "action": "Buy",
                "symbol": "MESM5",
                "orderQty": 4,
                "orderType": "Market",
                "isAutomated": true
            })
        );
    }

    #[test]
    fn test_offsetting_action() {
        assert_eq!(Action::offsetting(3), Some(Action::Sell));
        assert_eq!(Action::offsetting(-3), Some(Action::Buy));
        assert_eq!(Action::offsetting(0), None);
    }

    #[test]
    fn test_position_ignores_extra_fields() {
        let positions: Vec<Position> = serde_json::from_value(json!([
            {"id": 7, "accountId": 1, "contractId": 99, "symbol": "MESM5", "netPos": -2, "bought": 0},
            {"netPos": 1}
        ]))
        .unwrap();

        assert_eq!(positions[0].symbol.as_str(), "MESM5");
        assert_eq!(positions[0].net_pos, -2);
        assert!(positions[1].symbol.is_empty());
    }
}
