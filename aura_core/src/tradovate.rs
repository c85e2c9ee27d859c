use std::time::Duration;

use anyhow::{Context, Result};
use tradovate_api::{ApiConfig, ApiError, OrderAck, PlaceOrder, Position, RestClient, Session};

use crate::Broker;

/// Tradovate REST client bound to the session obtained at startup.
pub struct TradovateBroker {
    client: RestClient,
    session: Session,
}

impl TradovateBroker {
    /// Logs in, retrying up to `retries` extra times. There is no broker without a session.
    pub async fn connect(config: &ApiConfig, retries: u32, delay: Duration) -> Result<Self> {
        let client = RestClient::new(config)?;
        let session = {
            let client = &client;
            utils::retry(
                move || async move { Ok(client.authenticate(config).await?) },
                retries,
                delay,
            )
            .await
            .context("Could not authenticate with Tradovate")?
        };

        tracing::info!("Authenticated with Tradovate ({:?})", config.env);
        if let Some(expires_at) = session.expires_at() {
            tracing::info!("Access token expires at {expires_at}");
        }

        Ok(Self { client, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl Broker for TradovateBroker {
    async fn place_order(&self, order: &PlaceOrder) -> Result<OrderAck, ApiError> {
        tracing::debug!("Placing {order:?}");
        self.client.place_order(&self.session, order).await
    }

    async fn find_positions(&self, account_id: u64) -> Result<Vec<Position>, ApiError> {
        self.client.find_positions(&self.session, account_id).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use tradovate_api::Environment;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> ApiConfig {
        ApiConfig {
            client_id: 42,
            client_secret: "secret".into(),
            username: "trader".into(),
            password: "pw".into(),
            env: Environment::Demo,
            app_id: "AuraBot".into(),
            app_version: "1.0".into(),
            timeout_secs: 5,
            base_url: Some(base_url),
        }
    }

    #[tokio::test]
    async fn test_connect_fails_fast() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/accesstokenrequest"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&mock_server)
            .await;

        let res = TradovateBroker::connect(&config(mock_server.uri()), 0, Duration::ZERO).await;

        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_connect_retries_then_gives_up() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/accesstokenrequest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errorText": "Too many requests"
            })))
            .expect(3)
            .mount(&mock_server)
            .await;

        let res =
            TradovateBroker::connect(&config(mock_server.uri()), 2, Duration::from_millis(1)).await;

        let err = res.err().unwrap();
        assert!(format!("{err:#}").contains("Too many requests"));
    }

    #[tokio::test]
    async fn test_connect_keeps_session() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/accesstokenrequest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "tok-9"
            })))
            .mount(&mock_server)
            .await;

        let broker = TradovateBroker::connect(&config(mock_server.uri()), 0, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(broker.session().token(), "tok-9");
    }
}
