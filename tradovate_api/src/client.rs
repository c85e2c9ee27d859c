use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use reqwest::{Client, Response};

use crate::{
    ApiConfig,
    error::ApiError,
    types::{AccessTokenRequest, AccessTokenResponse, PlaceOrder, PlaceOrderResponse, Position},
};

/// Bearer token obtained at login. Never refreshed; once the broker stops accepting it, calls
/// made with it fail.
#[derive(Clone)]
pub struct Session {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: Option<u64>,
}

/// Thin typed wrapper over the three REST endpoints the bot needs.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /auth/accesstokenrequest`. Every failure, including a 200 carrying `errorText`,
    /// comes back as [`ApiError::Authentication`].
    pub async fn authenticate(&self, config: &ApiConfig) -> Result<Session, ApiError> {
        self.request_token(config).await.map_err(|e| match e {
            e @ ApiError::Authentication(_) => e,
            other => ApiError::Authentication(format!("{:#}", anyhow::Error::from(other))),
        })
    }

    async fn request_token(&self, config: &ApiConfig) -> Result<Session, ApiError> {
        let request = AccessTokenRequest {
            name: &config.username,
            password: &config.password,
            app_id: &config.app_id,
            app_version: &config.app_version,
            cid: config.client_id,
            sec: &config.client_secret,
        };
        let url = format!("{}/auth/accesstokenrequest", self.base_url);
        tracing::debug!("POST {url}");

        let response = self.http.post(&url).json(&request).send().await?;
        let body = success_body(response).await?;
        let token: AccessTokenResponse = serde_json::from_str(&body)?;

        let Some(access_token) = token.access_token else {
            let reason = token
                .error_text
                .map(|text| text.to_string())
                .unwrap_or_else(|| "response carries no accessToken".to_string());
            return Err(ApiError::Authentication(reason));
        };
        let expires_at = token
            .expiration_time
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        Ok(Session::new(access_token, expires_at))
    }

    /// `POST /v1/order/placeorder`. A 2xx answer that names a failure reason and no order id is
    /// reported as [`ApiError::Rejected`].
    pub async fn place_order(
        &self,
        session: &Session,
        order: &PlaceOrder,
    ) -> Result<OrderAck, ApiError> {
        let url = format!("{}/v1/order/placeorder", self.base_url);
        tracing::debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .bearer_auth(session.token())
            .json(order)
            .send()
            .await?;
        let body = success_body(response).await?;
        if body.trim().is_empty() {
            return Ok(OrderAck { order_id: None });
        }

        let result: PlaceOrderResponse = serde_json::from_str(&body)?;
        if result.order_id.is_none() {
            if let Some(reason) = result.failure_text.or(result.failure_reason) {
                return Err(ApiError::Rejected {
                    reason: reason.to_string(),
                });
            }
        }
        Ok(OrderAck {
            order_id: result.order_id,
        })
    }

    /// `GET /v1/position/find/{accountId}`.
    pub async fn find_positions(
        &self,
        session: &Session,
        account_id: u64,
    ) -> Result<Vec<Position>, ApiError> {
        let url = format!("{}/v1/position/find/{account_id}", self.base_url);
        tracing::debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .bearer_auth(session.token())
            .send()
            .await?;
        let body = success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn success_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status { status, body });
    }
    Ok(body)
}
