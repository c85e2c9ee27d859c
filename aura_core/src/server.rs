use std::{any::Any, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    Broker,
    dispatch::{DispatchError, Dispatcher, Outcome},
    signal::Signal,
};

/// Signals are a few words; anything larger is refused with 413.
pub const MAX_SIGNAL_BYTES: usize = 64 * 1024;

#[derive(Serialize)]
struct Ack {
    status: &'static str,
    signal: Signal,
    #[serde(flatten)]
    outcome: Outcome,
}

/// Serves the webhook. Only constructible from a dispatcher, i.e. after login succeeded.
pub struct WebhookServer<B> {
    dispatcher: Arc<Dispatcher<B>>,
}

impl<B: Broker + 'static> WebhookServer<B> {
    pub fn new(dispatcher: Dispatcher<B>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/webhook", post(webhook::<B>))
            .route("/health", get(health))
            .layer(DefaultBodyLimit::max(MAX_SIGNAL_BYTES))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TraceLayer::new_for_http())
            .with_state(self.dispatcher.clone())
    }

    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Webhook listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

async fn webhook<B: Broker + 'static>(
    State(dispatcher): State<Arc<Dispatcher<B>>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!("Rejected webhook body: {}", rejection.body_text());
            return error_response(rejection.status(), rejection.body_text());
        }
    };
    match dispatcher.dispatch(&body).await {
        Ok((signal, outcome)) => Json(Ack {
            status: "OK",
            signal,
            outcome,
        })
        .into_response(),
        Err(DispatchError::UnknownSignal) => {
            error_response(StatusCode::BAD_REQUEST, "Unknown signal".to_string())
        }
        Err(DispatchError::Internal(e)) => {
            tracing::error!("Webhook failed: {e:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "OK"}))
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };
    tracing::error!("Webhook handler panicked: {message}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}
