use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("request failed")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("order rejected: {reason}")]
    Rejected { reason: String },
    #[error("malformed response")]
    Decode(#[from] serde_json::Error),
}
