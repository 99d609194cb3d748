use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid chat request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Request failed after {attempts} attempts, last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Empty response from server")]
    EmptyResponse,

    #[error("Failed to process response: {0}")]
    StreamError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ProxyError {
    /// HTTP status used when this error terminates a request
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
