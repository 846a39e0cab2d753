use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrightlyError {
    #[error("Remote store unreachable: {0}")]
    SyncUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("API rate limit exceeded, retry after {retry_after:?} seconds")]
    ApiRateLimit { retry_after: Option<u64> },

    #[error("API authentication error: {0}")]
    ApiAuth(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for BrightlyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            BrightlyError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            BrightlyError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BrightlyError::SyncUnavailable(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            BrightlyError::Embedding(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            BrightlyError::Http(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            BrightlyError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            BrightlyError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            BrightlyError::Persistence(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            BrightlyError::ApiRateLimit { .. } => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            BrightlyError::ApiAuth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            BrightlyError::Llm(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            BrightlyError::LlmUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            BrightlyError::LlmRateLimit { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("LLM rate limit exceeded, retry after {retry_after:?} seconds"),
            ),
            BrightlyError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, BrightlyError>;
