use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use snaptag::{ConfigLoadError, DetectError, PipelineError, TagError};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Pipeline(err) => pipeline_status(err),
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Authentication(_) => "AUTH_FAILED",
            ServerError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Pipeline(err) => pipeline_code(err),
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    /// Partial-progress information for batch failures.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServerError::Pipeline(PipelineError::Batch {
                position,
                thumbnail,
                applied,
                ..
            }) => Some(json!({
                "position": position,
                "thumbnail_url": thumbnail,
                "applied": applied,
            })),
            _ => None,
        }
    }
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err.root_cause() {
        PipelineError::Tag(TagError::MalformedTag { .. }) => StatusCode::BAD_REQUEST,
        PipelineError::Tag(TagError::TagNotFound { .. }) => StatusCode::NOT_FOUND,
        PipelineError::Tag(TagError::EmptyTagSet { .. }) => StatusCode::CONFLICT,
        PipelineError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
        PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        PipelineError::Ingest(err) => StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        PipelineError::Detect(DetectError::Image(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn pipeline_code(err: &PipelineError) -> &'static str {
    match err.root_cause() {
        PipelineError::Tag(TagError::MalformedTag { .. }) => "MALFORMED_TAG",
        PipelineError::Tag(TagError::TagNotFound { .. }) => "TAG_NOT_FOUND",
        PipelineError::Tag(TagError::EmptyTagSet { .. }) => "EMPTY_TAG_SET",
        PipelineError::Tag(_) => "TAG_ERROR",
        PipelineError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
        PipelineError::InvalidRequest(_) => "INVALID_REQUEST",
        PipelineError::Ingest(_) => "INGEST_ERROR",
        PipelineError::Detect(_) => "DETECT_ERROR",
        PipelineError::Index(_) => "INDEX_ERROR",
        PipelineError::Batch { .. } => "PIPELINE_ERROR",
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<ConfigLoadError> for ServerError {
    fn from(err: ConfigLoadError) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("worker task failed: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
