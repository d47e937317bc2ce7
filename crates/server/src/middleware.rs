use crate::error::ServerError;
use crate::state::ServerState;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use std::time::Instant;

pub const API_KEY_HEADER: &str = "x-api-key";
/// Set by the identity layer in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `X-API-Key`, or else a bearer token.
fn api_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER) {
        return key.to_str().ok();
    }
    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
    Some(auth.strip_prefix("Bearer ").unwrap_or(auth))
}

/// Rejects requests without a known key, then spends one unit of that key's
/// rate limit.
pub async fn api_key_auth(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let key = api_key(request.headers()).ok_or_else(|| {
        ServerError::Authentication(
            "API key required in 'X-API-Key' or 'Authorization: Bearer <key>'".to_string(),
        )
    })?;
    if !state.is_valid_api_key(key) {
        return Err(ServerError::Authentication("Invalid API key".to_string()));
    }
    if !state.check_rate_limit(key) {
        return Err(ServerError::RateLimitExceeded);
    }
    Ok(next.run(request).await)
}

/// The calling user, from the `X-User-Id` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ServerError::Authentication("missing 'X-User-Id' header".to_string())
            })?;
        Ok(UserId(user.to_string()))
    }
}

/// Correlation id for one request, echoed back in `X-Request-Id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Reuse the caller's `X-Request-Id` or mint a UUID.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(request).await;
    let elapsed = start.elapsed();
    let status = response.status();
    crate::telemetry::record_request(method.as_str(), status.as_u16(), elapsed);

    tracing::info!(
        %method,
        %path,
        status = status.as_u16(),
        elapsed_micros = elapsed.as_micros(),
        %request_id,
        "request"
    );
    response
}
