//! Handlers, one module per resource. All `/api/v1` handlers read the
//! caller from [`UserId`](crate::middleware::UserId).

pub mod health;
pub mod images;
pub mod subscriptions;
pub mod tags;

use crate::error::ServerError;
use axum::Json;
use serde::Serialize;
use snaptag::ImageRecord;

/// A stored record as returned to clients.
#[derive(Debug, Serialize)]
pub struct ImageView {
    pub thumbnail_url: String,
    pub image_url: String,
    pub tags: Vec<String>,
}

impl From<ImageRecord> for ImageView {
    fn from(record: ImageRecord) -> Self {
        Self {
            tags: record.tags.to_tokens(),
            thumbnail_url: record.thumbnail_url,
            image_url: record.image_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub routes: &'static [&'static str],
}

const ROUTES: &[&str] = &[
    "POST /api/v1/images",
    "POST /api/v1/images/delete",
    "POST /api/v1/images/search",
    "POST /api/v1/thumbnails/lookup",
    "POST /api/v1/tags",
    "POST /api/v1/tags/search",
    "POST /api/v1/subscriptions",
    "GET /api/v1/subscriptions",
    "GET /health",
    "GET /ready",
    "GET /metrics",
];

pub async fn api_info() -> Json<ApiInfo> {
    Json(ApiInfo {
        name: "snaptag",
        version: env!("CARGO_PKG_VERSION"),
        routes: ROUTES,
    })
}

/// Fallback for unknown paths.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
