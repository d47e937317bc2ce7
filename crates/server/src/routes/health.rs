use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;

static STARTED_AT: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
}

/// What `/ready` found when it touched the pipeline.
#[derive(Debug, Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub detector: String,
    pub records: usize,
    pub uptime_seconds: i64,
}

fn uptime_seconds() -> i64 {
    (Utc::now() - *STARTED_AT).num_seconds().max(0)
}

pub async fn health_check() -> Json<Liveness> {
    Json(Liveness {
        status: "healthy",
        started_at: *STARTED_AT,
        uptime_seconds: uptime_seconds(),
    })
}

/// Counts stored records, so an unreadable index fails the check.
pub async fn readiness_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<Json<Readiness>> {
    let records = state.run(|p| Ok(p.index().image_count()?)).await?;
    Ok(Json(Readiness {
        status: "ready",
        detector: state.pipeline.detector().network_name().to_string(),
        records,
        uptime_seconds: uptime_seconds(),
    }))
}

/// Prometheus text exposition; empty when the recorder is off.
pub async fn metrics(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
