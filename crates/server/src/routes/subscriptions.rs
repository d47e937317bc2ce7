use crate::error::ServerResult;
use crate::middleware::UserId;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SubscribeBody {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub subscribed_tags: Vec<String>,
}

/// Add tags to the caller's subscriptions; returns the full set.
pub async fn subscribe(
    State(state): State<Arc<ServerState>>,
    UserId(user_id): UserId,
    Json(body): Json<SubscribeBody>,
) -> ServerResult<impl IntoResponse> {
    let subscriptions = state
        .run(move |p| p.subscribe(&user_id, &body.tags))
        .await?;
    Ok(Json(SubscribeResponse {
        subscribed_tags: subscriptions.iter().map(str::to_string).collect(),
    }))
}

/// The caller's current subscriptions.
pub async fn list_subscriptions(
    State(state): State<Arc<ServerState>>,
    UserId(user_id): UserId,
) -> ServerResult<impl IntoResponse> {
    let subscriptions = state.run(move |p| p.subscriptions(&user_id)).await?;
    Ok(Json(SubscribeResponse {
        subscribed_tags: subscriptions.iter().map(str::to_string).collect(),
    }))
}
