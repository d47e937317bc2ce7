use crate::error::ServerResult;
use crate::middleware::UserId;
use crate::routes::ImageView;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use snaptag::{MatchHit, TagQuery};
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct UpdateTagsResponse {
    pub updated: Vec<ImageView>,
}

#[derive(Debug, Deserialize)]
pub struct TagSearchBody {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TagSearchResponse {
    pub links: Vec<MatchHit>,
}

/// Apply `{ "type": 0|1, "tags": [...], "url": [...] }` to each listed thumbnail.
///
/// The first failing thumbnail stops the batch; the error body's `details`
/// lists thumbnails already updated.
pub async fn update_tags(
    State(state): State<Arc<ServerState>>,
    UserId(user_id): UserId,
    Json(query): Json<TagQuery>,
) -> ServerResult<impl IntoResponse> {
    let updated = state
        .run(move |p| p.update_tags(&user_id, &query))
        .await?;
    Ok(Json(UpdateTagsResponse {
        updated: updated.into_iter().map(ImageView::from).collect(),
    }))
}

/// Records matching any of `"name"` / `"name, count"`.
pub async fn search_by_tags(
    State(state): State<Arc<ServerState>>,
    UserId(user_id): UserId,
    Json(body): Json<TagSearchBody>,
) -> ServerResult<impl IntoResponse> {
    let links = state
        .run(move |p| p.search_by_tags(&user_id, &body.tags))
        .await?;
    Ok(Json(TagSearchResponse { links }))
}
