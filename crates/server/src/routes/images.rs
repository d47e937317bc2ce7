use crate::error::ServerResult;
use crate::middleware::UserId;
use crate::routes::ImageView;
use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use snaptag::{ImagePayload, UploadRequest};
use std::sync::Arc;

/// Upload body. `image` is base64, optionally as a data URL.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
    pub image: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
    pub url: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageSearchBody {
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct ImageSearchResponse {
    pub thumbnail_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LookupBody {
    pub thumbnail_url: String,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub image_url: String,
    pub tags: Vec<String>,
}

/// Store an upload, tag it, and return the created record.
pub async fn upload_image(
    State(state): State<Arc<ServerState>>,
    UserId(user_id): UserId,
    Json(body): Json<UploadBody>,
) -> ServerResult<impl IntoResponse> {
    let mut request = UploadRequest::new(user_id, ImagePayload::Base64(body.image));
    request.file_name = body.file_name;
    let record = state.run(move |p| p.ingest_upload(request)).await?;
    Ok((StatusCode::CREATED, Json(ImageView::from(record))))
}

/// Delete records and blobs by thumbnail reference, in order.
pub async fn delete_images(
    State(state): State<Arc<ServerState>>,
    UserId(user_id): UserId,
    Json(body): Json<DeleteBody>,
) -> ServerResult<impl IntoResponse> {
    let deleted = state
        .run(move |p| p.delete_images(&user_id, &body.url))
        .await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// Records carrying any object detected in the posted image.
pub async fn search_by_image(
    State(state): State<Arc<ServerState>>,
    UserId(user_id): UserId,
    Json(body): Json<ImageSearchBody>,
) -> ServerResult<impl IntoResponse> {
    let hits = state
        .run(move |p| p.search_by_image_base64(&user_id, &body.image))
        .await?;
    Ok(Json(ImageSearchResponse {
        thumbnail_urls: hits.into_iter().map(|hit| hit.thumbnail_url).collect(),
    }))
}

/// Original image for a thumbnail reference.
pub async fn lookup_thumbnail(
    State(state): State<Arc<ServerState>>,
    UserId(user_id): UserId,
    Json(body): Json<LookupBody>,
) -> ServerResult<impl IntoResponse> {
    let record = state
        .run(move |p| p.lookup_thumbnail(&user_id, &body.thumbnail_url))
        .await?;
    Ok(Json(LookupResponse {
        tags: record.tags.to_tokens(),
        image_url: record.image_url,
    }))
}
