//! Photo memories

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use hearth_common::db::Memory;

use crate::auth::CurrentUser;
use crate::db::memories;
use crate::error::{ApiError, ApiResult};
use crate::services::{PhotoBucket, PhotoStore};
use crate::AppState;

use super::{deleted, ensure_creator, ensure_own_photo, non_blank, read_image_upload};

const MAX_MEMORY_PHOTO_MB: usize = 5;

#[derive(Debug, Deserialize)]
pub struct CreateMemoryRequest {
    pub photo_url: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemoryRequest {
    pub note: Option<String>,
}

async fn find_memory(state: &AppState, id: &str) -> ApiResult<Memory> {
    memories::get_memory(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Memory not found".to_string()))
}

/// GET /api/memories
pub async fn list_memories(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let memories = memories::list_memories(&state.db).await?;
    Ok(Json(json!({ "memories": memories })))
}

/// POST /api/memories
pub async fn create_memory(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateMemoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let photo_url = non_blank(req.photo_url)
        .ok_or_else(|| ApiError::BadRequest("Photo URL is required".to_string()))?;
    ensure_own_photo(&photo_url, PhotoBucket::Memories, &user.id)?;
    let note = non_blank(req.note);

    let memory = memories::insert_memory(&state.db, &photo_url, note.as_deref(), &user.id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "memory": memory }))))
}

/// POST /api/memories/upload
///
/// Stores the image and returns `{url, path}`; the memory row is created separately.
pub async fn upload_memory_photo(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let upload = read_image_upload(&mut multipart, MAX_MEMORY_PHOTO_MB).await?;
    let stored = state
        .photos
        .save(
            PhotoBucket::Memories,
            &user.id,
            upload.file_name.as_deref(),
            &upload.content_type,
            &upload.bytes,
        )
        .await?;

    info!(path = %stored.path, bytes = upload.bytes.len(), "Memory photo uploaded");
    Ok(Json(json!({ "url": stored.url, "path": stored.path })))
}

/// PUT /api/memories/:id
pub async fn update_memory(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMemoryRequest>,
) -> ApiResult<Json<Value>> {
    let existing = find_memory(&state, &id).await?;
    ensure_creator(&existing.created_by, &user.id, "edit memories")?;

    let note = non_blank(req.note);
    let memory = memories::update_memory_note(&state.db, &id, note.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Memory not found".to_string()))?;
    Ok(Json(json!({ "memory": memory })))
}

/// DELETE /api/memories/:id
///
/// Removes the row, then the stored photo file when it sits in the creator's folder.
pub async fn delete_memory(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let existing = find_memory(&state, &id).await?;
    ensure_creator(&existing.created_by, &user.id, "delete memories")?;

    memories::delete_memory(&state.db, &id).await?;
    if PhotoStore::is_local_url(&existing.photo_url) {
        state
            .photos
            .remove_owned(&existing.photo_url, PhotoBucket::Memories, &existing.created_by)
            .await;
    }

    info!(memory_id = %id, "Memory deleted");
    Ok(Json(deleted()))
}

pub fn memory_routes() -> Router<AppState> {
    Router::new()
        .route("/api/memories", get(list_memories).post(create_memory))
        .route("/api/memories/upload", post(upload_memory_photo))
        .route(
            "/api/memories/:id",
            axum::routing::put(update_memory).delete(delete_memory),
        )
}
