//! Family notes
//!
//! Everyone reads; only parents write.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::info;

use hearth_common::db::{Note, NoteCategory, Profile};

use crate::auth::CurrentUser;
use crate::db::notes::{self, NoteFields};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::{deleted, non_blank};

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub is_readonly_for_kids: bool,
}

impl NoteRequest {
    fn into_fields(self) -> ApiResult<NoteFields> {
        let (Some(title), Some(content), Some(category)) =
            (non_blank(self.title), non_blank(self.content), non_blank(self.category))
        else {
            return Err(ApiError::BadRequest(
                "Title, content, and category are required".to_string(),
            ));
        };

        Ok(NoteFields {
            title,
            content,
            category: NoteCategory::from_str(&category)?.to_string(),
            is_readonly_for_kids: self.is_readonly_for_kids,
        })
    }
}

fn ensure_parent(user: &Profile, action: &str) -> ApiResult<()> {
    if user.is_parent() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("Only parents can {} notes", action)))
    }
}

async fn find_note(state: &AppState, id: &str) -> ApiResult<Note> {
    notes::get_note(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))
}

/// GET /api/notes
pub async fn list_notes(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let notes = notes::list_notes(&state.db).await?;
    Ok(Json(json!({ "notes": notes })))
}

/// POST /api/notes
pub async fn create_note(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<NoteRequest>,
) -> ApiResult<impl IntoResponse> {
    let fields = req.into_fields()?;
    ensure_parent(&user, "create")?;

    let note = notes::insert_note(&state.db, &fields, &user.id).await?;
    info!(note_id = %note.id, category = %note.category, "Note created");
    Ok((StatusCode::CREATED, Json(json!({ "note": note }))))
}

/// PUT /api/notes/:id
pub async fn update_note(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<NoteRequest>,
) -> ApiResult<Json<Value>> {
    let fields = req.into_fields()?;
    let existing = find_note(&state, &id).await?;

    if existing.is_readonly_for_kids && !user.is_parent() {
        return Err(ApiError::Forbidden(
            "This note is read-only for kids".to_string(),
        ));
    }
    ensure_parent(&user, "edit")?;

    let note = notes::update_note(&state.db, &id, &fields)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;
    Ok(Json(json!({ "note": note })))
}

/// DELETE /api/notes/:id
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    find_note(&state, &id).await?;
    ensure_parent(&user, "delete")?;

    notes::delete_note(&state.db, &id).await?;
    Ok(Json(deleted()))
}

pub fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/:id", axum::routing::put(update_note).delete(delete_note))
}
