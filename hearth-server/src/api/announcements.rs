//! Family announcements

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use hearth_common::db::Announcement;

use crate::auth::CurrentUser;
use crate::db::announcements;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::{deleted, ensure_creator, non_blank};

#[derive(Debug, Deserialize)]
pub struct AnnouncementRequest {
    pub message: Option<String>,
    pub expires_at: Option<String>,
}

impl AnnouncementRequest {
    fn parse(self) -> ApiResult<(String, Option<DateTime<Utc>>)> {
        let message = non_blank(self.message)
            .ok_or_else(|| ApiError::BadRequest("Message is required".to_string()))?;

        let expires_at = non_blank(self.expires_at)
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|_| {
                        ApiError::BadRequest(format!(
                            "Invalid expires_at '{}', expected an RFC 3339 timestamp",
                            raw
                        ))
                    })
            })
            .transpose()?;

        Ok((message, expires_at))
    }
}

async fn find_announcement(state: &AppState, id: &str) -> ApiResult<Announcement> {
    announcements::get_announcement(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Announcement not found".to_string()))
}

/// GET /api/announcements
///
/// Expired announcements are left out.
pub async fn list_announcements(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let announcements = announcements::list_active_announcements(&state.db, Utc::now()).await?;
    Ok(Json(json!({ "announcements": announcements })))
}

/// POST /api/announcements
pub async fn create_announcement(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<AnnouncementRequest>,
) -> ApiResult<impl IntoResponse> {
    let (message, expires_at) = req.parse()?;
    let announcement =
        announcements::insert_announcement(&state.db, &message, expires_at, &user.id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "announcement": announcement }))))
}

/// PUT /api/announcements/:id
pub async fn update_announcement(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<AnnouncementRequest>,
) -> ApiResult<Json<Value>> {
    let (message, expires_at) = req.parse()?;
    let existing = find_announcement(&state, &id).await?;
    ensure_creator(&existing.created_by, &user.id, "edit announcements")?;

    let announcement = announcements::update_announcement(&state.db, &id, &message, expires_at)
        .await?
        .ok_or_else(|| ApiError::NotFound("Announcement not found".to_string()))?;
    Ok(Json(json!({ "announcement": announcement })))
}

/// DELETE /api/announcements/:id
pub async fn delete_announcement(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let existing = find_announcement(&state, &id).await?;
    ensure_creator(&existing.created_by, &user.id, "delete announcements")?;

    announcements::delete_announcement(&state.db, &id).await?;
    Ok(Json(deleted()))
}

pub fn announcement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route(
            "/api/announcements/:id",
            axum::routing::put(update_announcement).delete(delete_announcement),
        )
}
