//! Calendar events
//!
//! Any signed-in member may create; only the creator may edit or delete.

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

use hearth_common::dates::{parse_date, parse_time};
use hearth_common::db::{Event, EventCategory};

use crate::auth::CurrentUser;
use crate::db::events::{self, EventFields};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::{deleted, ensure_creator, non_blank};

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
}

impl EventRequest {
    fn into_fields(self) -> ApiResult<EventFields> {
        let (Some(title), Some(date), Some(category)) =
            (non_blank(self.title), non_blank(self.date), non_blank(self.category))
        else {
            return Err(ApiError::BadRequest(
                "Title, date, and category are required".to_string(),
            ));
        };

        Ok(EventFields {
            title,
            date: parse_date(&date)?,
            time: non_blank(self.time).map(|t| parse_time(&t)).transpose()?,
            notes: non_blank(self.notes),
            category: EventCategory::from_str(&category)?.to_string(),
        })
    }
}

async fn find_event(state: &AppState, id: &str) -> ApiResult<Event> {
    events::get_event(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// GET /api/events
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let events = events::list_events(&state.db).await?;
    Ok(Json(json!({ "events": events })))
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<EventRequest>,
) -> ApiResult<impl IntoResponse> {
    let fields = req.into_fields()?;
    let event = events::insert_event(&state.db, &fields, &user.id).await?;

    info!(event_id = %event.id, date = %event.date, "Event created");
    Ok((StatusCode::CREATED, Json(json!({ "event": event }))))
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let event = find_event(&state, &id).await?;
    Ok(Json(json!({ "event": event })))
}

/// PUT /api/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<EventRequest>,
) -> ApiResult<Json<Value>> {
    let fields = req.into_fields()?;
    let existing = find_event(&state, &id).await?;
    ensure_creator(&existing.created_by, &user.id, "edit events")?;

    let event = events::update_event(&state.db, &id, &fields)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;
    Ok(Json(json!({ "event": event })))
}

/// DELETE /api/events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let existing = find_event(&state, &id).await?;
    ensure_creator(&existing.created_by, &user.id, "delete events")?;

    events::delete_event(&state.db, &id).await?;
    info!(event_id = %id, "Event deleted");
    Ok(Json(deleted()))
}

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_events).post(create_event))
        .route(
            "/api/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
}
