//! To-do tasks

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

use hearth_common::dates::parse_date;
use hearth_common::db::{Assignee, Task};

use crate::auth::CurrentUser;
use crate::db::tasks::{self, TaskFields};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::{deleted, ensure_creator, non_blank};

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub title: Option<String>,
    pub due_date: Option<String>,
    pub assigned_to: Option<String>,
    pub completed: Option<bool>,
}

impl TaskRequest {
    /// Editable fields; a missing assignee means everyone
    fn fields(&self) -> ApiResult<TaskFields> {
        let title = non_blank(self.title.clone())
            .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

        let assigned_to = match non_blank(self.assigned_to.clone()) {
            Some(a) => Assignee::from_str(&a)?,
            None => Assignee::All,
        };

        Ok(TaskFields {
            title,
            due_date: non_blank(self.due_date.clone())
                .map(|d| parse_date(&d))
                .transpose()?,
            assigned_to: assigned_to.to_string(),
        })
    }
}

async fn find_task(state: &AppState, id: &str) -> ApiResult<Task> {
    tasks::get_task(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// GET /api/tasks
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let tasks = tasks::list_tasks(&state.db).await?;
    Ok(Json(json!({ "tasks": tasks })))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<TaskRequest>,
) -> ApiResult<impl IntoResponse> {
    let fields = req.fields()?;
    let mut task = tasks::insert_task(&state.db, &fields, &user.id).await?;

    if req.completed == Some(true) {
        task = tasks::update_task(&state.db, &task.id, &fields, Some(true))
            .await?
            .unwrap_or(task);
    }

    Ok((StatusCode::CREATED, Json(json!({ "task": task }))))
}

/// PUT /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<TaskRequest>,
) -> ApiResult<Json<Value>> {
    let fields = req.fields()?;
    let existing = find_task(&state, &id).await?;
    ensure_creator(&existing.created_by, &user.id, "edit tasks")?;

    let task = tasks::update_task(&state.db, &id, &fields, req.completed)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    Ok(Json(json!({ "task": task })))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let existing = find_task(&state, &id).await?;
    ensure_creator(&existing.created_by, &user.id, "delete tasks")?;

    tasks::delete_task(&state.db, &id).await?;
    Ok(Json(deleted()))
}

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/:id", axum::routing::put(update_task).delete(delete_task))
}
