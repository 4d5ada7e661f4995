//! Task database operations

use chrono::{DateTime, NaiveDate, Utc};
use hearth_common::db::Task;
use hearth_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

const TASK_COLUMNS: &str =
    "id, title, due_date, assigned_to, completed, completed_at, created_by, created_at, updated_at";

/// Editable task fields
#[derive(Debug, Clone)]
pub struct TaskFields {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: String,
}

/// Incomplete task due on a given day, with its creator's display name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DueTask {
    pub id: String,
    pub title: String,
    pub due_date: NaiveDate,
    pub creator_name: Option<String>,
}

/// Open tasks first, then by due date (undated last)
pub async fn list_tasks(pool: &SqlitePool) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks
         ORDER BY completed ASC, due_date IS NULL, due_date ASC, created_at DESC",
        TASK_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(tasks)
}

pub async fn get_task(pool: &SqlitePool, id: &str) -> Result<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS);
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(task)
}

pub async fn insert_task(pool: &SqlitePool, fields: &TaskFields, created_by: &str) -> Result<Task> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO tasks
            (id, title, due_date, assigned_to, completed, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, 0, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&fields.title)
    .bind(fields.due_date.map(|d| d.to_string()))
    .bind(&fields.assigned_to)
    .bind(created_by)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_task(pool, &id)
        .await?
        .ok_or_else(|| hearth_common::Error::Internal("Inserted task vanished".to_string()))
}

/// Update editable fields in one statement
///
/// `completed` (when given) also sets or clears `completed_at`; a task that was
/// already complete keeps its original completion time.
pub async fn update_task(
    pool: &SqlitePool,
    id: &str,
    fields: &TaskFields,
    completed: Option<bool>,
) -> Result<Option<Task>> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?1,
            due_date = ?2,
            assigned_to = ?3,
            updated_at = ?4,
            completed = COALESCE(?5, completed),
            completed_at = CASE
                WHEN ?5 IS NULL THEN completed_at
                WHEN ?5 THEN COALESCE(completed_at, ?4)
                ELSE NULL
            END
        WHERE id = ?6
        "#,
    )
    .bind(&fields.title)
    .bind(fields.due_date.map(|d| d.to_string()))
    .bind(&fields.assigned_to)
    .bind(&now)
    .bind(completed)
    .bind(id)
    .execute(pool)
    .await?;

    get_task(pool, id).await
}

pub async fn delete_task(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Incomplete tasks due exactly on `date`
pub async fn open_tasks_due_on(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<DueTask>> {
    let tasks = sqlx::query_as::<_, DueTask>(
        r#"
        SELECT t.id, t.title, t.due_date, p.name AS creator_name
        FROM tasks t
        LEFT JOIN profiles p ON p.id = t.created_by
        WHERE t.due_date = ? AND t.completed = 0
        ORDER BY t.created_at ASC
        "#,
    )
    .bind(date.to_string())
    .fetch_all(pool)
    .await?;
    Ok(tasks)
}
