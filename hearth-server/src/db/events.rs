//! Event database operations

use chrono::{NaiveDate, Utc};
use hearth_common::db::Event;
use hearth_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

const EVENT_COLUMNS: &str =
    "id, title, date, time, notes, category, created_by, created_at, updated_at";

/// Editable event fields
#[derive(Debug, Clone)]
pub struct EventFields {
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub notes: Option<String>,
    pub category: String,
}

/// Event due on a given day, with its creator's display name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DueEvent {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub creator_name: Option<String>,
}

/// All events by date, then time; untimed events last within a day
pub async fn list_events(pool: &SqlitePool) -> Result<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events ORDER BY date ASC, time IS NULL, time ASC",
        EVENT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(events)
}

pub async fn get_event(pool: &SqlitePool, id: &str) -> Result<Option<Event>> {
    let event = sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events WHERE id = ?",
        EVENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(event)
}

pub async fn insert_event(
    pool: &SqlitePool,
    fields: &EventFields,
    created_by: &str,
) -> Result<Event> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO events
            (id, title, date, time, notes, category, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&fields.title)
    .bind(fields.date.to_string())
    .bind(&fields.time)
    .bind(&fields.notes)
    .bind(&fields.category)
    .bind(created_by)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_event(pool, &id)
        .await?
        .ok_or_else(|| hearth_common::Error::Internal("Inserted event vanished".to_string()))
}

pub async fn update_event(
    pool: &SqlitePool,
    id: &str,
    fields: &EventFields,
) -> Result<Option<Event>> {
    sqlx::query(
        r#"
        UPDATE events
        SET title = ?, date = ?, time = ?, notes = ?, category = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.title)
    .bind(fields.date.to_string())
    .bind(&fields.time)
    .bind(&fields.notes)
    .bind(&fields.category)
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    get_event(pool, id).await
}

/// Returns false when no such event existed
pub async fn delete_event(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Events dated exactly `date`
pub async fn events_on(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<DueEvent>> {
    let events = sqlx::query_as::<_, DueEvent>(
        r#"
        SELECT e.id, e.title, e.date, e.time, p.name AS creator_name
        FROM events e
        LEFT JOIN profiles p ON p.id = e.created_by
        WHERE e.date = ?
        ORDER BY e.time IS NULL, e.time ASC, e.created_at ASC
        "#,
    )
    .bind(date.to_string())
    .fetch_all(pool)
    .await?;
    Ok(events)
}
