//! Note database operations

use chrono::Utc;
use hearth_common::db::Note;
use hearth_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

const NOTE_COLUMNS: &str =
    "id, title, content, category, is_readonly_for_kids, created_by, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NoteFields {
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_readonly_for_kids: bool,
}

/// Grouped by category, newest first within a category
pub async fn list_notes(pool: &SqlitePool) -> Result<Vec<Note>> {
    let notes = sqlx::query_as::<_, Note>(&format!(
        "SELECT {} FROM notes ORDER BY category ASC, created_at DESC",
        NOTE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(notes)
}

pub async fn get_note(pool: &SqlitePool, id: &str) -> Result<Option<Note>> {
    let sql = format!("SELECT {} FROM notes WHERE id = ?", NOTE_COLUMNS);
    let note = sqlx::query_as::<_, Note>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(note)
}

pub async fn insert_note(pool: &SqlitePool, fields: &NoteFields, created_by: &str) -> Result<Note> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO notes
            (id, title, content, category, is_readonly_for_kids, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&fields.title)
    .bind(&fields.content)
    .bind(&fields.category)
    .bind(fields.is_readonly_for_kids)
    .bind(created_by)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_note(pool, &id)
        .await?
        .ok_or_else(|| hearth_common::Error::Internal("Inserted note vanished".to_string()))
}

pub async fn update_note(pool: &SqlitePool, id: &str, fields: &NoteFields) -> Result<Option<Note>> {
    sqlx::query(
        r#"
        UPDATE notes
        SET title = ?, content = ?, category = ?, is_readonly_for_kids = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.title)
    .bind(&fields.content)
    .bind(&fields.category)
    .bind(fields.is_readonly_for_kids)
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    get_note(pool, id).await
}

pub async fn delete_note(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM notes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
