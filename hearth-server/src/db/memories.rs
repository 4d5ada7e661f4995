//! Photo memory database operations

use chrono::Utc;
use hearth_common::db::Memory;
use hearth_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

const MEMORY_COLUMNS: &str = "id, photo_url, note, created_by, created_at";

/// Newest first
pub async fn list_memories(pool: &SqlitePool) -> Result<Vec<Memory>> {
    let memories = sqlx::query_as::<_, Memory>(&format!(
        "SELECT {} FROM memories ORDER BY created_at DESC",
        MEMORY_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(memories)
}

pub async fn get_memory(pool: &SqlitePool, id: &str) -> Result<Option<Memory>> {
    let memory = sqlx::query_as::<_, Memory>(&format!(
        "SELECT {} FROM memories WHERE id = ?",
        MEMORY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(memory)
}

pub async fn insert_memory(
    pool: &SqlitePool,
    photo_url: &str,
    note: Option<&str>,
    created_by: &str,
) -> Result<Memory> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO memories (id, photo_url, note, created_by, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(photo_url)
    .bind(note)
    .bind(created_by)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    get_memory(pool, &id)
        .await?
        .ok_or_else(|| hearth_common::Error::Internal("Inserted memory vanished".to_string()))
}

/// Only the caption is editable
pub async fn update_memory_note(
    pool: &SqlitePool,
    id: &str,
    note: Option<&str>,
) -> Result<Option<Memory>> {
    sqlx::query("UPDATE memories SET note = ? WHERE id = ?")
        .bind(note)
        .bind(id)
        .execute(pool)
        .await?;
    get_memory(pool, id).await
}

pub async fn delete_memory(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM memories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
