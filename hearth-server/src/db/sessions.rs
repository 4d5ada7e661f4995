//! Session token storage
//!
//! Only the SHA-256 of a bearer token is stored. Expiry is checked on lookup.

use chrono::{DateTime, Utc};
use hearth_common::Result;
use sqlx::{Row, SqlitePool};
use tracing::debug;

pub async fn create_session(
    pool: &SqlitePool,
    token_hash: &str,
    profile_id: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO sessions (token_hash, profile_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token_hash)
    .bind(profile_id)
    .bind(Utc::now().to_rfc3339())
    .bind(expires_at.to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Profile id owning a live session; expired sessions are removed on sight
pub async fn find_session_profile(
    pool: &SqlitePool,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let row = sqlx::query("SELECT profile_id, expires_at FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
    if expires_at <= now {
        debug!("Session expired at {}", expires_at);
        delete_session(pool, token_hash).await?;
        return Ok(None);
    }

    Ok(Some(row.try_get("profile_id")?))
}

pub async fn delete_session(pool: &SqlitePool, token_hash: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove every expired session; returns how many were removed
pub async fn purge_expired_sessions(pool: &SqlitePool, now: DateTime<Utc>) -> Result<usize> {
    let rows = sqlx::query("SELECT token_hash, expires_at FROM sessions")
        .fetch_all(pool)
        .await?;

    let mut removed = 0;
    for row in rows {
        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
        if expires_at <= now {
            let token_hash: String = row.try_get("token_hash")?;
            delete_session(pool, &token_hash).await?;
            removed += 1;
        }
    }
    Ok(removed)
}
