//! Announcement database operations

use chrono::{DateTime, Utc};
use hearth_common::db::Announcement;
use hearth_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

const ANNOUNCEMENT_COLUMNS: &str = "id, message, expires_at, created_by, created_at";

/// Announcements still active at `now`, newest first
///
/// Expiry is compared on parsed timestamps rather than in SQL text.
pub async fn list_active_announcements(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<Vec<Announcement>> {
    let all = sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {} FROM announcements ORDER BY created_at DESC",
        ANNOUNCEMENT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(all
        .into_iter()
        .filter(|a| a.expires_at.map_or(true, |expires| expires > now))
        .collect())
}

pub async fn get_announcement(pool: &SqlitePool, id: &str) -> Result<Option<Announcement>> {
    let announcement = sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {} FROM announcements WHERE id = ?",
        ANNOUNCEMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(announcement)
}

pub async fn insert_announcement(
    pool: &SqlitePool,
    message: &str,
    expires_at: Option<DateTime<Utc>>,
    created_by: &str,
) -> Result<Announcement> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO announcements (id, message, expires_at, created_by, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(message)
    .bind(expires_at.map(|t| t.to_rfc3339()))
    .bind(created_by)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    get_announcement(pool, &id)
        .await?
        .ok_or_else(|| hearth_common::Error::Internal("Inserted announcement vanished".to_string()))
}

pub async fn update_announcement(
    pool: &SqlitePool,
    id: &str,
    message: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<Option<Announcement>> {
    sqlx::query("UPDATE announcements SET message = ?, expires_at = ? WHERE id = ?")
        .bind(message)
        .bind(expires_at.map(|t| t.to_rfc3339()))
        .bind(id)
        .execute(pool)
        .await?;
    get_announcement(pool, id).await
}

pub async fn delete_announcement(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::profiles::{insert_profile, NewProfile};
    use chrono::Duration;
    use hearth_common::db::init_in_memory;

    #[tokio::test]
    async fn test_expired_announcements_hidden() {
        let pool = init_in_memory().await.unwrap();
        let author = insert_profile(
            &pool,
            &NewProfile {
                email: "a@x.io".into(),
                password_hash: "h".into(),
                name: "Ana".into(),
                role: "mother".into(),
                gender: None,
                date_of_birth: None,
                bio: None,
                phone_number: None,
            },
        )
        .await
        .unwrap();

        let now = Utc::now();
        insert_announcement(&pool, "forever", None, &author.id).await.unwrap();
        insert_announcement(&pool, "later", Some(now + Duration::days(1)), &author.id)
            .await
            .unwrap();
        insert_announcement(&pool, "gone", Some(now - Duration::days(1)), &author.id)
            .await
            .unwrap();

        let mut messages: Vec<String> = list_active_announcements(&pool, now)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.message)
            .collect();
        messages.sort();
        assert_eq!(messages, vec!["forever", "later"]);
    }
}
