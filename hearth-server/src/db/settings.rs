//! Application settings row
//!
//! The table holds at most one row (id = 1). Writers upsert it; readers treat a
//! missing row as "all enabled".

use chrono::Utc;
use hearth_common::db::AppSettings;
use hearth_common::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Marker stored in `updated_by` for automatic changes
pub const SYSTEM_ACTOR: &str = "system";

/// Partial settings update; `None` leaves the stored value (or default) in place
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsChanges {
    pub notifications_enabled: Option<bool>,
    pub enable_sms: Option<bool>,
    pub enable_whatsapp: Option<bool>,
}

/// The stored row, if one exists
pub async fn get_settings(pool: &SqlitePool) -> Result<Option<AppSettings>> {
    let settings = sqlx::query_as::<_, AppSettings>(
        r#"
        SELECT id, notifications_enabled, enable_sms, enable_whatsapp, updated_at, updated_by
        FROM app_settings
        WHERE id = 1
        "#,
    )
    .fetch_optional(pool)
    .await?;
    Ok(settings)
}

/// Stored row, or the all-enabled default when none exists
pub async fn get_settings_or_default(pool: &SqlitePool) -> Result<AppSettings> {
    Ok(get_settings(pool).await?.unwrap_or_default())
}

/// Insert or update the single row in one statement
pub async fn upsert_settings(
    pool: &SqlitePool,
    changes: SettingsChanges,
    updated_by: &str,
) -> Result<AppSettings> {
    sqlx::query(
        r#"
        INSERT INTO app_settings
            (id, notifications_enabled, enable_sms, enable_whatsapp, updated_at, updated_by)
        VALUES (1, COALESCE(?1, 1), COALESCE(?2, 1), COALESCE(?3, 1), ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
            notifications_enabled = COALESCE(?1, notifications_enabled),
            enable_sms = COALESCE(?2, enable_sms),
            enable_whatsapp = COALESCE(?3, enable_whatsapp),
            updated_at = ?4,
            updated_by = ?5
        "#,
    )
    .bind(changes.notifications_enabled)
    .bind(changes.enable_sms)
    .bind(changes.enable_whatsapp)
    .bind(Utc::now().to_rfc3339())
    .bind(updated_by)
    .execute(pool)
    .await?;

    get_settings_or_default(pool).await
}

/// Turn the master switch off on behalf of the system
///
/// Idempotent; callers invoke it at most once per batch.
pub async fn disable_notifications(pool: &SqlitePool) -> Result<()> {
    upsert_settings(
        pool,
        SettingsChanges {
            notifications_enabled: Some(false),
            ..Default::default()
        },
        SYSTEM_ACTOR,
    )
    .await?;
    info!("Notifications disabled at application level by {}", SYSTEM_ACTOR);
    Ok(())
}
