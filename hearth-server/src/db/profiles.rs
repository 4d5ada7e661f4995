//! Profile database operations

use chrono::{NaiveDate, Utc};
use hearth_common::db::Profile;
use hearth_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

const PROFILE_COLUMNS: &str = "id, email, password_hash, name, role, gender, date_of_birth, bio, \
     photo_url, phone_number, notifications_enabled, whatsapp_enabled, sms_enabled, \
     created_at, updated_at";

/// Fields supplied at signup
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
}

/// Partial profile update
///
/// Outer `None` leaves a column untouched; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub role: Option<String>,
    pub photo_url: Option<Option<String>>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub bio: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
    pub notifications_enabled: Option<bool>,
    pub whatsapp_enabled: Option<bool>,
    pub sms_enabled: Option<bool>,
}

impl ProfileChanges {
    fn apply(self, profile: &mut Profile) {
        if let Some(v) = self.name {
            profile.name = v;
        }
        if let Some(v) = self.role {
            profile.role = v;
        }
        if let Some(v) = self.photo_url {
            profile.photo_url = v;
        }
        if let Some(v) = self.date_of_birth {
            profile.date_of_birth = v;
        }
        if let Some(v) = self.bio {
            profile.bio = v;
        }
        if let Some(v) = self.phone_number {
            profile.phone_number = v;
        }
        if let Some(v) = self.notifications_enabled {
            profile.notifications_enabled = v;
        }
        if let Some(v) = self.whatsapp_enabled {
            profile.whatsapp_enabled = v;
        }
        if let Some(v) = self.sms_enabled {
            profile.sms_enabled = v;
        }
    }
}

/// Insert a new profile; notification preferences start enabled
pub async fn insert_profile(pool: &SqlitePool, new: &NewProfile) -> Result<Profile> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO profiles (id, email, password_hash, name, role, gender, date_of_birth, bio,
                              phone_number, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.name)
    .bind(&new.role)
    .bind(&new.gender)
    .bind(new.date_of_birth.map(|d| d.to_string()))
    .bind(&new.bio)
    .bind(&new.phone_number)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    require_profile(pool, &id).await
}

pub async fn get_profile(pool: &SqlitePool, id: &str) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM profiles WHERE id = ?",
        PROFILE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(profile)
}

async fn require_profile(pool: &SqlitePool, id: &str) -> Result<Profile> {
    get_profile(pool, id)
        .await?
        .ok_or_else(|| hearth_common::Error::NotFound("Profile not found".to_string()))
}

/// Case-insensitive lookup used by login and signup
pub async fn get_profile_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM profiles WHERE lower(email) = lower(?)",
        PROFILE_COLUMNS
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(profile)
}

/// All family members in name order
pub async fn list_profiles(pool: &SqlitePool) -> Result<Vec<Profile>> {
    let profiles = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM profiles ORDER BY name ASC",
        PROFILE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(profiles)
}

/// Profiles with a phone number, oldest account first
///
/// The ordering is what makes phone de-duplication keep the first registered profile.
pub async fn list_profiles_with_phone(pool: &SqlitePool) -> Result<Vec<Profile>> {
    let profiles = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM profiles \
         WHERE phone_number IS NOT NULL AND phone_number != '' \
         ORDER BY created_at ASC, rowid ASC",
        PROFILE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(profiles)
}

/// Apply a partial update; `None` when the profile does not exist
pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    changes: ProfileChanges,
) -> Result<Option<Profile>> {
    let Some(mut profile) = get_profile(pool, id).await? else {
        return Ok(None);
    };
    changes.apply(&mut profile);

    sqlx::query(
        r#"
        UPDATE profiles
        SET name = ?, role = ?, photo_url = ?, date_of_birth = ?, bio = ?, phone_number = ?,
            notifications_enabled = ?, whatsapp_enabled = ?, sms_enabled = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&profile.name)
    .bind(&profile.role)
    .bind(&profile.photo_url)
    .bind(profile.date_of_birth.map(|d| d.to_string()))
    .bind(&profile.bio)
    .bind(&profile.phone_number)
    .bind(profile.notifications_enabled)
    .bind(profile.whatsapp_enabled)
    .bind(profile.sms_enabled)
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    get_profile(pool, id).await
}

pub async fn set_photo_url(pool: &SqlitePool, id: &str, photo_url: &str) -> Result<()> {
    sqlx::query("UPDATE profiles SET photo_url = ?, updated_at = ? WHERE id = ?")
        .bind(photo_url)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
