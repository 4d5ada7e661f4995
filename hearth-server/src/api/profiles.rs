//! Family member profiles
//!
//! Anyone signed in may list profiles; only the owner may change one.

use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::info;

use hearth_common::dates::{calculate_age, local_today, validate_date_of_birth};
use hearth_common::db::{Profile, Role};
use hearth_common::phone::normalize_phone;

use crate::auth::CurrentUser;
use crate::db::profiles::{self, ProfileChanges};
use crate::error::{ApiError, ApiResult};
use crate::services::{PhotoBucket, PhotoStore};
use crate::AppState;

use super::{ensure_own_photo, read_image_upload};

const MAX_PROFILE_PHOTO_MB: usize = 2;

/// Profile plus its computed age
#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub age: Option<i32>,
}

impl ProfileView {
    fn new(profile: Profile) -> Self {
        let today = local_today();
        let age = profile.date_of_birth.map(|dob| calculate_age(dob, today));
        Self { profile, age }
    }
}

/// Partial update; absent keys are left alone, empty strings clear optional fields
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub role: Option<String>,
    pub photo_url: Option<String>,
    pub date_of_birth: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub whatsapp_enabled: Option<bool>,
    pub sms_enabled: Option<bool>,
}

fn optional_text(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let v = v.trim().to_string();
        (!v.is_empty()).then_some(v)
    })
}

impl ProfileUpdate {
    fn into_changes(self) -> ApiResult<ProfileChanges> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(ApiError::BadRequest("Name cannot be empty".to_string()))
            }
            other => other.map(|n| n.trim().to_string()),
        };

        let role = self
            .role
            .map(|r| Role::from_str(r.trim()).map(|r| r.to_string()))
            .transpose()?;

        let date_of_birth = match self.date_of_birth {
            None => None,
            Some(dob) if dob.trim().is_empty() => Some(None),
            Some(dob) => Some(Some(validate_date_of_birth(&dob, local_today())?)),
        };

        let phone_number = self
            .phone_number
            .map(|p| normalize_phone(&p))
            .transpose()?;

        Ok(ProfileChanges {
            name,
            role,
            photo_url: optional_text(self.photo_url),
            date_of_birth,
            bio: optional_text(self.bio),
            phone_number,
            notifications_enabled: self.notifications_enabled,
            whatsapp_enabled: self.whatsapp_enabled,
            sms_enabled: self.sms_enabled,
        })
    }
}

/// 404 when the profile is absent, 403 when it belongs to someone else
async fn ensure_self(
    state: &AppState,
    id: &str,
    user: &Profile,
    denied: &str,
) -> ApiResult<Profile> {
    let target = profiles::get_profile(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    if target.id != user.id {
        return Err(ApiError::Forbidden(denied.to_string()));
    }
    Ok(target)
}

/// GET /api/profiles
pub async fn list_profiles(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let profiles: Vec<ProfileView> = profiles::list_profiles(&state.db)
        .await?
        .into_iter()
        .map(ProfileView::new)
        .collect();
    Ok(Json(json!({ "profiles": profiles })))
}

/// GET /api/profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let profile = profiles::get_profile(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;
    Ok(Json(json!({ "profile": ProfileView::new(profile) })))
}

/// PUT /api/profiles/:id
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Value>> {
    ensure_self(&state, &id, &user, "You can only update your own profile").await?;
    if let Some(url) = update.photo_url.as_deref().map(str::trim) {
        ensure_own_photo(url, PhotoBucket::Profiles, &user.id)?;
    }

    let changes = update.into_changes()?;
    let profile = profiles::update_profile(&state.db, &id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    info!(profile_id = %id, "Profile updated");
    Ok(Json(json!({ "profile": ProfileView::new(profile) })))
}

/// POST /api/profiles/:id/photo
///
/// Replaces the stored photo. The previous file is deleted when it sits in the
/// member's own folder.
pub async fn upload_profile_photo(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let target =
        ensure_self(&state, &id, &user, "You can only upload your own profile photo").await?;

    let upload = read_image_upload(&mut multipart, MAX_PROFILE_PHOTO_MB).await?;
    let stored = state
        .photos
        .save(
            PhotoBucket::Profiles,
            &target.id,
            upload.file_name.as_deref(),
            &upload.content_type,
            &upload.bytes,
        )
        .await?;

    if let Err(e) = profiles::set_photo_url(&state.db, &target.id, &stored.url).await {
        state
            .photos
            .remove_owned(&stored.url, PhotoBucket::Profiles, &target.id)
            .await;
        return Err(e.into());
    }

    if let Some(previous) = target
        .photo_url
        .as_deref()
        .filter(|url| PhotoStore::is_local_url(url))
    {
        state
            .photos
            .remove_owned(previous, PhotoBucket::Profiles, &target.id)
            .await;
    }

    info!(profile_id = %target.id, path = %stored.path, "Profile photo replaced");
    Ok(Json(json!({ "url": stored.url, "path": stored.path })))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/api/profiles", get(list_profiles))
        .route("/api/profiles/:id", get(get_profile).put(update_profile))
        .route("/api/profiles/:id/photo", post(upload_profile_photo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_strings_clear_optional_fields() {
        let changes = ProfileUpdate {
            bio: Some("  ".into()),
            phone_number: Some("".into()),
            date_of_birth: Some("".into()),
            ..Default::default()
        }
        .into_changes()
        .unwrap();

        assert_eq!(changes.bio, Some(None));
        assert_eq!(changes.phone_number, Some(None));
        assert_eq!(changes.date_of_birth, Some(None));
        assert_eq!(changes.name, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_phone = ProfileUpdate {
            phone_number: Some("5551234".into()),
            ..Default::default()
        };
        assert!(bad_phone.into_changes().is_err());

        let future_dob = ProfileUpdate {
            date_of_birth: Some("2999-01-01".into()),
            ..Default::default()
        };
        assert!(future_dob.into_changes().is_err());

        let bad_role = ProfileUpdate {
            role: Some("uncle".into()),
            ..Default::default()
        };
        assert!(bad_role.into_changes().is_err());
    }
}
