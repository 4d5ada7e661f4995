//! Application-wide notification settings

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::CurrentUser;
use crate::db::settings::{self, SettingsChanges};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/settings
///
/// A missing row reads as all enabled.
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let settings = settings::get_settings_or_default(&state.db).await?;
    Ok(Json(json!({ "settings": settings })))
}

fn optional_bool(body: &Value, field: &str) -> ApiResult<Option<bool>> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ApiError::BadRequest(format!("{} must be a boolean", field))),
    }
}

/// Validate a PUT body: every provided field must be a JSON boolean
pub fn parse_changes(body: &Value) -> ApiResult<SettingsChanges> {
    if !body.is_object() {
        return Err(ApiError::BadRequest("Request body must be a JSON object".to_string()));
    }

    Ok(SettingsChanges {
        notifications_enabled: optional_bool(body, "notifications_enabled")?,
        enable_sms: optional_bool(body, "enable_sms")?,
        enable_whatsapp: optional_bool(body, "enable_whatsapp")?,
    })
}

/// PUT /api/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let changes = parse_changes(&body)?;
    let settings = settings::upsert_settings(&state.db, changes, &user.id).await?;

    info!(
        updated_by = %user.id,
        notifications_enabled = settings.notifications_enabled,
        enable_sms = settings.enable_sms,
        enable_whatsapp = settings.enable_whatsapp,
        "Application settings updated"
    );
    Ok(Json(json!({ "settings": settings })))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings).put(update_settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_changes() {
        let changes = parse_changes(&json!({ "enable_sms": false })).unwrap();
        assert_eq!(
            changes,
            SettingsChanges {
                enable_sms: Some(false),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_non_boolean_rejected() {
        let err = parse_changes(&json!({ "enable_whatsapp": "yes" })).unwrap_err();
        assert_eq!(err.to_string(), "enable_whatsapp must be a boolean");

        assert!(parse_changes(&json!([true])).is_err());
    }
}
