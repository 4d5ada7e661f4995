//! Account endpoints: signup, login, logout, me

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use hearth_common::dates::{calculate_age, local_today, validate_date_of_birth};
use hearth_common::db::{Gender, Profile, Role};
use hearth_common::phone::normalize_phone;

use crate::auth::{
    bearer_token, generate_token, hash_password, hash_token, verify_password, CurrentUser,
};
use crate::db::profiles::{self, NewProfile};
use crate::db::sessions;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::{deleted, non_blank};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub nick_name: Option<String>,
    pub punch_line: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub profile: Profile,
}

/// Issue a session for `profile`
async fn start_session(state: &AppState, profile: Profile) -> ApiResult<SessionResponse> {
    let session = generate_token();
    let expires_at = Utc::now() + state.config.session_ttl;
    sessions::create_session(&state.db, &session.token_hash, &profile.id, expires_at).await?;

    Ok(SessionResponse {
        token: session.token,
        profile,
    })
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let (
        Some(email),
        Some(password),
        Some(confirmation),
        Some(gender),
        Some(dob),
        Some(nick_name),
    ) = (
        non_blank(req.email),
        req.password.filter(|p| !p.is_empty()),
        req.password_confirmation.filter(|p| !p.is_empty()),
        non_blank(req.gender),
        non_blank(req.date_of_birth),
        non_blank(req.nick_name),
    )
    else {
        return Err(ApiError::BadRequest(
            "All required fields must be filled".to_string(),
        ));
    };

    if password != confirmation {
        return Err(ApiError::BadRequest("Passwords do not match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let gender = Gender::from_str(&gender)
        .map_err(|_| ApiError::BadRequest("Invalid gender selection".to_string()))?;

    let today = local_today();
    let date_of_birth = validate_date_of_birth(&dob, today)?;
    let phone_number = match req.phone_number {
        Some(phone) => normalize_phone(&phone)?,
        None => None,
    };

    let email = email.to_lowercase();
    if profiles::get_profile_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::BadRequest(
            "An account with this email already exists".to_string(),
        ));
    }

    let role = Role::from_age_and_gender(calculate_age(date_of_birth, today), gender);
    let profile = profiles::insert_profile(
        &state.db,
        &NewProfile {
            email,
            password_hash: hash_password(&password)?,
            name: nick_name,
            role: role.to_string(),
            gender: Some(gender.to_string()),
            date_of_birth: Some(date_of_birth),
            bio: non_blank(req.punch_line),
            phone_number,
        },
    )
    .await?;

    info!(profile_id = %profile.id, role = %role, "New family member signed up");

    let session = start_session(&state, profile).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let (Some(email), Some(password)) = (non_blank(req.email), req.password) else {
        return Err(invalid());
    };

    let profile = profiles::get_profile_by_email(&state.db, &email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &profile.password_hash) {
        return Err(invalid());
    }

    info!(profile_id = %profile.id, "Login");
    Ok(Json(start_session(&state, profile).await?))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    if let Some(token) = bearer_token(&headers) {
        sessions::delete_session(&state.db, &hash_token(token)).await?;
    }
    Ok(Json(deleted()))
}

/// GET /api/auth/me
pub async fn me(
    Extension(CurrentUser(profile)): Extension<CurrentUser>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "profile": profile }))
}

/// Signup and login; no session required
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
}

/// Logout and me; behind the session middleware
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}
