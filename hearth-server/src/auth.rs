//! Password hashing, session tokens and the session middleware
//!
//! Passwords are stored as Argon2 PHC strings. A session token is 32 random bytes,
//! hex-encoded, handed to the client once; the database keeps only its SHA-256.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

use hearth_common::db::Profile;

use crate::db::{profiles, sessions};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const TOKEN_BYTES: usize = 32;

/// The authenticated caller, placed in request extensions by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Profile);

/// Bearer token plus its stored hash
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub token_hash: String,
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// False for a wrong password and for an unreadable stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            debug!("Unreadable password hash: {}", e);
            false
        }
    }
}

pub fn generate_token() -> SessionToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let token_hash = hash_token(&token);
    SessionToken { token, token_hash }
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Value of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Raw `Authorization` header value, for the trigger-secret guard
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?.to_str().ok()
}

/// Resolve the session behind the request's bearer token
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<Profile> {
    let token = bearer_token(headers).ok_or_else(ApiError::unauthorized)?;
    let profile_id = sessions::find_session_profile(&state.db, &hash_token(token), Utc::now())
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    profiles::get_profile(&state.db, &profile_id)
        .await?
        .ok_or_else(ApiError::unauthorized)
}

/// Session middleware for protected routes
///
/// Rejects with 401 when the token is missing, unknown or expired.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let profile = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(CurrentUser(profile));
    Ok(next.run(request).await)
}
