//! HTTP API handlers for hearth-server

pub mod announcements;
pub mod auth;
pub mod events;
pub mod health;
pub mod memories;
pub mod notes;
pub mod notifications;
pub mod profiles;
pub mod settings;
pub mod tasks;

pub use health::health_routes;

use axum::extract::Multipart;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::services::{PhotoBucket, PhotoStore};

/// Trimmed value, or `None` when absent or blank
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 403 when `url` points into local photo storage outside `owner`'s folder in `bucket`
///
/// External URLs pass; they are never deleted by the server.
pub(crate) fn ensure_own_photo(url: &str, bucket: PhotoBucket, owner: &str) -> ApiResult<()> {
    if PhotoStore::is_local_url(url) && !PhotoStore::is_owned_by(url, bucket, owner) {
        return Err(ApiError::Forbidden(
            "You can only use photos you uploaded".to_string(),
        ));
    }
    Ok(())
}

/// 403 unless `user_id` created the row
pub(crate) fn ensure_creator(created_by: &str, user_id: &str, action: &str) -> ApiResult<()> {
    if created_by == user_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("You can only {} you created", action)))
    }
}

/// Body returned by every delete
pub(crate) fn deleted() -> Value {
    json!({ "success": true })
}

/// An uploaded image read fully into memory
#[derive(Debug)]
pub(crate) struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Read the multipart field `file`, which must be an image no larger than `max_mb`
pub(crate) async fn read_image_upload(
    multipart: &mut Multipart,
    max_mb: usize,
) -> ApiResult<ImageUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::BadRequest("File must be an image".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("No file provided".to_string()));
        }
        if bytes.len() > max_mb * 1024 * 1024 {
            return Err(ApiError::BadRequest(format!(
                "File size must be less than {}MB",
                max_mb
            )));
        }

        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::BadRequest("No file provided".to_string()))
}
