//! Local photo storage
//!
//! Files live under `<root>/photos/<bucket>/<owner>/<millis>-<rand>.<ext>` and are
//! served read-only at `/photos/...`.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use hearth_common::{Error, Result};

/// URL prefix the photo directory is mounted at
pub const PHOTOS_URL_PREFIX: &str = "/photos";

/// Top-level photo directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoBucket {
    Memories,
    Profiles,
}

impl PhotoBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoBucket::Memories => "memories",
            PhotoBucket::Profiles => "profiles",
        }
    }
}

/// Where an upload landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredPhoto {
    /// Public URL, e.g. `/photos/memories/<owner>/1700000000000-a1b2c3.jpg`
    pub url: String,
    /// Path relative to the photo root, e.g. `memories/<owner>/1700000000000-a1b2c3.jpg`
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under a fresh unique name
    pub async fn save(
        &self,
        bucket: PhotoBucket,
        owner: &str,
        file_name: Option<&str>,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredPhoto> {
        if !is_safe_segment(owner) {
            return Err(Error::InvalidInput("Invalid photo owner".to_string()));
        }

        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(|c| char::from(c).to_ascii_lowercase())
            .collect();
        let extension = extension_for(file_name, content_type);
        let name = format!("{}-{}.{}", Utc::now().timestamp_millis(), suffix, extension);

        let relative = format!("{}/{}/{}", bucket.as_str(), owner, name);
        let dir = self.root.join(bucket.as_str()).join(owner);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), bytes).await?;

        debug!("Stored photo {} ({} bytes)", relative, bytes.len());

        Ok(StoredPhoto {
            url: format!("{}/{}", PHOTOS_URL_PREFIX, relative),
            path: relative,
        })
    }

    /// True when `url` points into local photo storage
    pub fn is_local_url(url: &str) -> bool {
        url.starts_with(&format!("{}/", PHOTOS_URL_PREFIX))
    }

    /// True when `url` names a file directly under `<bucket>/<owner>/`
    pub fn is_owned_by(url: &str, bucket: PhotoBucket, owner: &str) -> bool {
        owned_file_name(url, bucket, owner).is_some()
    }

    /// Delete the file behind `url` if it belongs to `owner` in `bucket`
    ///
    /// Anything else (external URLs, another member's folder, missing files) is
    /// logged and left alone.
    pub async fn remove_owned(&self, url: &str, bucket: PhotoBucket, owner: &str) {
        let Some(file_name) = owned_file_name(url, bucket, owner) else {
            warn!(
                bucket = bucket.as_str(),
                owner, "Not removing photo outside the owner's folder: {}", url
            );
            return;
        };
        let path = self.root.join(bucket.as_str()).join(owner).join(file_name);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Removed photo {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Photo already missing: {}", path.display())
            }
            Err(e) => warn!("Failed to remove photo {}: {}", path.display(), e),
        }
    }
}

/// File name of a `/photos/<bucket>/<owner>/<file>` URL; `None` for any other shape
fn owned_file_name<'a>(url: &'a str, bucket: PhotoBucket, owner: &str) -> Option<&'a str> {
    if !is_safe_segment(owner) {
        return None;
    }
    let prefix = format!("{}/{}/{}/", PHOTOS_URL_PREFIX, bucket.as_str(), owner);
    let file_name = url.strip_prefix(&prefix)?;

    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !file_name.contains('/') => Some(file_name),
        _ => None,
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn extension_for(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    from_name.unwrap_or_else(|| {
        match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/heic" => "heic",
            _ => "img",
        }
        .to_string()
    })
}
