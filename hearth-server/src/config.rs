//! Server configuration
//!
//! Combines command-line arguments, environment variables and `hearth.toml`
//! into one resolved [`HearthConfig`].

use chrono::Duration;
use clap::Parser;
use std::path::{Path, PathBuf};

use hearth_common::config::{Credentials, RootFolderResolver, TomlConfig};

use crate::error::ApiError;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5740";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 720;

/// Command-line arguments for hearth-server
#[derive(Parser, Debug, Default)]
#[command(name = "hearth-server")]
#[command(about = "Family organiser: calendar, tasks, notes and WhatsApp/SMS reminders")]
#[command(version)]
pub struct Args {
    /// Folder holding hearth.db and uploaded photos
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// Path to hearth.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:5740
    #[arg(short, long, env = "HEARTH_BIND_ADDRESS")]
    pub bind: Option<String>,
}

/// Shared-secret guard for the scheduler-facing endpoints
#[derive(Clone, Default)]
pub struct TriggerAuth {
    secret: Option<String>,
    required: bool,
}

impl std::fmt::Debug for TriggerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerAuth")
            .field("secret_configured", &self.secret.is_some())
            .field("required", &self.required)
            .finish()
    }
}

impl TriggerAuth {
    pub fn new(secret: Option<String>, required: bool) -> Self {
        Self { secret, required }
    }

    /// Check an `Authorization` header value
    ///
    /// Lenient mode only rejects a header that is present and wrong. Strict mode
    /// also rejects a missing header, and rejects everything when no secret is set.
    pub fn check(&self, header: Option<&str>) -> Result<(), ApiError> {
        match (&self.secret, header) {
            (Some(secret), Some(value)) => {
                if value == format!("Bearer {}", secret) {
                    Ok(())
                } else {
                    Err(ApiError::unauthorized())
                }
            }
            (Some(_), None) if self.required => Err(ApiError::unauthorized()),
            (None, _) if self.required => Err(ApiError::unauthorized()),
            _ => Ok(()),
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct HearthConfig {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub session_ttl: Duration,
    pub trigger_auth: TriggerAuth,
    pub credentials: Credentials,
    pub log_level: Option<String>,
    pub openai_model: Option<String>,
}

impl HearthConfig {
    /// Resolve from CLI arguments, the environment and the TOML file
    pub fn resolve(args: &Args, toml: &TomlConfig) -> Self {
        let credentials = Credentials::resolve(toml);
        Self::from_parts(args, toml, credentials)
    }

    /// Resolve with explicit credentials (no environment lookup for secrets)
    pub fn from_parts(args: &Args, toml: &TomlConfig, credentials: Credentials) -> Self {
        let root_folder = RootFolderResolver::new(args.root_folder.clone(), toml).resolve();

        let bind_address = args
            .bind
            .clone()
            .or_else(|| toml.bind_address.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let ttl_hours = toml
            .session_ttl_hours
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);

        let trigger_auth = TriggerAuth::new(
            credentials.cron_secret.clone(),
            toml.require_cron_secret.unwrap_or(false),
        );

        Self {
            root_folder,
            bind_address,
            session_ttl: Duration::hours(ttl_hours),
            trigger_auth,
            credentials,
            log_level: toml.logging.level.clone(),
            openai_model: toml.openai.model.clone(),
        }
    }

    /// Defaults rooted at `root`, with no credentials
    pub fn with_root(root: &Path) -> Self {
        let args = Args {
            root_folder: Some(root.to_path_buf()),
            ..Default::default()
        };
        Self::from_parts(&args, &TomlConfig::default(), Credentials::default())
    }
}
