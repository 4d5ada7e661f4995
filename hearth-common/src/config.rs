//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `HEARTH_ROOT_FOLDER` environment variable
//! 3. `root_folder` key in the TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is never fatal: the service logs a warning and runs on defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "HEARTH_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "hearth.db";

/// Photo storage directory inside the root folder
pub const PHOTOS_DIR: &str = "photos";

const CONFIG_FILE: &str = "hearth.toml";

/// Contents of `hearth.toml`
///
/// Every key is optional; absent keys fall back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub session_ttl_hours: Option<i64>,
    pub require_cron_secret: Option<bool>,
    pub cron_secret: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "hearth_server=debug"
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub sms_from: Option<String>,
    pub whatsapp_from: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse TOML config text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load the first config file that exists, or defaults
    ///
    /// An explicit path that does not exist or fails to parse is logged and ignored.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let candidates = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => default_config_paths(),
        };

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    return Self::default();
                }
            }
        }

        warn!("No {} found, using compiled defaults", CONFIG_FILE);
        Self::default()
    }
}

/// Config file search locations, in priority order
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("hearth").join(CONFIG_FILE));
    }
    if cfg!(unix) {
        paths.push(PathBuf::from("/etc/hearth").join(CONFIG_FILE));
    }
    paths
}

/// Resolves the root folder holding the database and photo storage
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_root: toml.root_folder.clone(),
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        default_root_folder()
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hearth"))
        .unwrap_or_else(|| PathBuf::from("./hearth_data"))
}

/// Creates the root folder layout on first run
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root.exists() {
            info!("Creating root folder: {}", self.root.display());
        }
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.photos_path())?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    pub fn photos_path(&self) -> PathBuf {
        self.root.join(PHOTOS_DIR)
    }
}

/// Third-party credentials and the trigger secret
///
/// Environment variables take priority over TOML keys. Blank values count as absent.
#[derive(Clone, Default)]
pub struct Credentials {
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_sms_from: Option<String>,
    pub twilio_whatsapp_from: Option<String>,
    pub openai_api_key: Option<String>,
    pub cron_secret: Option<String>,
}

// Never print secret values.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("presence", &self.presence())
            .finish()
    }
}

/// Which credentials are configured, without their values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialPresence {
    pub twilio_account_sid: bool,
    pub twilio_auth_token: bool,
    pub twilio_sms_from: bool,
    pub twilio_whatsapp_from: bool,
    pub openai_api_key: bool,
    pub cron_secret: bool,
}

impl Credentials {
    /// Resolve from the process environment and TOML
    pub fn resolve(toml: &TomlConfig) -> Self {
        Self::resolve_with(toml, |key| std::env::var(key).ok())
    }

    /// Resolve with an injectable environment lookup
    pub fn resolve_with<F>(toml: &TomlConfig, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, fallback: &Option<String>| {
            non_blank(env(key)).or_else(|| non_blank(fallback.clone()))
        };

        Self {
            twilio_account_sid: pick("TWILIO_ACCOUNT_SID", &toml.twilio.account_sid),
            twilio_auth_token: pick("TWILIO_AUTH_TOKEN", &toml.twilio.auth_token),
            twilio_sms_from: pick("TWILIO_SMS_FROM", &toml.twilio.sms_from),
            twilio_whatsapp_from: pick("TWILIO_WHATSAPP_FROM", &toml.twilio.whatsapp_from),
            openai_api_key: pick("OPENAI_API_KEY", &toml.openai.api_key),
            cron_secret: pick("CRON_SECRET", &toml.cron_secret),
        }
    }

    pub fn presence(&self) -> CredentialPresence {
        CredentialPresence {
            twilio_account_sid: self.twilio_account_sid.is_some(),
            twilio_auth_token: self.twilio_auth_token.is_some(),
            twilio_sms_from: self.twilio_sms_from.is_some(),
            twilio_whatsapp_from: self.twilio_whatsapp_from.is_some(),
            openai_api_key: self.openai_api_key.is_some(),
            cron_secret: self.cron_secret.is_some(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
