//! Application settings and Telegram credentials.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Placeholder values shipped in the example `.env` file.
const PLACEHOLDER_API_ID: &str = "your_api_id";
const PLACEHOLDER_API_HASH: &str = "your_api_hash";

/// Telegram API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org/apps>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org/apps>).
    pub api_hash: String,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("admin_connect.session")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String) -> Self {
        Self {
            api_id,
            api_hash,
            session_path: default_session_path(),
        }
    }

    /// Loads the env file and builds the configuration from it.
    ///
    /// Unlike [`Self::from_env`], a missing env file is an error here:
    /// credentials must come from the file the user was told to create.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::MissingEnvFile(path.to_path_buf()));
        }

        dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_env()
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `API_ID` and `API_HASH` to be set. `SESSION_PATH` is optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_id = std::env::var("API_ID").ok();
        let api_hash = std::env::var("API_HASH").ok();

        let (api_id, api_hash) = validate_credentials(api_id.as_deref(), api_hash.as_deref())?;

        let session_path =
            std::env::var("SESSION_PATH").map_or_else(|_| default_session_path(), PathBuf::from);

        Ok(Self {
            api_id,
            api_hash,
            session_path,
        })
    }

    /// Overrides the session file path.
    #[must_use]
    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = path.into();
        self
    }
}

/// Checks raw credential values before any network activity.
///
/// Both values must be present and differ from the shipped placeholders,
/// and the API ID must be a positive integer.
pub fn validate_credentials(
    api_id: Option<&str>,
    api_hash: Option<&str>,
) -> Result<(i32, String), ConfigError> {
    let api_id = api_id.map(str::trim).filter(|s| !s.is_empty());
    let api_hash = api_hash.map(str::trim).filter(|s| !s.is_empty());

    let api_id = api_id.ok_or(ConfigError::MissingEnvVar("API_ID"))?;
    let api_hash = api_hash.ok_or(ConfigError::MissingEnvVar("API_HASH"))?;

    if api_id == PLACEHOLDER_API_ID {
        return Err(ConfigError::Placeholder("API_ID"));
    }
    if api_hash == PLACEHOLDER_API_HASH {
        return Err(ConfigError::Placeholder("API_HASH"));
    }

    let api_id: i32 = api_id.parse().map_err(|_| ConfigError::InvalidApiId)?;
    if api_id <= 0 {
        return Err(ConfigError::InvalidApiId);
    }

    Ok((api_id, api_hash.to_owned()))
}

/// Tool-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Fixed pause between rate-limited operations, in seconds.
    #[serde(default = "default_send_delay")]
    pub send_delay_secs: u64,

    /// Default file name for the plain-text save action.
    #[serde(default = "default_save_path")]
    pub default_save_path: PathBuf,

    /// Log level used when none is given on the command line.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_send_delay() -> u64 {
    2
}

fn default_save_path() -> PathBuf {
    PathBuf::from("admins.txt")
}

fn default_log_level() -> String {
    "warn".to_owned()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            send_delay_secs: default_send_delay(),
            default_save_path: default_save_path(),
            log_level: default_log_level(),
        }
    }
}

impl AppSettings {
    /// Creates settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            send_delay_secs: std::env::var("SEND_DELAY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_send_delay),
            default_save_path: std::env::var("SAVE_PATH")
                .map_or_else(|_| default_save_path(), PathBuf::from),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
        }
    }

    /// The fixed delay as a [`Duration`].
    #[must_use]
    pub const fn send_delay(&self) -> Duration {
        Duration::from_secs(self.send_delay_secs)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Env file not found: {}", .0.display())]
    MissingEnvFile(PathBuf),

    #[error("Failed to read env file {}: {reason}", .path.display())]
    EnvFile { path: PathBuf, reason: String },

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("{0} still holds the placeholder value")]
    Placeholder(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,
}
