//! Configuration module.
//!
//! Handles credential loading and validation, tool settings and the
//! groups file used by batch mode.

mod groups;
mod settings;

pub use groups::{InputError, load_groups, normalize_group_identifier, parse_groups};
pub use settings::{AppSettings, ConfigError, TelegramConfig, validate_credentials};

/// Default env file holding `API_ID` and `API_HASH`.
pub const DEFAULT_ENV_FILE: &str = ".env";
