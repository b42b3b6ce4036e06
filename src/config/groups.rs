//! Groups file loading for batch mode.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors raised while reading a groups file.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read groups file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Prefixes that are stripped from a group reference before lookup.
const LINK_PREFIXES: [&str; 4] = ["https://t.me/", "http://t.me/", "t.me/", "@"];

/// Normalizes a user-supplied group reference.
///
/// Trims whitespace and strips a leading `@` or `t.me/` link prefix, so
/// `@rustlang`, `t.me/rustlang` and `rustlang` all address the same group.
#[must_use]
pub fn normalize_group_identifier(raw: &str) -> String {
    let mut value = raw.trim();
    for prefix in LINK_PREFIXES {
        if let Some(rest) = value.strip_prefix(prefix) {
            value = rest;
            break;
        }
    }
    value.trim_start_matches('@').trim_end_matches('/').to_owned()
}

/// Parses newline-delimited group identifiers, ignoring blank lines.
#[must_use]
pub fn parse_groups(text: &str) -> Vec<String> {
    text.lines()
        .map(normalize_group_identifier)
        .filter(|group| !group.is_empty())
        .collect()
}

/// Reads and parses a groups file.
pub fn load_groups(path: impl AsRef<Path>) -> Result<Vec<String>, InputError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let groups = parse_groups(&content);
    debug!("Loaded {} groups from {}", groups.len(), path.display());
    Ok(groups)
}
