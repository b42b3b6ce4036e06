//! Writing a roster to disk as text, CSV or JSON.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::PreconditionError;
use crate::roster::Roster;

/// Errors raised while exporting a roster.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize admins: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Csv,
    Json,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Text, Self::Csv, Self::Json];

    /// File extension, also used as the menu label.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Default destination, `admins.<ext>`.
    #[must_use]
    pub fn default_path(self) -> PathBuf {
        PathBuf::from(format!("admins.{}", self.extension()))
    }

    /// Renders the roster in this format.
    pub fn render(self, roster: &Roster) -> Result<String, ExportError> {
        match self {
            Self::Text => Ok(render_text(roster)),
            Self::Csv => Ok(render_csv(roster)),
            Self::Json => render_json(roster),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown export format: '{other}' (use txt, csv or json)")),
        }
    }
}

/// JSON shape of one exported admin.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminRecord {
    pub id: i64,
    pub name: String,
}

fn render_text(roster: &Roster) -> String {
    roster.iter().map(|admin| format!("{admin}\n")).collect()
}

fn render_csv(roster: &Roster) -> String {
    let mut out = String::from("ID,Name\r\n");
    for admin in roster {
        out.push_str(&admin.id.to_string());
        out.push(',');
        out.push_str(&csv_field(&admin.name));
        out.push_str("\r\n");
    }
    out
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

fn render_json(roster: &Roster) -> Result<String, ExportError> {
    let records: Vec<AdminRecord> = roster
        .iter()
        .map(|admin| AdminRecord {
            id: admin.id,
            name: admin.name.clone(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Writes `roster` to `destination` in `format`.
///
/// Rejects an empty roster before touching the filesystem. A failed
/// write may leave a partial file behind.
pub fn export(
    roster: &Roster,
    format: ExportFormat,
    destination: impl AsRef<Path>,
) -> Result<PathBuf, ExportError> {
    if roster.is_empty() {
        return Err(PreconditionError::EmptyRoster.into());
    }

    let path = destination.as_ref().to_path_buf();
    let content = format.render(roster)?;

    std::fs::write(&path, content).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    info!(
        "Exported {} admins as {} to {}",
        roster.len(),
        format,
        path.display()
    );
    Ok(path)
}
