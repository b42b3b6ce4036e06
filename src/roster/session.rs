//! The single active group and its roster.

use chrono::{DateTime, Utc};

use super::Roster;
use crate::telegram::GroupInfo;

/// Result of one successful fetch. Replaced wholesale, never merged.
#[derive(Debug, Clone)]
pub struct GroupSession {
    /// Identifier the user asked for.
    pub group: String,

    /// Title reported by Telegram.
    pub title: String,

    /// Total group membership at fetch time.
    pub member_count: u64,

    pub roster: Roster,

    pub fetched_at: DateTime<Utc>,
}

impl GroupSession {
    #[must_use]
    pub fn new(group: &str, info: &GroupInfo, roster: Roster) -> Self {
        Self {
            group: group.to_owned(),
            title: info.title.clone(),
            member_count: info.member_count,
            roster,
            fetched_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn admin_count(&self) -> usize {
        self.roster.len()
    }
}

/// Formats a count with comma thousands separators.
#[must_use]
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
