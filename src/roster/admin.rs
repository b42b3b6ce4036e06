//! Administrator records and the ordered roster.

use std::fmt;

use crate::telegram::MemberRecord;

/// A non-bot administrator of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    /// Telegram user id.
    pub id: i64,

    /// Display name, `first` or `first last`.
    pub name: String,

    /// Hash needed to address the user; never exported.
    access_hash: Option<i64>,
}

impl Admin {
    /// Creates an admin without addressing information.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            access_hash: None,
        }
    }

    /// Attaches the access hash used when messaging this admin.
    #[must_use]
    pub const fn with_access_hash(mut self, access_hash: Option<i64>) -> Self {
        self.access_hash = access_hash;
        self
    }

    #[must_use]
    pub const fn access_hash(&self) -> Option<i64> {
        self.access_hash
    }

    /// Builds an admin from a membership record, or `None` for bots.
    #[must_use]
    pub fn from_member(record: &MemberRecord) -> Option<Self> {
        if record.is_bot {
            return None;
        }

        Some(
            Self::new(
                record.user_id,
                display_name(&record.first_name, record.last_name.as_deref()),
            )
            .with_access_hash(record.access_hash),
        )
    }
}

impl fmt::Display for Admin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {})", self.name, self.id)
    }
}

/// Composes `first_name` with an optional, non-empty `last_name`.
#[must_use]
pub fn display_name(first_name: &str, last_name: Option<&str>) -> String {
    match last_name {
        Some(last) if !last.is_empty() => format!("{first_name} {last}"),
        _ => first_name.to_owned(),
    }
}

/// Administrators of one group in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    admins: Vec<Admin>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an admin, keeping discovery order.
    pub fn push(&mut self, admin: Admin) {
        self.admins.push(admin);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Admin> {
        self.admins.iter()
    }

    #[must_use]
    pub fn contains_id(&self, id: i64) -> bool {
        self.admins.iter().any(|admin| admin.id == id)
    }
}

impl From<Vec<Admin>> for Roster {
    fn from(admins: Vec<Admin>) -> Self {
        Self { admins }
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Admin;
    type IntoIter = std::slice::Iter<'a, Admin>;

    fn into_iter(self) -> Self::IntoIter {
        self.admins.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::mock::member;

    #[test]
    fn test_display_name_first_only() {
        assert_eq!(display_name("Ana", None), "Ana");
    }

    #[test]
    fn test_display_name_first_and_last() {
        assert_eq!(display_name("Ana", Some("Lee")), "Ana Lee");
    }

    #[test]
    fn test_display_name_empty_last_is_ignored() {
        assert_eq!(display_name("Ana", Some("")), "Ana");
    }

    #[test]
    fn test_from_member_skips_bots() {
        assert!(Admin::from_member(&member(7, "Helper", None, true)).is_none());

        let admin = Admin::from_member(&member(8, "Ana", Some("Lee"), false)).unwrap();
        assert_eq!(admin.id, 8);
        assert_eq!(admin.name, "Ana Lee");
        assert_eq!(admin.access_hash(), Some(800));
    }

    #[test]
    fn test_admin_display() {
        assert_eq!(Admin::new(42, "Ana").to_string(), "Ana (ID: 42)");
    }

    #[test]
    fn test_roster_keeps_insertion_order() {
        let mut roster = Roster::new();
        roster.push(Admin::new(3, "C"));
        roster.push(Admin::new(1, "A"));

        let ids: Vec<i64> = roster.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert!(roster.contains_id(1));
        assert!(!roster.contains_id(2));
    }
}
