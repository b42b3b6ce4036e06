//! Messaging primitives the admin pipeline depends on.

use async_trait::async_trait;

use super::TelegramError;
use crate::roster::Admin;

/// How a resolved group is addressed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPeer {
    /// Legacy small group, addressed by id alone.
    Basic,
    /// Supergroup or broadcast channel.
    Channel { access_hash: i64 },
}

/// A resolved group or channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub id: i64,
    pub title: String,
    /// Total membership at resolution time.
    pub member_count: u64,
    pub peer: GroupPeer,
}

/// One entry of an administrator membership page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub user_id: i64,
    pub access_hash: Option<i64>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

/// Chat queries and message delivery used by the roster builder and the
/// broadcaster.
///
/// Every method is a single network round trip. Implementations must not
/// retry on their own.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Resolves a normalized username or numeric id to a group.
    async fn resolve_group(&self, identifier: &str) -> Result<GroupInfo, TelegramError>;

    /// Returns the administrators starting at `offset`.
    ///
    /// An empty page marks the end of the listing.
    async fn admin_page(
        &self,
        group: &GroupInfo,
        offset: usize,
    ) -> Result<Vec<MemberRecord>, TelegramError>;

    /// Sends a plain text message to a single user.
    async fn send_text(&self, recipient: &Admin, text: &str) -> Result<(), TelegramError>;
}
