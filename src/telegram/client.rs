//! grammers-backed implementation of the chat primitives.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use grammers_client::client::{LoginToken, PasswordToken};
use grammers_client::{Client, InvocationError, SenderPool, SignInError, sender};
use grammers_session::storages::SqliteSession;
use grammers_tl_types as tl;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::api::{ChatApi, GroupInfo, GroupPeer, MemberRecord};
use crate::config::TelegramConfig;
use crate::roster::Admin;

/// Re-export types for external use.
pub use grammers_client::client::{LoginToken as Token, PasswordToken as PwdToken};

/// Largest page `channels.getParticipants` will return.
const PARTICIPANTS_PAGE_LIMIT: i32 = 200;

/// Dialogs scanned when a group is addressed by numeric id.
const DIALOG_SCAN_LIMIT: i32 = 100;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Sign in failed: {0}")]
    SignInFailed(String),

    #[error("Password required for 2FA")]
    PasswordRequired(PasswordToken),

    #[error("Invalid password")]
    InvalidPassword(PasswordToken),

    #[error("Group not found: {0}")]
    ChatNotFound(String),

    #[error("'{0}' is a user, not a group or channel")]
    NotAGroup(String),

    #[error("Administrator list is not accessible for {0}")]
    AdminsHidden(String),

    #[error("Cannot address user {0}: access hash unknown")]
    PeerUnavailable(i64),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API invocation error: {0}")]
    Invocation(String),
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        let err_str = err.to_string();

        // Check for flood wait errors
        if (err_str.contains("FLOOD_WAIT") || err_str.contains("flood"))
            && let Some(seconds) = extract_flood_wait_seconds(&err_str)
        {
            return Self::FloodWait(seconds);
        }

        Self::Invocation(err_str)
    }
}

/// Extracts flood wait seconds from an error message.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let patterns = ["FLOOD_WAIT_", "flood wait "];

    for pattern in patterns {
        if let Some(idx) = err_msg.find(pattern) {
            let start = idx + pattern.len();
            let num_str: String = err_msg[start..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(seconds) = num_str.parse() {
                return Some(seconds);
            }
        }
    }
    None
}

/// Maps resolution failures that mean "no such group" to [`TelegramError::ChatNotFound`].
fn resolve_error(identifier: &str, err: InvocationError) -> TelegramError {
    let err_str = err.to_string();
    if err_str.contains("USERNAME_NOT_OCCUPIED")
        || err_str.contains("USERNAME_INVALID")
        || err_str.contains("CHANNEL_INVALID")
        || err_str.contains("CHANNEL_PRIVATE")
    {
        return TelegramError::ChatNotFound(identifier.to_owned());
    }
    err.into()
}

/// High-level Telegram client wrapper.
pub struct TelegramClient {
    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// Background task running the sender pool.
    _pool_task: JoinHandle<()>,
}

impl TelegramClient {
    /// Connects to Telegram with the given configuration.
    pub async fn connect(config: &TelegramConfig) -> Result<Self, TelegramError> {
        info!("Connecting to Telegram...");

        let session = Arc::new(
            SqliteSession::open(&config.session_path)
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates: _updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), config.api_id);

        let client = Client::new(handle.clone());

        // Spawn the sender pool runner
        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let is_authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        info!("Connected to Telegram. Authorized: {}", is_authorized);

        Ok(Self {
            client,
            handle: handle.thin,
            _pool_task: pool_task,
        })
    }

    /// Checks if the client is authorized.
    pub async fn is_authorized(&self) -> Result<bool, TelegramError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))
    }

    /// Requests a login code to be sent to the phone number.
    pub async fn request_login_code(
        &self,
        phone: &str,
        api_hash: &str,
    ) -> Result<LoginToken, TelegramError> {
        info!("Requesting login code for phone: {}...", mask_phone(phone));

        self.client
            .request_login_code(phone, api_hash)
            .await
            .map_err(|e| TelegramError::SignInFailed(e.to_string()))
    }

    /// Signs in with the login code.
    pub async fn sign_in(&self, token: &LoginToken, code: &str) -> Result<(), TelegramError> {
        info!("Signing in with login code...");

        match self.client.sign_in(token, code).await {
            Ok(_user) => {
                info!("Successfully signed in!");
                Ok(())
            }
            Err(SignInError::PasswordRequired(password_token)) => {
                debug!("2FA password required, hint: {:?}", password_token.hint());
                Err(TelegramError::PasswordRequired(password_token))
            }
            Err(SignInError::InvalidCode) => {
                Err(TelegramError::SignInFailed("Invalid code".to_owned()))
            }
            Err(e) => Err(TelegramError::SignInFailed(e.to_string())),
        }
    }

    /// Checks the 2FA password.
    pub async fn check_password(
        &self,
        password_token: PasswordToken,
        password: &str,
    ) -> Result<(), TelegramError> {
        info!("Checking 2FA password...");

        match self.client.check_password(password_token, password).await {
            Ok(_user) => {
                info!("Successfully authenticated with 2FA!");
                Ok(())
            }
            Err(SignInError::InvalidPassword(token)) => Err(TelegramError::InvalidPassword(token)),
            Err(e) => Err(TelegramError::SignInFailed(e.to_string())),
        }
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting from Telegram...");
        self.handle.quit();
    }

    /// Resolves a public username through `contacts.resolveUsername`.
    async fn resolve_username(&self, username: &str) -> Result<GroupInfo, TelegramError> {
        let request = tl::functions::contacts::ResolveUsername {
            username: username.to_owned(),
            referer: None,
        };

        let tl::enums::contacts::ResolvedPeer::Peer(resolved) = self
            .client
            .invoke(&request)
            .await
            .map_err(|e| resolve_error(username, e))?;

        let chat_id = match resolved.peer {
            tl::enums::Peer::Channel(peer) => peer.channel_id,
            tl::enums::Peer::Chat(peer) => peer.chat_id,
            tl::enums::Peer::User(_) => return Err(TelegramError::NotAGroup(username.to_owned())),
        };

        resolved
            .chats
            .iter()
            .filter_map(group_from_chat)
            .find(|group| group.id == chat_id)
            .ok_or_else(|| TelegramError::ChatNotFound(username.to_owned()))
    }

    /// Finds a group the account already belongs to by its numeric id.
    ///
    /// Only the most recent dialogs are scanned; numeric ids of groups the
    /// account has not talked in lately will not resolve.
    async fn resolve_numeric(
        &self,
        identifier: &str,
        candidates: &[i64],
    ) -> Result<GroupInfo, TelegramError> {
        let request = tl::functions::messages::GetDialogs {
            exclude_pinned: false,
            folder_id: None,
            offset_date: 0,
            offset_id: 0,
            offset_peer: tl::enums::InputPeer::Empty,
            limit: DIALOG_SCAN_LIMIT,
            hash: 0,
        };

        let chats = match self.client.invoke(&request).await? {
            tl::enums::messages::Dialogs::Dialogs(dialogs) => dialogs.chats,
            tl::enums::messages::Dialogs::Slice(dialogs) => dialogs.chats,
            tl::enums::messages::Dialogs::NotModified(_) => Vec::new(),
        };

        let groups: Vec<GroupInfo> = chats.iter().filter_map(group_from_chat).collect();
        pick_numeric(&groups, candidates)
            .ok_or_else(|| TelegramError::ChatNotFound(identifier.to_owned()))
    }

    /// Fetches the up-to-date member count of a channel.
    async fn channel_member_count(
        &self,
        channel_id: i64,
        access_hash: i64,
    ) -> Result<Option<u64>, TelegramError> {
        let request = tl::functions::channels::GetFullChannel {
            channel: input_channel(channel_id, access_hash),
        };

        let tl::enums::messages::ChatFull::Full(full) = self.client.invoke(&request).await?;
        match full.full_chat {
            tl::enums::ChatFull::ChannelFull(channel) => Ok(channel
                .participants_count
                .and_then(|count| u64::try_from(count).ok())),
            tl::enums::ChatFull::Full(_) => Ok(None),
        }
    }

    async fn basic_group_admins(&self, group: &GroupInfo) -> Result<Vec<MemberRecord>, TelegramError> {
        let request = tl::functions::messages::GetFullChat { chat_id: group.id };
        let tl::enums::messages::ChatFull::Full(full) = self.client.invoke(&request).await?;

        let tl::enums::ChatFull::Full(chat_full) = full.full_chat else {
            return Err(TelegramError::AdminsHidden(group.title.clone()));
        };

        let tl::enums::ChatParticipants::Participants(participants) = chat_full.participants else {
            return Err(TelegramError::AdminsHidden(group.title.clone()));
        };

        let admin_ids = participants
            .participants
            .iter()
            .filter_map(|participant| match participant {
                tl::enums::ChatParticipant::Creator(p) => Some(p.user_id),
                tl::enums::ChatParticipant::Admin(p) => Some(p.user_id),
                tl::enums::ChatParticipant::Participant(_) => None,
            });

        Ok(member_records(admin_ids, &full.users))
    }

    async fn channel_admins(
        &self,
        group: &GroupInfo,
        access_hash: i64,
        offset: usize,
    ) -> Result<Vec<MemberRecord>, TelegramError> {
        let request = tl::functions::channels::GetParticipants {
            channel: input_channel(group.id, access_hash),
            filter: tl::enums::ChannelParticipantsFilter::ChannelParticipantsAdmins,
            offset: i32::try_from(offset).unwrap_or(i32::MAX),
            limit: PARTICIPANTS_PAGE_LIMIT,
            hash: 0,
        };

        let page = match self.client.invoke(&request).await {
            Ok(tl::enums::channels::ChannelParticipants::Participants(page)) => page,
            Ok(tl::enums::channels::ChannelParticipants::NotModified) => return Ok(Vec::new()),
            Err(e) if e.to_string().contains("CHAT_ADMIN_REQUIRED") => {
                return Err(TelegramError::AdminsHidden(group.title.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let admin_ids = page
            .participants
            .iter()
            .filter_map(|participant| match participant {
                tl::enums::ChannelParticipant::Creator(p) => Some(p.user_id),
                tl::enums::ChannelParticipant::Admin(p) => Some(p.user_id),
                _ => None,
            });

        Ok(member_records(admin_ids, &page.users))
    }
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn resolve_group(&self, identifier: &str) -> Result<GroupInfo, TelegramError> {
        debug!("Resolving group {}", identifier);

        let mut group = match numeric_candidates(identifier) {
            Some(ids) => self.resolve_numeric(identifier, &ids).await?,
            None => self.resolve_username(identifier).await?,
        };

        if let GroupPeer::Channel { access_hash } = group.peer
            && let Some(count) = self.channel_member_count(group.id, access_hash).await?
        {
            group.member_count = count;
        }

        info!(
            "Resolved {} to \"{}\" ({} members)",
            identifier, group.title, group.member_count
        );
        Ok(group)
    }

    async fn admin_page(
        &self,
        group: &GroupInfo,
        offset: usize,
    ) -> Result<Vec<MemberRecord>, TelegramError> {
        match group.peer {
            // Basic groups return every participant in one response.
            GroupPeer::Basic if offset > 0 => Ok(Vec::new()),
            GroupPeer::Basic => self.basic_group_admins(group).await,
            GroupPeer::Channel { access_hash } => {
                self.channel_admins(group, access_hash, offset).await
            }
        }
    }

    async fn send_text(&self, recipient: &Admin, text: &str) -> Result<(), TelegramError> {
        let access_hash = recipient
            .access_hash()
            .ok_or(TelegramError::PeerUnavailable(recipient.id))?;

        debug!(
            "Sending \"{}\" to {}",
            truncate_for_log(text, 30),
            recipient.name
        );

        let request = tl::functions::messages::SendMessage {
            no_webpage: false,
            silent: false,
            background: false,
            clear_draft: false,
            noforwards: false,
            update_stickersets_order: false,
            invert_media: false,
            allow_paid_floodskip: false,
            peer: tl::enums::InputPeer::User(tl::types::InputPeerUser {
                user_id: recipient.id,
                access_hash,
            }),
            reply_to: None,
            message: text.to_owned(),
            random_id: rand::random(),
            reply_markup: None,
            entities: None,
            schedule_date: None,
            schedule_repeat_period: None,
            send_as: None,
            quick_reply_shortcut: None,
            effect: None,
            allow_paid_stars: None,
            suggested_post: None,
            rich_message: None,
        };

        self.client.invoke(&request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

fn input_channel(channel_id: i64, access_hash: i64) -> tl::enums::InputChannel {
    tl::enums::InputChannel::Channel(tl::types::InputChannel {
        channel_id,
        access_hash,
    })
}

/// Converts a chat object into a group when it is one we can query.
fn group_from_chat(chat: &tl::enums::Chat) -> Option<GroupInfo> {
    match chat {
        tl::enums::Chat::Chat(chat) => Some(GroupInfo {
            id: chat.id,
            title: chat.title.clone(),
            member_count: u64::try_from(chat.participants_count).unwrap_or(0),
            peer: GroupPeer::Basic,
        }),
        tl::enums::Chat::Channel(channel) => Some(GroupInfo {
            id: channel.id,
            title: channel.title.clone(),
            member_count: channel
                .participants_count
                .and_then(|count| u64::try_from(count).ok())
                .unwrap_or(0),
            peer: GroupPeer::Channel {
                access_hash: channel.access_hash?,
            },
        }),
        _ => None,
    }
}

/// Joins participant ids with their user objects, keeping participant order.
fn member_records(
    ids: impl IntoIterator<Item = i64>,
    users: &[tl::enums::User],
) -> Vec<MemberRecord> {
    let users: HashMap<i64, &tl::types::User> = users
        .iter()
        .filter_map(|user| match user {
            tl::enums::User::User(user) => Some((user.id, user)),
            tl::enums::User::Empty(_) => None,
        })
        .collect();

    ids.into_iter()
        .filter_map(|id| users.get(&id))
        .map(|user| MemberRecord {
            user_id: user.id,
            access_hash: user.access_hash,
            first_name: user.first_name.clone().unwrap_or_default(),
            last_name: user.last_name.clone(),
            is_bot: user.bot,
        })
        .collect()
}

/// Parses a numeric group reference into the ids it may stand for.
///
/// `-100123` is channel `123` in the `-100`-prefixed channel form, but it
/// is also a valid basic group id (`100123`) in the negative form. Both
/// readings are returned, channel first. `None` means the identifier is
/// not a usable number and should be treated as a username.
fn numeric_candidates(identifier: &str) -> Option<Vec<i64>> {
    let value: i64 = identifier.parse().ok()?;

    let mut candidates = Vec::with_capacity(2);
    if let Some(channel_id) = identifier
        .strip_prefix("-100")
        .and_then(|rest| rest.parse::<i64>().ok())
        .filter(|id| *id > 0)
    {
        candidates.push(channel_id);
    }
    if let Some(id) = value.checked_abs().filter(|id| *id > 0) {
        candidates.push(id);
    }

    (!candidates.is_empty()).then_some(candidates)
}

/// First group matching a candidate id, in candidate order.
fn pick_numeric(groups: &[GroupInfo], candidates: &[i64]) -> Option<GroupInfo> {
    candidates
        .iter()
        .find_map(|id| groups.iter().find(|group| group.id == *id))
        .cloned()
}

/// Masks a phone number for logging (shows last 4 digits).
fn mask_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() > 4 {
        format!("***{}", &digits[digits.len() - 4..])
    } else {
        "****".to_owned()
    }
}

/// Truncates a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("+1234567890"), "***7890");
        assert_eq!(mask_phone("123"), "****");
        assert_eq!(mask_phone("+7 (999) 123-45-67"), "***4567");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("Hello", 10), "Hello");
        assert_eq!(truncate_for_log("Hello, World!", 5), "Hello...");
    }

    #[test]
    fn test_extract_flood_wait() {
        assert_eq!(extract_flood_wait_seconds("FLOOD_WAIT_120"), Some(120));
        assert_eq!(extract_flood_wait_seconds("flood wait 60 seconds"), Some(60));
        assert_eq!(extract_flood_wait_seconds("some other error"), None);
    }

    #[test]
    fn test_extract_flood_wait_non_ascii_text() {
        // Lowercasing 'İ' changes its byte length.
        assert_eq!(extract_flood_wait_seconds("İİİ flood wait 5"), Some(5));
        assert_eq!(
            extract_flood_wait_seconds("ошибка: FLOOD_WAIT_30 (ожидание)"),
            Some(30)
        );
        assert_eq!(extract_flood_wait_seconds("İİİİİİİİİİ"), None);
    }

    #[test]
    fn test_numeric_candidates() {
        assert_eq!(
            numeric_candidates("-1001234567890"),
            Some(vec![1_234_567_890, 1_001_234_567_890])
        );
        assert_eq!(numeric_candidates("-4242"), Some(vec![4242]));
        assert_eq!(numeric_candidates("777"), Some(vec![777]));
        assert_eq!(numeric_candidates("-1000"), Some(vec![1000]));
        assert_eq!(numeric_candidates("rustlang"), None);
        assert_eq!(numeric_candidates("0"), None);
    }

    #[test]
    fn test_numeric_candidates_min_value_is_not_numeric() {
        assert_eq!(numeric_candidates("-9223372036854775808"), None);
        assert_eq!(
            numeric_candidates("9223372036854775807"),
            Some(vec![i64::MAX])
        );
    }

    fn group(id: i64, peer: GroupPeer) -> GroupInfo {
        GroupInfo {
            id,
            title: format!("g{id}"),
            member_count: 0,
            peer,
        }
    }

    #[test]
    fn test_pick_numeric_falls_back_to_basic_group() {
        let dialogs = vec![group(100_123_456, GroupPeer::Basic)];
        let ids = numeric_candidates("-100123456").unwrap();

        assert_eq!(pick_numeric(&dialogs, &ids).unwrap().id, 100_123_456);
    }

    #[test]
    fn test_pick_numeric_prefers_channel() {
        let dialogs = vec![
            group(100_123_456, GroupPeer::Basic),
            group(123_456, GroupPeer::Channel { access_hash: 9 }),
        ];
        let ids = numeric_candidates("-100123456").unwrap();

        assert_eq!(pick_numeric(&dialogs, &ids).unwrap().id, 123_456);
        assert!(pick_numeric(&dialogs, &[5]).is_none());
    }
}
