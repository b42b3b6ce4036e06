//! In-memory [`ChatApi`] used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::api::{ChatApi, GroupInfo, GroupPeer, MemberRecord};
use super::TelegramError;
use crate::roster::Admin;

#[derive(Debug, Default)]
pub struct MockChat {
    groups: HashMap<String, (GroupInfo, Vec<MemberRecord>)>,
    hidden_admins: HashSet<String>,
    failing_recipients: HashSet<i64>,
    page_size: Option<usize>,
    pub resolved: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<(i64, String)>>,
    pub page_requests: Mutex<Vec<usize>>,
}

pub fn member(user_id: i64, first: &str, last: Option<&str>, is_bot: bool) -> MemberRecord {
    MemberRecord {
        user_id,
        access_hash: Some(user_id * 100),
        first_name: first.to_owned(),
        last_name: last.map(str::to_owned),
        is_bot,
    }
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, name: &str, member_count: u64, admins: Vec<MemberRecord>) -> Self {
        let id = i64::try_from(self.groups.len()).unwrap() + 1;
        let info = GroupInfo {
            id,
            title: format!("Group {name}"),
            member_count,
            peer: GroupPeer::Basic,
        };
        self.groups.insert(name.to_owned(), (info, admins));
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn with_hidden_admins(mut self, name: &str) -> Self {
        self.hidden_admins.insert(name.to_owned());
        self
    }

    pub fn failing_for(mut self, user_id: i64) -> Self {
        self.failing_recipients.insert(user_id);
        self
    }

    pub fn network_calls(&self) -> usize {
        self.resolved.lock().unwrap().len()
            + self.sent.lock().unwrap().len()
            + self.page_requests.lock().unwrap().len()
    }

    pub fn sent_to(&self) -> Vec<i64> {
        self.sent.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }
}

#[async_trait]
impl ChatApi for MockChat {
    async fn resolve_group(&self, identifier: &str) -> Result<GroupInfo, TelegramError> {
        self.resolved.lock().unwrap().push(identifier.to_owned());
        self.groups
            .get(identifier)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| TelegramError::ChatNotFound(identifier.to_owned()))
    }

    async fn admin_page(
        &self,
        group: &GroupInfo,
        offset: usize,
    ) -> Result<Vec<MemberRecord>, TelegramError> {
        self.page_requests.lock().unwrap().push(offset);

        let (name, (_, admins)) = self
            .groups
            .iter()
            .find(|(_, (info, _))| info.id == group.id)
            .ok_or_else(|| TelegramError::ChatNotFound(group.title.clone()))?;

        if self.hidden_admins.contains(name) {
            return Err(TelegramError::AdminsHidden(group.title.clone()));
        }

        let size = self.page_size.unwrap_or(admins.len().max(1));
        Ok(admins.iter().skip(offset).take(size).cloned().collect())
    }

    async fn send_text(&self, recipient: &Admin, text: &str) -> Result<(), TelegramError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.id, text.to_owned()));
        if self.failing_recipients.contains(&recipient.id) {
            return Err(TelegramError::Invocation("USER_IS_BLOCKED".to_owned()));
        }
        Ok(())
    }
}
