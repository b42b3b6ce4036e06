//! Roster building: group resolution plus paged admin enumeration.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info};

use super::{Admin, GroupSession, Roster};
use crate::telegram::{ChatApi, GroupInfo, TelegramError};

/// Failure to resolve a group or list its administrators.
#[derive(Debug, Error)]
#[error("Failed to fetch admins for '{group}': {source}")]
pub struct FetchError {
    pub group: String,
    #[source]
    pub source: TelegramError,
}

impl FetchError {
    fn new(group: &str, source: TelegramError) -> Self {
        Self {
            group: group.to_owned(),
            source,
        }
    }
}

/// Fetches the non-bot administrators of a group.
pub async fn fetch_admins<C>(client: &C, group: &str) -> Result<Roster, FetchError>
where
    C: ChatApi + ?Sized,
{
    Ok(fetch_group(client, group).await?.roster)
}

/// Resolves a group and builds a fresh session for it.
///
/// Never touches any existing session; the caller decides whether to
/// adopt the result.
pub async fn fetch_group<C>(client: &C, group: &str) -> Result<GroupSession, FetchError>
where
    C: ChatApi + ?Sized,
{
    info!("Fetching group info for {}", group);

    let info = client
        .resolve_group(group)
        .await
        .map_err(|e| FetchError::new(group, e))?;

    let roster = collect_admins(client, &info)
        .await
        .map_err(|e| FetchError::new(group, e))?;

    info!(
        "Found {} admins in {} ({} members)",
        roster.len(),
        group,
        info.member_count
    );

    Ok(GroupSession::new(group, &info, roster))
}

/// Walks the admin pages until an empty one, skipping bots.
async fn collect_admins<C>(client: &C, group: &GroupInfo) -> Result<Roster, TelegramError>
where
    C: ChatApi + ?Sized,
{
    let mut roster = Roster::new();
    let mut seen = HashSet::new();
    let mut offset = 0;

    loop {
        let page = client.admin_page(group, offset).await?;
        if page.is_empty() {
            break;
        }
        offset += page.len();

        for record in &page {
            let Some(admin) = Admin::from_member(record) else {
                debug!("Skipping bot account {}", record.user_id);
                continue;
            };
            // A listing that shifts between pages can repeat an entry.
            if seen.insert(admin.id) {
                roster.push(admin);
            }
        }
    }

    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::mock::{MockChat, member};

    fn alpha() -> MockChat {
        MockChat::new().with_group(
            "alpha",
            50,
            vec![
                member(1, "A", None, false),
                member(2, "B", None, true),
                member(3, "C", Some("D"), false),
            ],
        )
    }

    #[tokio::test]
    async fn test_alpha_scenario() {
        let client = alpha();
        let session = fetch_group(&client, "alpha").await.unwrap();

        let admins: Vec<(i64, &str)> = session
            .roster
            .iter()
            .map(|a| (a.id, a.name.as_str()))
            .collect();
        assert_eq!(admins, vec![(1, "A"), (3, "C D")]);
        assert_eq!(session.member_count, 50);
        assert_eq!(session.group, "alpha");
    }

    #[tokio::test]
    async fn test_bots_never_in_roster() {
        let client = MockChat::new().with_group(
            "bots",
            10,
            vec![
                member(10, "Bot1", None, true),
                member(11, "Human", None, false),
                member(12, "Bot2", None, true),
            ],
        );

        let roster = fetch_admins(&client, "bots").await.unwrap();
        assert!(!roster.contains_id(10));
        assert!(!roster.contains_id(12));
        assert_eq!(roster.len(), 1);
    }

    #[tokio::test]
    async fn test_order_preserved_across_pages() {
        let members: Vec<_> = (1..=7)
            .rev()
            .map(|id| member(id, &format!("U{id}"), None, false))
            .collect();
        let client = MockChat::new()
            .with_group("paged", 100, members)
            .with_page_size(3);

        let roster = fetch_admins(&client, "paged").await.unwrap();
        let ids: Vec<i64> = roster.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(*client.page_requests.lock().unwrap(), vec![0, 3, 6, 7]);
    }

    #[tokio::test]
    async fn test_duplicate_ids_collapsed() {
        let client = MockChat::new().with_group(
            "dupes",
            5,
            vec![
                member(1, "A", None, false),
                member(1, "A", None, false),
                member(2, "B", None, false),
            ],
        );

        let roster = fetch_admins(&client, "dupes").await.unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_group_is_fetch_error() {
        let client = alpha();
        let err = fetch_admins(&client, "missing").await.unwrap_err();
        assert_eq!(err.group, "missing");
        assert!(matches!(err.source, TelegramError::ChatNotFound(_)));
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_fetch_error() {
        let client = alpha().with_hidden_admins("alpha");
        let err = fetch_group(&client, "alpha").await.unwrap_err();
        assert!(matches!(err.source, TelegramError::AdminsHidden(_)));
    }

    #[tokio::test]
    async fn test_second_fetch_reissues_query() {
        let client = alpha();
        fetch_admins(&client, "alpha").await.unwrap();
        fetch_admins(&client, "alpha").await.unwrap();
        assert_eq!(client.resolved.lock().unwrap().len(), 2);
    }
}
