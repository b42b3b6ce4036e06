//! Batch mode: fetch a list of groups one after another.
//!
//! Each successful fetch replaces the active session, so only the last
//! loaded group remains available for broadcasting or export afterwards.

use tracing::{info, warn};

use super::{FetchError, GroupSession, fetch_group};
use crate::telegram::{ChatApi, RateLimiter};

/// What happened to one group of a batch.
#[derive(Debug)]
pub enum GroupOutcome {
    Loaded {
        group: String,
        member_count: u64,
        admin_count: usize,
    },
    Failed(FetchError),
}

impl GroupOutcome {
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    #[must_use]
    pub fn group(&self) -> &str {
        match self {
            Self::Loaded { group, .. } => group,
            Self::Failed(err) => &err.group,
        }
    }
}

/// Fetches each group in order, spacing fetches with `limiter`.
///
/// A failure is reported and processing moves on to the next group.
/// `on_outcome` sees every outcome as soon as it is known.
pub async fn process_groups<C, F>(
    client: &C,
    groups: &[String],
    limiter: &RateLimiter,
    session: &mut Option<GroupSession>,
    mut on_outcome: F,
) -> Vec<GroupOutcome>
where
    C: ChatApi + ?Sized,
    F: FnMut(&GroupOutcome),
{
    let mut outcomes = Vec::with_capacity(groups.len());

    for group in groups {
        limiter.wait_and_acquire().await;

        let outcome = match fetch_group(client, group).await {
            Ok(fetched) => {
                let outcome = GroupOutcome::Loaded {
                    group: group.clone(),
                    member_count: fetched.member_count,
                    admin_count: fetched.admin_count(),
                };
                *session = Some(fetched);
                outcome
            }
            Err(err) => {
                warn!("{}", err);
                GroupOutcome::Failed(err)
            }
        };

        on_outcome(&outcome);
        outcomes.push(outcome);
    }

    let loaded = outcomes.iter().filter(|o| o.is_loaded()).count();
    info!("Batch finished: {}/{} groups loaded", loaded, groups.len());

    outcomes
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::config::parse_groups;
    use crate::telegram::mock::{MockChat, member};

    fn client() -> MockChat {
        MockChat::new()
            .with_group("grp1", 20, vec![member(1, "A", None, false)])
            .with_group(
                "grp2",
                30,
                vec![member(2, "B", None, false), member(3, "C", None, false)],
            )
    }

    #[tokio::test]
    async fn test_batch_file_scenario() {
        let client = client();
        let groups = parse_groups("@grp1\n\ngrp2\n");
        let limiter = RateLimiter::new(Duration::ZERO);
        let mut session = None;

        let outcomes = process_groups(&client, &groups, &limiter, &mut session, |_| {}).await;

        assert_eq!(*client.resolved.lock().unwrap(), vec!["grp1", "grp2"]);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(GroupOutcome::is_loaded));

        let session = session.unwrap();
        assert_eq!(session.group, "grp2");
        assert_eq!(session.admin_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_does_not_halt_batch() {
        let client = client();
        let groups = vec!["grp1".to_owned(), "nope".to_owned(), "grp2".to_owned()];
        let limiter = RateLimiter::new(Duration::ZERO);
        let mut session = None;
        let mut seen = Vec::new();

        let outcomes = process_groups(&client, &groups, &limiter, &mut session, |o| {
            seen.push(o.group().to_owned());
        })
        .await;

        assert_eq!(seen, vec!["grp1", "nope", "grp2"]);
        assert!(outcomes[0].is_loaded());
        assert!(matches!(&outcomes[1], GroupOutcome::Failed(e) if e.group == "nope"));
        assert!(outcomes[2].is_loaded());
    }

    #[tokio::test]
    async fn test_failed_last_group_keeps_previous_session() {
        let client = client();
        let groups = vec!["grp1".to_owned(), "nope".to_owned()];
        let limiter = RateLimiter::new(Duration::ZERO);
        let mut session = None;

        process_groups(&client, &groups, &limiter, &mut session, |_| {}).await;

        assert_eq!(session.unwrap().group, "grp1");
    }

    #[tokio::test]
    async fn test_fetches_are_spaced() {
        let client = client();
        let groups = vec!["grp1".to_owned(), "grp2".to_owned()];
        let limiter = RateLimiter::new(Duration::from_millis(40));
        let mut session = None;

        let started = Instant::now();
        process_groups(&client, &groups, &limiter, &mut session, |_| {}).await;
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
