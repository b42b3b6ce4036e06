//! Sequential, rate-limited message delivery to a roster.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::roster::{Admin, Roster};
use crate::telegram::{ChatApi, RateLimiter, TelegramError};

/// Input rejected before any I/O took place.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("No admins loaded. Please fetch admins first.")]
    EmptyRoster,

    #[error("Message cannot be empty")]
    EmptyMessage,
}

/// A single recipient could not be reached.
#[derive(Debug, Error)]
#[error("Failed to send message to {name}: {source}")]
pub struct DeliveryError {
    pub id: i64,
    pub name: String,
    #[source]
    pub source: TelegramError,
}

/// Result of the one delivery attempt made for a roster entry.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Sent { id: i64, name: String },
    Failed(DeliveryError),
}

impl DeliveryOutcome {
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    /// Display name of the recipient this outcome belongs to.
    #[must_use]
    pub fn recipient(&self) -> &str {
        match self {
            Self::Sent { name, .. } => name,
            Self::Failed(err) => &err.name,
        }
    }
}

/// Sent/failed totals of a finished or interrupted broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastSummary {
    pub sent: usize,
    pub failed: usize,
}

impl BroadcastSummary {
    #[must_use]
    pub fn from_outcomes(outcomes: &[DeliveryOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut summary, outcome| {
            if outcome.is_sent() {
                summary.sent += 1;
            } else {
                summary.failed += 1;
            }
            summary
        })
    }
}

/// Delivers a message to each admin in roster order, one at a time.
///
/// After every successful send the broadcaster pauses for the fixed
/// delay. A failed send is recorded and the next recipient is tried
/// immediately, without the pause.
#[derive(Debug)]
pub struct Broadcaster {
    limiter: RateLimiter,
}

impl Broadcaster {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            limiter: RateLimiter::new(delay),
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.limiter.interval()
    }

    /// Sends `message` to every admin in `roster`.
    ///
    /// `on_outcome` receives each outcome with its roster index as soon as
    /// it is known, so progress is visible even if the returned future is
    /// dropped part-way through.
    pub async fn broadcast<C, F>(
        &self,
        client: &C,
        roster: &Roster,
        message: &str,
        mut on_outcome: F,
    ) -> Result<Vec<DeliveryOutcome>, PreconditionError>
    where
        C: ChatApi + ?Sized,
        F: FnMut(usize, &DeliveryOutcome),
    {
        if roster.is_empty() {
            return Err(PreconditionError::EmptyRoster);
        }
        if message.is_empty() {
            return Err(PreconditionError::EmptyMessage);
        }

        info!("Broadcasting to {} admins", roster.len());

        let mut outcomes = Vec::with_capacity(roster.len());
        for (index, admin) in roster.iter().enumerate() {
            let outcome = deliver(client, admin, message).await;
            on_outcome(index, &outcome);

            let sent = outcome.is_sent();
            outcomes.push(outcome);

            if sent {
                self.limiter.cool_down().await;
            }
        }

        let summary = BroadcastSummary::from_outcomes(&outcomes);
        info!(
            "Broadcast finished: {} sent, {} failed",
            summary.sent, summary.failed
        );

        Ok(outcomes)
    }
}

/// Makes the single delivery attempt for one admin.
async fn deliver<C>(client: &C, admin: &Admin, message: &str) -> DeliveryOutcome
where
    C: ChatApi + ?Sized,
{
    match client.send_text(admin, message).await {
        Ok(()) => {
            info!("Sent to {}", admin.name);
            DeliveryOutcome::Sent {
                id: admin.id,
                name: admin.name.clone(),
            }
        }
        Err(source) => {
            let err = DeliveryError {
                id: admin.id,
                name: admin.name.clone(),
                source,
            };
            warn!("{}", err);
            DeliveryOutcome::Failed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::telegram::mock::MockChat;

    fn roster() -> Roster {
        Roster::from(vec![
            Admin::new(1, "Ana").with_access_hash(Some(1)),
            Admin::new(2, "Ben Lee").with_access_hash(Some(2)),
            Admin::new(3, "Cy").with_access_hash(Some(3)),
        ])
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let client = MockChat::new().failing_for(2);
        let broadcaster = Broadcaster::new(Duration::ZERO);

        let outcomes = broadcaster
            .broadcast(&client, &roster(), "hello", |_, _| {})
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_sent());
        assert!(matches!(&outcomes[1], DeliveryOutcome::Failed(e) if e.name == "Ben Lee"));
        assert!(outcomes[2].is_sent());
        assert_eq!(client.sent_to(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_outcomes_follow_roster_order() {
        let client = MockChat::new();
        let broadcaster = Broadcaster::new(Duration::ZERO);
        let mut seen = Vec::new();

        broadcaster
            .broadcast(&client, &roster(), "hello", |index, outcome| {
                seen.push((index, outcome.recipient().to_owned()));
            })
            .await
            .unwrap();

        assert_eq!(
            seen,
            vec![
                (0, "Ana".to_owned()),
                (1, "Ben Lee".to_owned()),
                (2, "Cy".to_owned())
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_roster_rejected_without_network() {
        let client = MockChat::new();
        let broadcaster = Broadcaster::new(Duration::ZERO);

        let result = broadcaster
            .broadcast(&client, &Roster::new(), "hello", |_, _| {})
            .await;

        assert_eq!(result.unwrap_err(), PreconditionError::EmptyRoster);
        assert_eq!(client.network_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_without_network() {
        let client = MockChat::new();
        let broadcaster = Broadcaster::new(Duration::ZERO);

        let result = broadcaster
            .broadcast(&client, &roster(), "", |_, _| {})
            .await;

        assert_eq!(result.unwrap_err(), PreconditionError::EmptyMessage);
        assert_eq!(client.network_calls(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_message_is_sent_as_is() {
        let client = MockChat::new();
        let broadcaster = Broadcaster::new(Duration::ZERO);

        let outcomes = broadcaster
            .broadcast(&client, &roster(), "  ", |_, _| {})
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(client.sent.lock().unwrap()[0].1, "  ");
    }

    #[tokio::test]
    async fn test_dropped_broadcast_keeps_reported_progress() {
        let client = MockChat::new();
        let broadcaster = Broadcaster::new(Duration::from_secs(5));
        let mut seen = Vec::new();

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            broadcaster.broadcast(&client, &roster(), "hello", |index, _| seen.push(index)),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(seen, vec![0]);
        assert_eq!(client.sent_to(), vec![1]);
    }

    #[tokio::test]
    async fn test_delay_only_after_success() {
        let delay = Duration::from_millis(40);
        let broadcaster = Broadcaster::new(delay);
        assert_eq!(broadcaster.delay(), delay);
        let all_fail = MockChat::new().failing_for(1).failing_for(2).failing_for(3);

        let started = Instant::now();
        let outcomes = broadcaster
            .broadcast(&all_fail, &roster(), "hi", |_, _| {})
            .await
            .unwrap();
        assert_eq!(BroadcastSummary::from_outcomes(&outcomes).failed, 3);
        assert!(started.elapsed() < delay * 3);

        let client = MockChat::new();
        let started = Instant::now();
        broadcaster
            .broadcast(&client, &roster(), "hi", |_, _| {})
            .await
            .unwrap();
        assert!(started.elapsed() >= delay * 3);
    }

    #[test]
    fn test_summary() {
        let outcomes = vec![
            DeliveryOutcome::Sent {
                id: 1,
                name: "A".to_owned(),
            },
            DeliveryOutcome::Failed(DeliveryError {
                id: 2,
                name: "B".to_owned(),
                source: TelegramError::FloodWait(30),
            }),
        ];
        assert_eq!(
            BroadcastSummary::from_outcomes(&outcomes),
            BroadcastSummary { sent: 1, failed: 1 }
        );
    }
}
