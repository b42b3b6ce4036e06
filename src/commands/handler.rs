//! Command handler implementation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::types::{CommandResult, MenuCommand};
use crate::broadcast::{
    BroadcastSummary, Broadcaster, DeliveryOutcome, ExportFormat, PreconditionError, export,
};
use crate::config::{load_groups, normalize_group_identifier};
use crate::roster::{GroupOutcome, GroupSession, fetch_group, format_count, process_groups};
use crate::telegram::{ChatApi, RateLimiter};

/// Runs menu commands and owns the active group session.
pub struct CommandHandler<C: ?Sized> {
    /// Chat client shared with the caller.
    client: Arc<C>,

    /// Group loaded by the last successful fetch.
    session: Option<GroupSession>,

    /// Delivers broadcasts with the fixed delay.
    broadcaster: Broadcaster,

    /// Spaces group fetches in batch mode.
    fetch_limiter: RateLimiter,
}

impl<C> CommandHandler<C>
where
    C: ChatApi + ?Sized,
{
    /// Creates a handler with no active group.
    #[must_use]
    pub fn new(client: Arc<C>, delay: Duration) -> Self {
        Self {
            client,
            session: None,
            broadcaster: Broadcaster::new(delay),
            fetch_limiter: RateLimiter::new(delay),
        }
    }

    /// The active group session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&GroupSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn has_group(&self) -> bool {
        self.session.is_some()
    }

    /// Executes a command, reporting intermediate steps through `progress`.
    pub async fn execute<F>(&mut self, command: MenuCommand, progress: F) -> CommandResult
    where
        F: FnMut(String),
    {
        debug!("Handling command: {}", command);

        let result = match command {
            MenuCommand::FetchGroup(group) => self.handle_fetch(&group).await,
            MenuCommand::LoadGroups(path) => self.handle_load(&path, progress).await,
            MenuCommand::SendMessage(message) => self.handle_send(&message, progress).await,
            MenuCommand::Export(format) => self.handle_export(format, &format.default_path()),
            MenuCommand::Save(path) => self.handle_export(ExportFormat::Text, &path),
            MenuCommand::LeaveGroup => self.handle_leave(),
        };

        info!("Command result: success={}", result.success);
        result
    }

    async fn handle_fetch(&mut self, raw: &str) -> CommandResult {
        let group = normalize_group_identifier(raw);
        if group.is_empty() {
            return CommandResult::error("Group identifier cannot be empty");
        }

        match fetch_group(self.client.as_ref(), &group).await {
            Ok(session) => {
                let message = format!(
                    "Loaded {} admins from {} ({} members)",
                    session.admin_count(),
                    session.group,
                    format_count(session.member_count)
                );
                self.session = Some(session);
                CommandResult::success(message)
            }
            Err(e) => {
                warn!("{}", e);
                CommandResult::error(format!("Error fetching group info: {e}"))
            }
        }
    }

    async fn handle_load<F>(&mut self, path: &Path, mut progress: F) -> CommandResult
    where
        F: FnMut(String),
    {
        let groups = match load_groups(path) {
            Ok(groups) => groups,
            Err(e) => {
                warn!("{}", e);
                return CommandResult::error(format!("Error reading file: {e}"));
            }
        };

        if groups.is_empty() {
            return CommandResult::error(format!("No groups found in {}", path.display()));
        }

        let total = groups.len();
        let outcomes = process_groups(
            self.client.as_ref(),
            &groups,
            &self.fetch_limiter,
            &mut self.session,
            |outcome| {
                progress(match outcome {
                    GroupOutcome::Loaded {
                        group,
                        member_count,
                        admin_count,
                    } => format!(
                        "{group}: {admin_count} admins ({} members)",
                        format_count(*member_count)
                    ),
                    GroupOutcome::Failed(e) => e.to_string(),
                });
            },
        )
        .await;

        let loaded = outcomes.iter().filter(|o| o.is_loaded()).count();
        let active = self
            .session
            .as_ref()
            .map_or_else(|| "none".to_owned(), |s| s.group.clone());
        let message = format!("Loaded {loaded} of {total} groups. Active group: {active}");

        if loaded == 0 {
            CommandResult::error(message)
        } else {
            CommandResult::success(message)
        }
    }

    async fn handle_send<F>(&self, message: &str, mut progress: F) -> CommandResult
    where
        F: FnMut(String),
    {
        let Some(session) = &self.session else {
            return CommandResult::error(PreconditionError::EmptyRoster.to_string());
        };

        let total = session.admin_count();
        let result = self
            .broadcaster
            .broadcast(self.client.as_ref(), &session.roster, message, |_, outcome| {
                progress(match outcome {
                    DeliveryOutcome::Sent { name, .. } => format!("Sent to {name}"),
                    DeliveryOutcome::Failed(e) => e.to_string(),
                });
            })
            .await;

        match result {
            Ok(outcomes) => {
                let summary = BroadcastSummary::from_outcomes(&outcomes);
                let message = format!(
                    "Sent to {} of {total} admins ({} failed)",
                    summary.sent, summary.failed
                );
                if summary.sent == 0 {
                    CommandResult::error(message)
                } else {
                    CommandResult::success(message)
                }
            }
            Err(e) => CommandResult::error(e.to_string()),
        }
    }

    fn handle_export(&self, format: ExportFormat, path: &Path) -> CommandResult {
        let Some(session) = &self.session else {
            return CommandResult::error(PreconditionError::EmptyRoster.to_string());
        };

        match export(&session.roster, format, path) {
            Ok(written) if format == ExportFormat::Text => {
                CommandResult::success(format!("Admins saved to {}", written.display()))
            }
            Ok(written) => {
                CommandResult::success(format!("Data exported to {}", written.display()))
            }
            Err(e) => {
                warn!("{}", e);
                CommandResult::error(format!("Error exporting data: {e}"))
            }
        }
    }

    fn handle_leave(&mut self) -> CommandResult {
        match self.session.take() {
            Some(session) => {
                CommandResult::success(format!("Successfully cleared group: {}", session.group))
            }
            None => CommandResult::error("No group is currently loaded"),
        }
    }
}

impl<C: ?Sized> std::fmt::Debug for CommandHandler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("session", &self.session)
            .field("broadcaster", &self.broadcaster)
            .finish_non_exhaustive()
    }
}
