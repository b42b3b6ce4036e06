//! Admin roster module.
//!
//! Resolves a group, collects its non-bot administrators in discovery
//! order and keeps the result as the active group session.

mod admin;
mod batch;
mod builder;
mod session;

pub use admin::{Admin, Roster, display_name};
pub use batch::{GroupOutcome, process_groups};
pub use builder::{FetchError, fetch_admins, fetch_group};
pub use session::{GroupSession, format_count};
