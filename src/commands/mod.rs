//! Command handling module.
//!
//! Turns menu selections into commands and runs them against the active
//! group session.

mod handler;
mod types;

pub use handler::CommandHandler;
pub use types::{CommandResult, MenuCommand, MenuOption};
