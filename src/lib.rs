//! Admin Connect Library
//!
//! A console tool for working with the administrators of Telegram groups.
//!
//! This crate provides the core functionality for:
//! - Loading and validating Telegram API credentials
//! - Connecting to Telegram via `MTProto`
//! - Collecting the non-bot administrators of a group
//! - Messaging every admin with a fixed delay between sends
//! - Exporting admin lists as text, CSV or JSON

pub mod broadcast;
pub mod commands;
pub mod config;
pub mod roster;
pub mod telegram;
