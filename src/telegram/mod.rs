//! Telegram client wrapper module.
//!
//! Provides the chat primitives the admin pipeline needs, the grammers
//! implementation of them, sign-in helpers and rate limiting.

mod api;
mod client;
#[cfg(test)]
pub(crate) mod mock;
mod rate_limiter;

pub use api::{ChatApi, GroupInfo, GroupPeer, MemberRecord};
pub use client::{PwdToken as PasswordToken, TelegramClient, TelegramError, Token as LoginToken};
pub use rate_limiter::RateLimiter;
