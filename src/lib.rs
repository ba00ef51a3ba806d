//! Telegram bot server driven by an authenticated webhook.
//!
//! The [`registrar::Registrar`] owns the single active webhook registration
//! and its secret; [`verification::InboundAuthenticator`] checks every
//! inbound call against that secret; [`routing::UpdateRouter`] hands chat
//! messages to the reply pipeline on detached tasks.

pub mod config;
pub mod error;
pub mod http_server;
pub mod registrar;
pub mod reply;
pub mod routing;
pub mod secret;
pub mod telegram;
pub mod tunnel;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{BotError, Result};
