//! Telegram Bot API surface used by the bot: the inbound update envelope,
//! outbound message bodies, and the HTTP client for webhook management.

pub mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::{Message, ReplyMarkup, SendMessage, SetWebhook, Update, UpdateKind};
