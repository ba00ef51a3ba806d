use crate::error::{BotError, Result};
use crate::secret::Secret;
use axum::http::HeaderMap;
use tokio::sync::watch;
use tracing::warn;

/// Header Telegram uses to echo the registration's `secret_token`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Checks inbound webhook calls against the registrar's current secret.
#[derive(Clone)]
pub struct InboundAuthenticator {
    current: watch::Receiver<Option<Secret>>,
}

impl InboundAuthenticator {
    pub fn new(current: watch::Receiver<Option<Secret>>) -> Self {
        Self { current }
    }

    /// True iff `claimed` is non-empty and equals the active secret.
    pub fn authenticate(&self, claimed: Option<&str>) -> bool {
        let Some(claimed) = claimed.filter(|c| !c.is_empty()) else {
            return false;
        };
        // Single read of the published value.
        let current = self.current.borrow();
        current.as_ref().is_some_and(|secret| secret.matches(claimed))
    }

    /// Authenticate a request by its headers, logging rejected calls with
    /// the full header set.
    pub fn check(&self, headers: &HeaderMap) -> Result<()> {
        let claimed = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if self.authenticate(claimed) {
            return Ok(());
        }

        warn!(
            claimed = claimed.unwrap_or("<missing>"),
            headers = ?header_dump(headers),
            "rejected webhook call with invalid secret token"
        );
        Err(BotError::AuthenticationFailed)
    }
}

fn header_dump(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect()
}
