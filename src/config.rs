//! Process configuration, read once from the environment at startup.

use crate::error::{BotError, Result};
use crate::telegram::UpdateKind;
use std::env;

#[derive(Clone)]
pub struct Config {
    /// HTTP listen port (`PORT`).
    pub port: u16,
    /// Public base URL (`BASE_URL`). Unset selects the tunnel topology.
    pub base_url: Option<String>,
    /// Bot API base URL (`TELEGRAM_BASE_URL`).
    pub telegram_base_url: String,
    /// Bot token from BotFather (`TELEGRAM_TOKEN`).
    pub telegram_token: String,
    /// Shared secret for `/reset-hook` and `/delete-hook` (`PASSWORD`).
    pub admin_pass: String,
    /// Permissive CORS (`ENABLE_CORS=true`).
    pub enable_cors: bool,
    /// ngrok executable (`NGROK_BIN`).
    pub ngrok_bin: String,
    /// ngrok agent inspection API (`NGROK_API_URL`).
    pub ngrok_api_url: String,
    /// Update kinds subscribed to at registration (`ALLOWED_UPDATES`).
    pub allowed_updates: Vec<UpdateKind>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| BotError::Config(format!("PORT={raw:?}: {e}")))?,
            None => 3000,
        };

        let telegram_token = var("TELEGRAM_TOKEN")
            .ok_or_else(|| BotError::Config("TELEGRAM_TOKEN must be set".into()))?;

        let allowed_updates = match var("ALLOWED_UPDATES") {
            Some(raw) => parse_update_kinds(&raw)?,
            None => vec![UpdateKind::Message],
        };

        Ok(Self {
            port,
            base_url: var("BASE_URL").map(|u| u.trim().trim_end_matches('/').to_string()),
            telegram_base_url: var("TELEGRAM_BASE_URL")
                .unwrap_or_else(|| "https://api.telegram.org".into()),
            telegram_token,
            admin_pass: var("PASSWORD").unwrap_or_else(|| "admin".into()),
            enable_cors: var("ENABLE_CORS").is_some_and(|v| v == "true"),
            ngrok_bin: var("NGROK_BIN").unwrap_or_else(|| "ngrok".into()),
            ngrok_api_url: var("NGROK_API_URL").unwrap_or_else(|| "http://127.0.0.1:4040".into()),
            allowed_updates,
        })
    }
}

fn parse_update_kinds(raw: &str) -> Result<Vec<UpdateKind>> {
    let mut kinds = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let kind = UpdateKind::parse(tag)
            .ok_or_else(|| BotError::Config(format!("unknown update kind in ALLOWED_UPDATES: {tag}")))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        return Err(BotError::Config("ALLOWED_UPDATES lists no update kinds".into()));
    }
    Ok(kinds)
}
