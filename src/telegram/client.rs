use crate::error::{BotError, Result};
use crate::telegram::types::{ApiResponse, SendMessage, SetWebhook};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info};

/// Minimal Bot API client: webhook management and `sendMessage`.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Status plus parsed envelope of one Bot API call.
struct ApiReply {
    status: StatusCode,
    body: ApiResponse,
}

impl ApiReply {
    fn accepted(&self) -> bool {
        self.status.is_success() && self.body.ok
    }

    fn describe(&self) -> String {
        let description = self
            .body
            .description
            .as_deref()
            .unwrap_or("no description");
        format!("{}: {description}", self.status)
    }
}

impl TelegramClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// `POST /bot{token}/setWebhook`.
    pub async fn set_webhook(&self, request: &SetWebhook) -> Result<()> {
        let reply = self.call("setWebhook", Some(request)).await?;
        if !reply.accepted() {
            return Err(BotError::RegistrationRejected(reply.describe()));
        }
        info!(
            url = %request.url,
            response = reply.body.description.as_deref().unwrap_or(""),
            "webhook has been set"
        );
        Ok(())
    }

    /// `POST /bot{token}/deleteWebhook` with an empty body.
    pub async fn delete_webhook(&self) -> Result<()> {
        let reply = self.call::<()>("deleteWebhook", None).await?;
        if !reply.accepted() {
            return Err(BotError::RegistrationRejected(reply.describe()));
        }
        info!(
            response = reply.body.description.as_deref().unwrap_or(""),
            "webhook has been deleted"
        );
        Ok(())
    }

    /// `POST /bot{token}/sendMessage`. Single attempt.
    pub async fn send_message(&self, message: &SendMessage) -> Result<()> {
        let reply = self.call("sendMessage", Some(message)).await?;
        if reply.status.is_client_error() || reply.status.is_server_error() {
            return Err(BotError::DeliveryRejected(reply.describe()));
        }
        debug!(chat_id = message.chat_id, "reply delivered");
        Ok(())
    }

    async fn call<B: Serialize>(&self, method: &str, body: Option<&B>) -> Result<ApiReply> {
        let mut request = self.client.post(self.method_url(method));
        if let Some(body) = body {
            request = request.json(body);
        }
        // Strip the URL from transport errors: it embeds the bot token.
        let resp = request.send().await.map_err(|e| e.without_url())?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| e.without_url())?;
        let body = serde_json::from_str::<ApiResponse>(&text).unwrap_or_else(|_| ApiResponse {
            description: (!text.is_empty()).then_some(text),
            ..ApiResponse::default()
        });
        Ok(ApiReply { status, body })
    }
}
