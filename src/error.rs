use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Failures surfaced by the webhook lifecycle and the reply path.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// The tunnel agent could not be started or never produced a public URL.
    #[error("tunnel unavailable: {0}")]
    TunnelUnavailable(String),

    /// Telegram refused the webhook URL or secret.
    #[error("webhook registration rejected: {0}")]
    RegistrationRejected(String),

    /// Inbound secret token missing or different from the active one.
    #[error("inbound secret token does not match the active registration")]
    AuthenticationFailed,

    /// Telegram answered `sendMessage` with an error status.
    #[error("reply delivery rejected: {0}")]
    DeliveryRejected(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BotError>;

impl BotError {
    /// Stable machine-readable tag used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            BotError::TunnelUnavailable(_) => "tunnel_unavailable",
            BotError::RegistrationRejected(_) => "registration_rejected",
            BotError::AuthenticationFailed => "authentication_failed",
            BotError::DeliveryRejected(_) => "delivery_rejected",
            BotError::Network(_) => "network_error",
            BotError::Config(_) => "config_error",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        })
    }
}

impl IntoResponse for BotError {
    fn into_response(self) -> Response {
        match self {
            BotError::AuthenticationFailed => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            other => (StatusCode::BAD_REQUEST, Json(other.to_json())).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body_carries_kind_and_message() {
        let err = BotError::RegistrationRejected("400 Bad Request: bad webhook".into());
        let body = err.to_json();
        assert_eq!(body["error"], "registration_rejected");
        assert_eq!(
            body["message"],
            "webhook registration rejected: 400 Bad Request: bad webhook"
        );
    }

    #[test]
    fn authentication_failure_maps_to_forbidden() {
        let resp = BotError::AuthenticationFailed.into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn lifecycle_failures_map_to_bad_request() {
        let resp = BotError::TunnelUnavailable("agent exited".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
