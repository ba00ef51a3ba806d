//! Webhook lifecycle: mint a secret, pick a target URL, register it with
//! Telegram, and publish the secret to the inbound authenticator.

use crate::error::{BotError, Result};
use crate::secret::Secret;
use crate::telegram::{SetWebhook, TelegramClient, UpdateKind};
use crate::tunnel::TunnelProvisioner;
use crate::verification::InboundAuthenticator;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{info, warn};

/// Path Telegram is told to call on our side.
pub const HOOK_PATH: &str = "/hook";

/// How the public base URL is obtained. Decided once at composition time.
pub enum Topology {
    /// The host is reachable from the internet at this base URL.
    Public { base_url: String },
    /// Development: forward a tunnel to the local listener.
    Tunnel {
        provisioner: Arc<TunnelProvisioner>,
        local_port: u16,
    },
}

impl Topology {
    async fn resolve_base_url(&self) -> Result<String> {
        match self {
            Topology::Public { base_url } => Ok(base_url.clone()),
            Topology::Tunnel {
                provisioner,
                local_port,
            } => provisioner.provision(*local_port).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookRegistration {
    pub target_url: String,
    pub secret: Secret,
    pub active_update_kinds: Vec<UpdateKind>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum RegistrationState {
    Unregistered,
    Registering,
    Active(WebhookRegistration),
}

/// Owns the single active registration.
///
/// Transitions (`register`, `deregister`) are serialized by `transition`.
/// The current secret lives in a `watch` channel so readers always see one
/// whole value, swapped in a single store once Telegram accepts it.
pub struct Registrar {
    telegram: TelegramClient,
    topology: Topology,
    allowed_updates: Vec<UpdateKind>,
    transition: Mutex<()>,
    state: RwLock<RegistrationState>,
    secret: watch::Sender<Option<Secret>>,
}

impl Registrar {
    pub fn new(
        telegram: TelegramClient,
        topology: Topology,
        allowed_updates: Vec<UpdateKind>,
    ) -> Self {
        let (secret, _) = watch::channel(None);
        Self {
            telegram,
            topology,
            allowed_updates,
            transition: Mutex::new(()),
            state: RwLock::new(RegistrationState::Unregistered),
            secret,
        }
    }

    /// Read-only view of the active secret for inbound calls.
    pub fn authenticator(&self) -> InboundAuthenticator {
        InboundAuthenticator::new(self.secret.subscribe())
    }

    pub async fn state(&self) -> RegistrationState {
        self.state.read().await.clone()
    }

    /// Register a fresh webhook, superseding any previous one.
    ///
    /// On failure the previous secret stays in place, and so does the previous
    /// state unless its tunnel is gone. The transition runs on its own task,
    /// so it completes even if the caller stops waiting.
    pub async fn register(self: &Arc<Self>) -> Result<WebhookRegistration> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_register().await })
            .await
            .map_err(|e| BotError::RegistrationRejected(format!("registration task failed: {e}")))?
    }

    async fn run_register(&self) -> Result<WebhookRegistration> {
        let _transition = self.transition.lock().await;
        let previous = std::mem::replace(
            &mut *self.state.write().await,
            RegistrationState::Registering,
        );

        match self.try_register().await {
            Ok(registration) => {
                self.secret.send_replace(Some(registration.secret.clone()));
                *self.state.write().await = RegistrationState::Active(registration.clone());
                info!(
                    url = %registration.target_url,
                    at = %registration.registered_at,
                    "webhook registration active"
                );
                Ok(registration)
            }
            Err(e) => {
                warn!(error = %e, "webhook registration failed");
                *self.state.write().await = self.restore_after_failure(previous);
                Err(e)
            }
        }
    }

    /// A tunnel is closed before the new one is requested, so in tunnel mode
    /// the previous target no longer forwards anywhere.
    fn restore_after_failure(&self, previous: RegistrationState) -> RegistrationState {
        match (&self.topology, previous) {
            (Topology::Tunnel { .. }, RegistrationState::Active(stale)) => {
                warn!(
                    url = %stale.target_url,
                    "previous webhook target closed with its tunnel"
                );
                RegistrationState::Unregistered
            }
            (_, previous) => previous,
        }
    }

    async fn try_register(&self) -> Result<WebhookRegistration> {
        let secret = Secret::mint();
        let base_url = self.topology.resolve_base_url().await?;
        let target_url = format!("{}{HOOK_PATH}", base_url.trim_end_matches('/'));

        self.telegram
            .set_webhook(&SetWebhook {
                url: target_url.clone(),
                secret_token: secret.as_str().to_string(),
                allowed_updates: self.allowed_updates.clone(),
            })
            .await?;

        Ok(WebhookRegistration {
            target_url,
            secret,
            active_update_kinds: self.allowed_updates.clone(),
            registered_at: Utc::now(),
        })
    }

    /// Remove the webhook at Telegram.
    ///
    /// The last secret stays published: calls that still arrive keep going
    /// through the authenticator unchanged.
    pub async fn deregister(self: &Arc<Self>) -> Result<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_deregister().await })
            .await
            .map_err(|e| BotError::RegistrationRejected(format!("deregistration task failed: {e}")))?
    }

    async fn run_deregister(&self) -> Result<()> {
        let _transition = self.transition.lock().await;
        self.telegram.delete_webhook().await?;
        *self.state.write().await = RegistrationState::Unregistered;
        info!("webhook deregistered");
        Ok(())
    }
}
