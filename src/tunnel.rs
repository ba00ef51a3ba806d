//! Development topology: expose the local listener through an ngrok tunnel.

use crate::error::{BotError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const POLL_ATTEMPTS: u32 = 20;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A live tunnel. Closing it stops forwarding.
#[async_trait]
pub trait ActiveTunnel: Send {
    fn public_url(&self) -> &str;
    async fn close(&mut self);
}

/// Opens tunnels to a local port.
#[async_trait]
pub trait TunnelConnector: Send + Sync {
    async fn connect(&self, local_port: u16) -> Result<Box<dyn ActiveTunnel>>;
}

/// Holds at most one tunnel; re-provisioning closes the previous one first.
pub struct TunnelProvisioner {
    connector: Box<dyn TunnelConnector>,
    current: Mutex<Option<Box<dyn ActiveTunnel>>>,
}

impl TunnelProvisioner {
    pub fn new(connector: impl TunnelConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            current: Mutex::new(None),
        }
    }

    pub async fn provision(&self, local_port: u16) -> Result<String> {
        let mut current = self.current.lock().await;
        if let Some(mut previous) = current.take() {
            info!(url = previous.public_url(), "closing previous tunnel");
            previous.close().await;
        }

        let tunnel = self.connector.connect(local_port).await?;
        let url = tunnel.public_url().to_string();
        info!(%url, local_port, "tunnel connected");
        *current = Some(tunnel);
        Ok(url)
    }

    /// Close the held tunnel, if any.
    pub async fn shutdown(&self) {
        if let Some(mut tunnel) = self.current.lock().await.take() {
            tunnel.close().await;
        }
    }
}

// ---------------------------------------------------------------------------
// ngrok agent
// ---------------------------------------------------------------------------

/// Spawns `ngrok http <port>` and reads the public URL from the agent's
/// local inspection API.
pub struct NgrokConnector {
    client: reqwest::Client,
    bin: String,
    api_url: String,
}

#[derive(Deserialize)]
struct TunnelList {
    #[serde(default)]
    tunnels: Vec<TunnelInfo>,
}

#[derive(Deserialize)]
struct TunnelInfo {
    public_url: String,
    #[serde(default)]
    proto: String,
}

struct NgrokTunnel {
    child: Child,
    public_url: String,
}

#[async_trait]
impl ActiveTunnel for NgrokTunnel {
    fn public_url(&self) -> &str {
        &self.public_url
    }

    async fn close(&mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "failed to stop ngrok agent");
        }
    }
}

impl NgrokConnector {
    pub fn new(bin: &str, api_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            bin: bin.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Current `https` tunnel URL reported by the agent, if one is up yet.
    async fn fetch_public_url(&self) -> Result<Option<String>> {
        let list: TunnelList = self
            .client
            .get(format!("{}/api/tunnels", self.api_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(list
            .tunnels
            .into_iter()
            .find(|t| t.proto == "https" || t.public_url.starts_with("https://"))
            .map(|t| t.public_url))
    }
}

#[async_trait]
impl TunnelConnector for NgrokConnector {
    async fn connect(&self, local_port: u16) -> Result<Box<dyn ActiveTunnel>> {
        let mut child = Command::new(&self.bin)
            .args(["http", &local_port.to_string(), "--log", "stdout"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BotError::TunnelUnavailable(format!("failed to start {}: {e}", self.bin)))?;

        for attempt in 1..=POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;

            if let Ok(Some(status)) = child.try_wait() {
                return Err(BotError::TunnelUnavailable(format!(
                    "ngrok agent exited with {status}"
                )));
            }

            match self.fetch_public_url().await {
                Ok(Some(public_url)) => {
                    return Ok(Box::new(NgrokTunnel { child, public_url }));
                }
                Ok(None) => debug!(attempt, "ngrok agent has no https tunnel yet"),
                Err(e) => debug!(attempt, error = %e, "ngrok agent API not ready"),
            }
        }

        if let Err(e) = child.kill().await {
            warn!(error = %e, "failed to stop ngrok agent");
        }
        Err(BotError::TunnelUnavailable(format!(
            "no public url from {} after {POLL_ATTEMPTS} attempts",
            self.api_url
        )))
    }
}
