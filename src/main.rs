use anyhow::{Context, Result};
use std::sync::Arc;
use tg_webhook_bot::config::Config;
use tg_webhook_bot::http_server::{self, ServerState};
use tg_webhook_bot::registrar::{Registrar, Topology};
use tg_webhook_bot::reply::CommandMenu;
use tg_webhook_bot::routing::UpdateRouter;
use tg_webhook_bot::telegram::TelegramClient;
use tg_webhook_bot::tunnel::{NgrokConnector, TunnelProvisioner};
use tg_webhook_bot::BotError;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tg_webhook_bot=info,tower_http=info".into()),
        )
        .init();

    // Defects are logged; the server keeps serving.
    std::panic::set_hook(Box::new(|info| {
        error!(%info, "unhandled panic");
    }));

    let config = Config::from_env().context("failed to load configuration")?;

    let telegram = TelegramClient::new(&config.telegram_base_url, &config.telegram_token);

    let (topology, tunnel) = match &config.base_url {
        Some(base_url) => (
            Topology::Public {
                base_url: base_url.clone(),
            },
            None,
        ),
        None => {
            let provisioner = Arc::new(TunnelProvisioner::new(NgrokConnector::new(
                &config.ngrok_bin,
                &config.ngrok_api_url,
            )));
            let topology = Topology::Tunnel {
                provisioner: provisioner.clone(),
                local_port: config.port,
            };
            (topology, Some(provisioner))
        }
    };
    info!(
        port = config.port,
        public = config.base_url.is_some(),
        "starting webhook bot"
    );

    let registrar = Arc::new(Registrar::new(
        telegram.clone(),
        topology,
        config.allowed_updates.clone(),
    ));

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;

    match registrar.register().await {
        Ok(registration) => info!(url = %registration.target_url, "webhook ready"),
        Err(e @ BotError::TunnelUnavailable(_)) => {
            return Err(e).context("development tunnel could not be established");
        }
        Err(e) => error!(error = %e, "webhook registration failed, retry with /reset-hook"),
    }

    let state = ServerState {
        authenticator: registrar.authenticator(),
        registrar,
        router: UpdateRouter::new(Arc::new(CommandMenu), Arc::new(telegram)),
        admin_pass: Arc::from(config.admin_pass.as_str()),
    };
    let app = http_server::app(state, config.enable_cors);

    let served = http_server::serve(listener, app).await;

    if let Some(tunnel) = tunnel {
        tunnel.shutdown().await;
    }
    served.context("HTTP server failed")
}
