use crate::error::BotError;
use crate::registrar::{Registrar, HOOK_PATH};
use crate::routing::UpdateRouter;
use crate::secret::constant_time_eq;
use crate::telegram::Update;
use crate::verification::InboundAuthenticator;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ServerState {
    pub registrar: Arc<Registrar>,
    pub authenticator: InboundAuthenticator,
    pub router: UpdateRouter,
    pub admin_pass: Arc<str>,
}

#[derive(Deserialize)]
struct AdminQuery {
    pass: Option<String>,
}

/// Build the HTTP surface: the webhook, the admin endpoints and `/`.
pub fn app(state: ServerState, enable_cors: bool) -> Router {
    let admin = Router::new()
        .route("/reset-hook", get(reset_hook))
        .route("/delete-hook", get(delete_hook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_pass,
        ));

    let app = Router::new()
        .route("/", get(root))
        .route(HOOK_PATH, post(handle_update))
        .merge(admin)
        .with_state(state);

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn root() -> &'static str {
    "Hello there!"
}

async fn handle_update(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, BotError> {
    // Nothing in the body is looked at before the secret checks out.
    state.authenticator.check(&headers)?;

    let update: Update = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            warn!(error = %e, "dropping undecodable update");
            return Ok(StatusCode::OK);
        }
    };

    // Acknowledged regardless of how the reply turns out.
    let _ = state.router.route(update);
    Ok(StatusCode::OK)
}

async fn require_admin_pass(
    State(state): State<ServerState>,
    query: std::result::Result<Query<AdminQuery>, QueryRejection>,
    request: Request,
    next: Next,
) -> Response {
    // A query that does not decode counts as a missing pass.
    let pass = query.ok().and_then(|Query(q)| q.pass);
    let allowed = pass
        .as_deref()
        .is_some_and(|pass| constant_time_eq(pass.as_bytes(), state.admin_pass.as_bytes()));
    if !allowed {
        warn!(path = %request.uri().path(), "rejected administrative call");
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(request).await
}

async fn reset_hook(State(state): State<ServerState>) -> Result<String, BotError> {
    let registration = state.registrar.register().await?;
    Ok(format!("webhook registered at {}", registration.target_url))
}

async fn delete_hook(State(state): State<ServerState>) -> Result<&'static str, BotError> {
    state.registrar.deregister().await?;
    Ok("webhook deleted")
}
