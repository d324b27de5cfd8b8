// src/web.rs
use crate::apply::ApplyPipeline;
use crate::config::AppConfig;
use crate::error::ApplyError;
use crate::prefs::Preferences;
use crate::status::{StatusProber, StatusSnapshot};
use crate::urls::{discover_host, ConnectionUrls};
use crate::validation::RawPreferences;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch::Receiver as WatchReceiver;
use tracing::{debug, error, info, warn};

/// Shared application state for the web server.
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    pipeline: Arc<ApplyPipeline>,
    prober: Arc<StatusProber>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let pipeline = Arc::new(ApplyPipeline::from_config(&config));
        let prober = Arc::new(StatusProber::from_config(&config));
        AppState {
            config,
            pipeline,
            prober,
        }
    }

    pub fn pipeline(&self) -> &Arc<ApplyPipeline> {
        &self.pipeline
    }
}

/// Body of a successful `POST /api/config`.
#[derive(Debug, Serialize)]
struct ApplyResponse {
    ok: bool,
    cfg: Preferences,
}

impl IntoResponse for ApplyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApplyError::Validation(_) => StatusCode::BAD_REQUEST,
            ApplyError::Store(_) | ApplyError::RelayConfig { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!("Failed to apply preferences: {}", self);
        } else {
            warn!("Rejected preferences: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Serves the single-page UI. Also the GET fallback for unknown paths.
async fn serve_home() -> impl IntoResponse {
    Html(include_str!("../static/index.html"))
}

/// Returns the stored preferences, healing a missing or broken file first.
async fn get_config(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.pipeline.store().load())
}

/// Saves submitted preferences, rewrites the relay config and reloads the relay.
///
/// A missing, non-JSON or non-object body is treated as an empty object, so it is
/// rejected by stream path validation like any other incomplete submission.
async fn post_config(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<ApplyResponse>, ApplyError> {
    let raw = RawPreferences::from_body(body.map(|Json(value)| value).unwrap_or(Value::Null));
    debug!("Received preferences: {:?}", raw);
    let cfg = state.pipeline.apply(&raw).await?;
    Ok(Json(ApplyResponse { ok: true, cfg }))
}

/// Publish and pull URLs for the current stream path, one per protocol.
async fn obs_urls(State(state): State<AppState>) -> Json<ConnectionUrls> {
    let prefs = state.pipeline.store().load();
    let host = match &state.config.public_host {
        Some(host) => host.clone(),
        None => discover_host().to_string(),
    };
    Json(ConnectionUrls::new(&host, &prefs))
}

/// Probes the relay for the current stream path.
async fn status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    let prefs = state.pipeline.store().load();
    Json(state.prober.probe(&prefs).await)
}

/// Builds the router: JSON API under `/api`, the UI for every other GET.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/config", get(get_config).post(post_config))
        .route("/api/obs-urls", get(obs_urls))
        .route("/api/status", get(status))
        .fallback(get(serve_home))
        .with_state(state)
}

/// Starts the web server.
///
/// - Serves the UI at `/` and for any path not claimed by the API.
/// - Serves the preference, URL and status API under `/api`.
/// - Shuts down gracefully when the shutdown signal is triggered.
///
/// # Arguments
/// - `state`: Shared state; its configuration supplies the listen address.
/// - `shutdown_signal`: Watch channel for graceful shutdown notification.
///
/// # Returns
/// Returns `Ok(())` when the server shuts down cleanly, or an error if startup fails.
pub async fn start_server(state: AppState, shutdown_signal: WatchReceiver<bool>) -> Result<()> {
    let socket_addr: SocketAddr = state.config.web_addr.parse()?;
    let app = router(state);

    info!("Web server starting on http://{}", socket_addr);

    let mut shutdown = shutdown_signal.clone();
    axum::serve(tokio::net::TcpListener::bind(socket_addr).await?, app)
        .with_graceful_shutdown(async move {
            shutdown.changed().await.ok();
            info!("Web server shutting down gracefully.");
        })
        .await?;

    info!("Web server stopped.");
    Ok(())
}
