// src/main.rs

//! # atem-relay entry point
//!
//! Loads configuration, installs logging, brings the relay config in line with the stored
//! preferences, and serves the web UI and API until Ctrl-C.

use anyhow::Result;
use atem_relay::config::AppConfig;
use atem_relay::web::{self, AppState};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = match AppConfig::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing subscriber for logging with environment filter and max level.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&app_config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_max_level(tracing::Level::TRACE)
        .with_writer(std::io::stderr) // Log to stderr
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Setting default tracing subscriber failed");

    tracing::info!("atem-relay starting with configuration: {:?}", app_config);

    let state = AppState::new(Arc::clone(&app_config));

    // The relay may have been installed with its stock config; make it match the store.
    match state.pipeline().sync_relay_config().await {
        Ok(prefs) => tracing::info!(
            "Relay config {} written for stream '{}'",
            state.pipeline().relay_config_path().display(),
            prefs.stream_path
        ),
        Err(e) => tracing::error!("Could not write relay config at startup: {}", e),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut server = tokio::spawn(web::start_server(state, shutdown_rx));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => tracing::info!("Ctrl-C received, initiating shutdown..."),
            Err(err) => tracing::error!("Failed to listen for Ctrl-C signal: {}", err),
        },
        result = &mut server => {
            // The server only returns on its own if it failed to start or crashed.
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.context("web server exited")),
                Err(e) => Err(anyhow::anyhow!("web server task panicked: {}", e)),
            };
        }
    }

    if shutdown_tx.send(true).is_err() {
        tracing::debug!("Web server already stopped before shutdown signal");
    }

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Web server exited with error: {}", e),
        Err(e) => tracing::error!("Web server task panicked: {}", e),
    }

    tracing::info!("atem-relay shut down gracefully.");
    Ok(())
}
