//! Slack Gateway - signed Slack Events API receiver.
//!
//! This binary serves the request handler over HTTP:
//! - Verifies Slack request signatures
//! - Optionally unseals per-tenant secrets from the `kms_data` query parameter
//! - Answers URL verification challenges and acknowledges callback events

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use slackgate::web::{health, slack_events, AppState};
use slackgate::{Config, LocalKms, SlackHandler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("slack_gateway_starting");

    let config = Config::from_env();
    info!(
        port = config.port,
        signing_secret_configured = config.signing_secret.is_some(),
        kms_enabled = config.kms_enabled,
        kms_key_id = %config.kms_key_id,
        kms_param = %config.kms_param,
        signature_max_age = config.signature_max_age,
        "config_loaded"
    );

    let mut handler = SlackHandler::new(config.handler_config());

    match config.kms_master_key.as_deref() {
        Some(raw) => {
            let kms = LocalKms::from_encoded(raw).context("Invalid KMS_MASTER_KEY")?;
            handler = handler.with_kms(Arc::new(kms));
            info!("local_kms_configured");
        }
        None if config.kms_enabled => {
            warn!("kms_enabled_without_master_key");
        }
        None => {}
    }

    if !config.kms_enabled && config.signing_secret.is_none() {
        warn!("signing_secret_not_configured");
    }

    let state = AppState::new(handler);

    let app = Router::new()
        .route("/health", get(health))
        .route("/slack/events", post(slack_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "slack_gateway_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("slack_gateway_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("slack_gateway_shutting_down");
}
