//! NeuroPulse gateway - Main entry point
//!
//! Serves the analysis API in front of the text, face and audio inference
//! backends.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use pulse_gateway::config::GatewayConfig;
use pulse_gateway::logging;
use pulse_gateway::{build_router, AppState};

/// Command-line arguments for pulse-gateway
#[derive(Parser, Debug)]
#[command(name = "pulse-gateway")]
#[command(about = "Multi-modal emotion analysis gateway for NeuroPulse")]
#[command(version)]
struct Args {
    /// Interface to bind (overrides config file)
    #[arg(long, env = "NEUROPULSE_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "NEUROPULSE_PORT")]
    port: Option<u16>,

    /// Path to the TOML configuration file
    #[arg(short, long, env = "NEUROPULSE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_handle = logging::init();

    let mut config =
        GatewayConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(handle) = &log_handle {
        if let Err(e) = logging::apply_level(handle, &config.logging.level) {
            warn!("Failed to apply configured log level {}: {}", config.logging.level, e);
        }
    }

    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    info!("Starting NeuroPulse gateway v{}", env!("CARGO_PKG_VERSION"));
    info!(
        text = %config.backends.text_url,
        face = %config.backends.face_url,
        audio = %config.backends.audio_url,
        "Inference backends"
    );
    info!(
        "Fusion weights: text={} face={} audio={}",
        config.fusion.text_weight, config.fusion.face_weight, config.fusion.audio_weight
    );

    let state = AppState::from_config(&config).context("Failed to initialize gateway state")?;
    if !state.recommender.is_configured() {
        warn!("No recommendation API key configured; fallback tips and summaries will be used");
    }

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
