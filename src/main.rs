mod call_flow;
mod carrier;
mod cli;
mod config;
mod error;
mod server;
mod store;
mod twiml;
mod ui;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use call_flow::Renderer;
use carrier::CarrierClient;
use cli::{Cli, Command};
use config::{IvrConfig, LoggingConfig, DEFAULT_CONFIG_PATH};
use server::AppState;
use store::TicketBackend;
use ui::CallProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = IvrConfig::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    init_tracing(&config.logging, cli.verbose);
    tracing::debug!(path = %path.display(), "configuration loaded");

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Call { to, from, url } => place_call(&config, to, from, url).await,
        Command::Lookup { ticket_id } => {
            let backend = TicketBackend::connect(&config.store);
            let timeout = Duration::from_millis(config.store.lookup_timeout_ms);
            println!("{}", server::status_line(&backend, &ticket_id, timeout).await);
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let directive = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn serve(config: IvrConfig) -> Result<()> {
    let backend = TicketBackend::connect(&config.store);
    let renderer = Renderer::new(&config.voice.public_base_url, &config.voice.audio_base_url)
        .with_voice(&config.voice.voice, &config.voice.language);
    let state = AppState::new(
        backend,
        renderer,
        Duration::from_millis(config.store.lookup_timeout_ms),
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}; is another process using this port?"))?;

    tracing::info!(%addr, public_base_url = %config.voice.public_base_url, "starting IVR webhook server");

    axum::serve(listener, server::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("IVR webhook server shut down");
    Ok(())
}

async fn place_call(
    config: &IvrConfig,
    to: Option<String>,
    from: Option<String>,
    url: Option<String>,
) -> Result<()> {
    let request = carrier::call_request(&config.test_call, to, from, url)?;
    let client = CarrierClient::from_config(&config.test_call)?;

    let progress = CallProgress::start(&request.to);
    match client.create_call(&request).await {
        Ok(call) => {
            progress.placed(&call);
            Ok(())
        }
        Err(e) => {
            progress.failed(&e.to_string());
            Err(e.into())
        }
    }
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
