//! oauth-login server

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use oauth_login::{config::AppConfig, observability, state::AppState};

#[derive(Parser)]
#[command(name = "oauth-login")]
#[command(version)]
#[command(about = "Login page backed by Google and LinkedIn OAuth2", long_about = None)]
struct Cli {
    /// Configuration file (replaces ./config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Address to bind (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Validate configuration and provider credentials, then exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; a malformed one is not
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("Failed to load .env"),
    }

    let cli = Cli::parse();

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    observability::init(&config.logging)?;

    let bind_address = config.server.bind_address();
    let environment = config.security.environment;
    let state = AppState::new(config)
        .await
        .context("Failed to initialize application")?;

    let providers: Vec<_> = state.providers().enabled().map(|p| p.as_str()).collect();
    tracing::info!(?environment, ?providers, "Configuration loaded");

    if cli.check {
        tracing::info!("Configuration is valid");
        return Ok(());
    }

    let app = oauth_login::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!("Server listening on http://{bind_address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
