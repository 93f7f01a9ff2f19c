//! Folio server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use folio_core::config::AppConfig;
use folio_server::{AppState, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Folio - portfolio collections backend
#[derive(Parser, Debug)]
#[command(name = "foliod")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "FOLIO_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Merge the optional TOML file with `FOLIO_` environment overrides.
fn load_config(path: &str) -> Result<AppConfig> {
    let config_path = std::path::Path::new(path);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}", path);
    }

    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("FOLIO_") && key != "FOLIO_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: foliod --config /path/to/config.toml\n  \
             2. Environment variables: FOLIO_SERVER__BIND=0.0.0.0:8080 \
             FOLIO_AUTH__JWT_SECRET=YOUR_SECRET foliod\n\n\
             See config/server.example.toml for example configuration.\n\
             Set FOLIO_CONFIG env var to specify a default config file path."
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("FOLIO_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Folio v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;

    let store = folio_store::from_config(&config.database)
        .await
        .context("failed to initialize store")?;
    store
        .health_check()
        .await
        .context("store health check failed")?;
    tracing::info!("Store initialized");

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let state = AppState::new(config, store);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
