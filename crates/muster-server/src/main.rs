//! muster server binary.
//!
//! Reads `muster.toml` (or the path given with `--config`), opens the SQLite
//! store, repairs duplicate identities, and serves the JSON API over HTTP.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use muster_api::{ApiConfig, AppState};
use muster_core::{code::RandomCodes, consolidate};
use muster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "muster field-organization server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "muster.toml")]
  config: PathBuf,

  /// Run the identity consolidation pass and exit.
  #[arg(long)]
  consolidate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;
  let codes = RandomCodes::new(server_cfg.code_digits).context("invalid code_digits")?;

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  if cli.consolidate_only || server_cfg.consolidate_on_start {
    consolidate::run(&store)
      .await
      .context("identity consolidation failed")?;
    if cli.consolidate_only {
      return Ok(());
    }
  }

  let state = AppState {
    store:  Arc::new(store),
    codes:  Arc::new(codes),
    config: Arc::new(ApiConfig { base_url: server_cfg.base_url.clone() }),
  };
  let app = muster_api::router(state).layer(TraceLayer::new_for_http());

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    match tokio::signal::ctrl_c().await {
      Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
      Err(e) => {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
        tracing::info!("received SIGTERM, shutting down");
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}
