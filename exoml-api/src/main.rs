//! exoml-api - Exoplanet classification microservice
//!
//! Loads the model artifacts (eagerly when preload is enabled, otherwise on
//! the first request) and serves predictions over HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use exoml_common::config::{load_toml_config, CliOverrides, ServiceConfig};
use exoml_api::services::{
    ArtifactPaths, ArtifactStore, FeatureNormalizer, FsArtifactLoader, PredictionPipeline,
};
use exoml_api::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for exoml-api
#[derive(Parser, Debug)]
#[command(name = "exoml-api")]
#[command(about = "Exoplanet transit classification service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "EXOML_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the model, scaler and metadata artifacts
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Load artifacts before accepting requests
    #[arg(long, overrides_with = "no_preload")]
    preload: bool,

    /// Defer artifact loading to the first request
    #[arg(long)]
    no_preload: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        let preload = match (self.preload, self.no_preload) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        };

        CliOverrides {
            model_dir: self.model_dir.clone(),
            host: self.host.clone(),
            port: self.port,
            preload,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config decides the log level, so it is read under a bootstrap subscriber
    let bootstrap = tracing_subscriber::fmt().with_target(false).finish();
    let file = tracing::subscriber::with_default(bootstrap, || load_toml_config(args.config.as_deref()))
        .context("Failed to load configuration")?;
    let config = ServiceConfig::resolve(args.overrides(), file).context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting ExoML API (exoml-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        model_dir = %config.model_dir.display(),
        policy = ?config.preprocessing.policy,
        missing_values = ?config.preprocessing.missing_values,
        "Configuration resolved"
    );

    let normalizer = FeatureNormalizer::new(config.preprocessing);
    let paths = ArtifactPaths::resolve(&config.model_dir, &config.artifacts);
    let store = ArtifactStore::new(FsArtifactLoader::new(paths, normalizer));
    let pipeline = PredictionPipeline::new(store, normalizer, config.timeouts);

    if config.preload {
        match pipeline.preload().await {
            Ok(()) => info!("✓ Model artifacts preloaded"),
            Err(e) => warn!(error = %e, "Preload failed, artifacts will be loaded on first request"),
        }
    }

    let state = AppState::new(pipeline);
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("exoml-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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
