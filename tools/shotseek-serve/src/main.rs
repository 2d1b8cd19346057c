//! Shotseek search server
//!
//! Loads a built shot index and serves the search API, the search page and
//! the movie files.

mod api;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use shotseek::{E5Embedder, RetrieverConfig, SceneRetriever};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{AppState, SharedEmbedder};

const DEFAULT_MODEL_ID: &str = "intfloat/multilingual-e5-small";

/// Default model directory
fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shotseek")
        .join("models")
        .join("multilingual-e5-small")
}

#[derive(Parser, Debug)]
#[command(name = "shotseek-serve")]
#[command(about = "HTTP search service for a built shot index")]
#[command(version)]
struct Args {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "SHOTSEEK_BIND", default_value = "127.0.0.1:8000")]
    bind: String,

    /// Artifact directory (index, metadata, manifest)
    #[arg(short, long, env = "SHOTSEEK_ARTIFACTS", default_value = "data/artifacts")]
    artifacts: PathBuf,

    /// Directory holding config.json, tokenizer.json and model.safetensors
    #[arg(short, long, env = "SHOTSEEK_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Model identifier, checked against the build manifest
    #[arg(long, env = "SHOTSEEK_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    model_id: String,

    /// Search page assets, served under /static (created if absent)
    #[arg(long, env = "SHOTSEEK_STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,

    /// Movie files, served under /media
    #[arg(long, env = "SHOTSEEK_MOVIE_DIR", default_value = "data/movie")]
    movie_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let model_dir = args.model_dir.clone().unwrap_or_else(default_model_dir);
    info!(dir = %model_dir.display(), model = %args.model_id, "loading embedding model");
    let embedder: SharedEmbedder = Arc::new(
        E5Embedder::load(&model_dir, args.model_id.clone())
            .with_context(|| format!("Failed to load model from {}", model_dir.display()))?,
    );

    let retriever = SceneRetriever::open(embedder, RetrieverConfig::new(&args.artifacts))
        .with_context(|| format!("Failed to load artifacts from {}", args.artifacts.display()))?;

    if !args.static_dir.exists() {
        std::fs::create_dir_all(&args.static_dir).with_context(|| {
            format!("Failed to create static directory {}", args.static_dir.display())
        })?;
    }
    if !args.movie_dir.is_dir() {
        anyhow::bail!("Movie directory not found: {}", args.movie_dir.display());
    }

    let state = AppState {
        retriever: Arc::new(retriever),
    };
    let app = api::create_router(state, &args.static_dir, &args.movie_dir);

    let addr: SocketAddr = args
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", args.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("shotseek-serve listening on http://{addr}");

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
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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
