mod api;
mod config;
mod embeddings;
mod error;
mod index;
mod llm;
mod math;
mod models;
mod processing;
mod router;
mod services;
mod store;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::config::Config;
use crate::embeddings::EmbeddingProvider;
use crate::llm::LlmProvider;
use crate::store::{DocumentStore, FsDocumentStore, HttpDocumentStore};

#[derive(Parser)]
#[command(name = "brightly")]
#[command(about = "Self-hostable school Q&A assistant")]
struct Args {
    /// Force a full index rebuild on startup
    #[arg(long)]
    rebuild_index: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brightly=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.server.dashboard_password == "change-me" {
        tracing::warn!(
            "DASHBOARD_PASSWORD is not set — document mutations use the default secret. Set it before exposing this service."
        );
    }

    let store: Arc<dyn DocumentStore> = match &config.storage.remote_url {
        Some(url) => {
            tracing::info!("Using remote document store at {}", url);
            Arc::new(HttpDocumentStore::new(url, 30)?)
        }
        None => {
            tracing::info!(
                "No DOCUMENT_STORE_URL set; using local store directory '{}'",
                config.storage.remote_dir
            );
            std::fs::create_dir_all(&config.storage.remote_dir)?;
            Arc::new(FsDocumentStore::new(&config.storage.remote_dir))
        }
    };

    tracing::info!(
        "Initializing embeddings: {} ({}d)...",
        config.embeddings.model,
        config.embeddings.dimensions
    );
    let embeddings = EmbeddingProvider::new(&config.embeddings)?;

    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::new(config.llm.as_ref());
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - grounded answers degrade to a fixed message");
    }

    let state = AppState::new(config.clone(), store, embeddings, llm);

    services::cleanup_old_sessions(
        Path::new(&config.storage.sessions_dir),
        config.storage.max_session_files,
    );

    if config.server.refresh_on_startup || args.rebuild_index {
        match state.indexer.refresh(args.rebuild_index).await {
            Ok(summary) => tracing::info!(
                changed = summary.changed,
                documents = summary.documents,
                passages = summary.passages,
                "Startup refresh complete"
            ),
            Err(e) => tracing::warn!(error = %e, "Startup refresh failed; serving empty index"),
        }
    } else {
        tracing::info!("Skipping vector refresh on startup");
    }

    let app = api::create_router(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Brightly starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Best-effort flush of the bounded session log on the way out.
    let sessions_dir = Path::new(&config.storage.sessions_dir);
    match state.memory.persist(sessions_dir) {
        Ok(path) => tracing::info!(file = %path.display(), "Session saved"),
        Err(e) => tracing::warn!(error = %e, "Failed to save session"),
    }
    services::cleanup_old_sessions(sessions_dir, config.storage.max_session_files);

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
