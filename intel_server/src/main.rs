//! Centrix Intelligence Server — deployment risk prediction platform.
//!
//! A standalone binary that correlates commits, deployments, and telemetry
//! to predict production incidents and drive rollback decisions.
//!
//! Backends are pluggable chains: GitHub API with a local-git fallback for
//! commit enrichment, Loki with a file fallback for logs, Prometheus for
//! metrics, PostgreSQL with an in-memory fallback for durable memory.

mod config;
mod poller;
mod routes;
mod schema;
mod sources;
mod store_pg;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use intel_engine::engine::IntelligenceEngine;
use intel_engine::sources::{
    CommitChain, CommitSource, DiffAnnotator, LogChain, LogSource, MetricSource,
};
use intel_engine::store::memory::InMemoryStore;
use intel_engine::store::MemoryStore;

use config::ServerConfig;
use sources::file_log::FileLogSource;
use sources::github::GithubCommitSource;
use sources::llm::HttpDiffAnnotator;
use sources::local_git::LocalGitSource;
use sources::loki::LokiLogSource;
use sources::prometheus::PrometheusMetricSource;
use sources::CommitFeed;

#[derive(Parser)]
#[command(name = "centrix-intel", about = "Centrix Deployment Intelligence Platform")]
struct Cli {
    /// Server port
    #[arg(short, long, env = "INTEL_PORT", default_value = "9091")]
    port: u16,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    }

    let cli = Cli::parse();

    tracing::info!("Starting Centrix Intelligence Server...");

    let config = Arc::new(ServerConfig::from_env());

    // Durable memory: PostgreSQL when configured and reachable, otherwise
    // in-memory (the decision path works either way).
    let store: Arc<dyn MemoryStore> = match &cli.database_url {
        Some(url) => match store_pg::PgMemoryStore::connect(url).await {
            Ok(pg) => {
                pg.run_migration().await?;
                tracing::info!("Using PostgreSQL memory store");
                Arc::new(pg)
            }
            Err(e) => {
                tracing::warn!("Database unavailable ({e}) -- falling back to in-memory store");
                Arc::new(InMemoryStore::new())
            }
        },
        None => {
            tracing::warn!("DATABASE_URL not set -- memories will not survive restarts");
            Arc::new(InMemoryStore::new())
        }
    };

    // Capability-ranked source chains.
    let github = Arc::new(GithubCommitSource::new(
        &config.github_token,
        &config.github_repo,
    ));
    let local_git = Arc::new(LocalGitSource::new(&config.local_repo_path));
    let commit_sources: Vec<Arc<dyn CommitSource>> = vec![github.clone(), local_git.clone()];

    let mut log_sources: Vec<Arc<dyn LogSource>> = Vec::new();
    if !config.loki_url.is_empty() {
        log_sources.push(Arc::new(LokiLogSource::new(&config.loki_url)));
    }
    if !config.log_path.is_empty() {
        log_sources.push(Arc::new(FileLogSource::new(&config.log_path)));
    }

    let metric_source: Option<Arc<dyn MetricSource>> = if config.prometheus_url.is_empty() {
        None
    } else {
        Some(Arc::new(PrometheusMetricSource::new(&config.prometheus_url)))
    };

    let annotator: Option<Arc<dyn DiffAnnotator>> = if config.engine.enable_llm_enrichment {
        tracing::info!(provider = %config.llm_provider, "LLM diff annotation enabled");
        Some(Arc::new(HttpDiffAnnotator::new(
            &config.llm_provider,
            &config.llm_api_key,
            &config.llm_model,
        )))
    } else {
        None
    };

    let engine = Arc::new(IntelligenceEngine::new(
        store,
        CommitChain::new(commit_sources),
        LogChain::new(log_sources.clone()),
        metric_source,
        None, // no learned scorer wired by default
        annotator,
        config.engine.clone(),
    ));

    // Background pollers
    let feeds: Vec<Arc<dyn CommitFeed>> = vec![github, local_git];
    let poller_handle = poller::spawn_pollers(
        engine.clone(),
        feeds,
        Arc::new(LogChain::new(log_sources)),
        &config,
    );

    // Initialize metrics
    init_metrics();

    // Build router
    let state = routes::IntelRouterState {
        engine,
        config: config.clone(),
    };
    let app = Router::new()
        .route("/healthz", get(healthz))
        .nest("/intel", routes::intel_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!("Centrix Intelligence Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Stopping background pollers...");
    poller_handle.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
    }))
}

/// Initialize metrics exporter (Prometheus).
fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
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
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
