//! Background pollers — commit polling and log monitoring.
//!
//! Each tick spawns one unit of work so a slow poll never delays the next
//! tick's scheduling. The shutdown signal is observed between ticks, never
//! mid-tick: in-flight work finishes, no new ticks are issued.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use intel_engine::engine::IntelligenceEngine;
use intel_engine::models::HealthStatus;
use intel_engine::sources::LogChain;

use crate::config::ServerConfig;
use crate::sources::CommitFeed;

pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stop issuing ticks and wait for the poller loops to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

pub fn spawn_pollers(
    engine: Arc<IntelligenceEngine>,
    feeds: Vec<Arc<dyn CommitFeed>>,
    log_sources: Arc<LogChain>,
    config: &ServerConfig,
) -> PollerHandle {
    let (shutdown, rx) = watch::channel(false);
    let mut tasks = Vec::new();

    let repository = if config.github_repo.is_empty() {
        "local".to_string()
    } else {
        config.github_repo.clone()
    };
    tasks.push(tokio::spawn(commit_poller(
        engine.clone(),
        feeds,
        repository,
        Duration::from_secs(config.commit_poll_secs),
        rx.clone(),
    )));

    if log_sources.is_empty() {
        tracing::warn!("No log backend configured - log monitoring disabled");
    } else {
        tasks.push(tokio::spawn(log_monitor(
            engine,
            log_sources,
            Duration::from_secs(config.log_poll_secs),
            rx,
        )));
    }

    tracing::info!(workers = tasks.len(), "Background pollers started");
    PollerHandle { shutdown, tasks }
}

async fn commit_poller(
    engine: Arc<IntelligenceEngine>,
    feeds: Vec<Arc<dyn CommitFeed>>,
    repository: String,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(period_secs = period.as_secs(), "Commit poller started");
    let last_seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let feeds = Arc::new(feeds);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                intel_engine::metrics::poll_tick("commits");
                let engine = engine.clone();
                let feeds = feeds.clone();
                let repository = repository.clone();
                let last_seen = last_seen.clone();
                tokio::spawn(async move {
                    if let Err(e) = poll_commits_once(&engine, &feeds, &repository, &last_seen).await {
                        tracing::error!("Commit poll error: {e}");
                    }
                });
            }
            _ = shutdown.changed() => {
                tracing::info!("Commit poller stopped");
                break;
            }
        }
    }
}

async fn poll_commits_once(
    engine: &IntelligenceEngine,
    feeds: &[Arc<dyn CommitFeed>],
    repository: &str,
    last_seen: &Mutex<Option<String>>,
) -> anyhow::Result<()> {
    let mut commits = Vec::new();
    for feed in feeds {
        if !feed.healthy().await {
            continue;
        }
        match feed.recent_commits(10).await {
            Ok(found) => {
                commits = found;
                break;
            }
            Err(e) => tracing::warn!(feed = feed.name(), "Commit feed failed: {e}"),
        }
    }
    if commits.is_empty() {
        return Ok(());
    }

    let mut last = last_seen.lock().await;
    for sha in &commits {
        if last.as_deref() == Some(sha.as_str()) {
            break;
        }
        let deployment_id = format!("auto-{}", &sha[..8.min(sha.len())]);
        match engine
            .analyze_deployment(sha, repository, Some(&deployment_id))
            .await
        {
            Ok(report) => {
                if report.prediction.probability >= 0.7 {
                    tracing::warn!(
                        sha = &sha[..8.min(sha.len())],
                        probability = report.prediction.probability,
                        action = %report.action,
                        "High-risk commit detected"
                    );
                }
            }
            Err(e) => tracing::error!(sha = %sha, "Failed to analyze commit: {e}"),
        }
    }
    *last = commits.first().cloned();
    Ok(())
}

async fn log_monitor(
    engine: Arc<IntelligenceEngine>,
    log_sources: Arc<LogChain>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(period_secs = period.as_secs(), "Log monitor started");
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                intel_engine::metrics::poll_tick("logs");
                let engine = engine.clone();
                let log_sources = log_sources.clone();
                tokio::spawn(async move {
                    if let Err(e) = monitor_once(&engine, &log_sources).await {
                        tracing::error!("Log monitor error: {e}");
                    }
                });
            }
            _ = shutdown.changed() => {
                tracing::info!("Log monitor stopped");
                break;
            }
        }
    }
}

/// Sweep deployments from the last hour that have not yet gone bad and
/// re-assess their health against the freshly fetched logs.
async fn monitor_once(engine: &IntelligenceEngine, log_sources: &LogChain) -> anyhow::Result<()> {
    let logs = match log_sources.fetch_recent_logs(5).await {
        Ok(logs) => logs,
        Err(e) => {
            tracing::debug!("Log fetch skipped: {e}");
            return Ok(());
        }
    };
    if logs.is_empty() {
        return Ok(());
    }

    let cutoff = Utc::now() - chrono::Duration::hours(1);
    let deployments = engine.store().deployments_since(cutoff, 5).await?;

    for deployment in deployments
        .into_iter()
        .filter(|d| !d.resulted_in_incident)
    {
        let duration_minutes = (Utc::now() - deployment.deployed_at).num_minutes();
        if duration_minutes >= 60 {
            continue;
        }
        match engine
            .monitor_deployment_health(&deployment.deployment_id, &logs, duration_minutes)
            .await
        {
            Ok(report)
                if matches!(
                    report.health_status,
                    HealthStatus::Critical | HealthStatus::Unhealthy
                ) =>
            {
                tracing::error!(
                    deployment_id = %deployment.deployment_id,
                    status = %report.health_status,
                    rollback_recommended = report.rollback.recommended,
                    "Deployment health issue"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(
                deployment_id = %deployment.deployment_id,
                "Health monitoring failed: {e}"
            ),
        }
    }
    Ok(())
}
