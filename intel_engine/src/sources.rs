//! Collaborator contracts — commit enrichment, telemetry backends, the
//! learned scorer, and best-effort LLM diff annotation.
//!
//! Concrete backends live in the server crate. Multi-backend concerns are
//! capability-ranked chains: an ordered list of candidates behind a common
//! interface, tried in order with health-check gating.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IntelError, Result};
use crate::models::telemetry::{LogEntry, MetricsSnapshot};

/// One file touched by a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub additions: i32,
    pub deletions: i32,
}

/// Raw commit statistics as reported by a commit source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitStats {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
    pub additions: i32,
    pub deletions: i32,
    pub files: Vec<ChangedFile>,
}

/// Aggregate history for one author, from the commit source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorHistory {
    pub total_commits: i64,
    pub avg_files_changed: f64,
}

/// Where commit metadata comes from (GitHub API, local git inspection).
#[async_trait]
pub trait CommitSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn health_check(&self) -> bool;

    async fn commit_details(&self, sha: &str) -> Result<CommitStats>;

    async fn author_history(&self, email: &str, window_days: u32) -> Result<AuthorHistory>;

    /// Full text diff of the commit, when the source can produce one.
    async fn commit_diff(&self, sha: &str) -> Result<Option<String>>;
}

/// Ordered chain of commit sources; the first healthy one that answers wins.
pub struct CommitChain {
    sources: Vec<Arc<dyn CommitSource>>,
}

impl CommitChain {
    pub fn new(sources: Vec<Arc<dyn CommitSource>>) -> Self {
        Self { sources }
    }

    pub async fn commit_details(&self, sha: &str) -> Result<CommitStats> {
        for source in &self.sources {
            if !source.health_check().await {
                tracing::debug!(source = source.name(), "Commit source unhealthy, skipping");
                continue;
            }
            match source.commit_details(sha).await {
                Ok(stats) => return Ok(stats),
                Err(e) => {
                    tracing::warn!(source = source.name(), sha, "Commit source failed: {e}");
                }
            }
        }
        Err(IntelError::SourceUnavailable(format!(
            "no commit source could resolve {sha}"
        )))
    }

    pub async fn author_history(&self, email: &str, window_days: u32) -> Result<AuthorHistory> {
        for source in &self.sources {
            if !source.health_check().await {
                continue;
            }
            match source.author_history(email, window_days).await {
                Ok(history) => return Ok(history),
                Err(e) => {
                    tracing::warn!(source = source.name(), email, "Author history failed: {e}");
                }
            }
        }
        Err(IntelError::SourceUnavailable(format!(
            "no commit source could resolve history for {email}"
        )))
    }

    pub async fn commit_diff(&self, sha: &str) -> Result<Option<String>> {
        for source in &self.sources {
            if !source.health_check().await {
                continue;
            }
            if let Ok(Some(diff)) = source.commit_diff(sha).await {
                return Ok(Some(diff));
            }
        }
        Ok(None)
    }
}

/// Where recent logs come from (Loki, flat files).
#[async_trait]
pub trait LogSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn health_check(&self) -> bool;

    async fn fetch_recent_logs(&self, since_minutes: u32) -> Result<Vec<LogEntry>>;
}

/// Ordered chain of log sources with health-check gating.
pub struct LogChain {
    sources: Vec<Arc<dyn LogSource>>,
}

impl LogChain {
    pub fn new(sources: Vec<Arc<dyn LogSource>>) -> Self {
        Self { sources }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub async fn fetch_recent_logs(&self, since_minutes: u32) -> Result<Vec<LogEntry>> {
        for source in &self.sources {
            if !source.health_check().await {
                tracing::debug!(source = source.name(), "Log source unhealthy, skipping");
                continue;
            }
            match source.fetch_recent_logs(since_minutes).await {
                Ok(logs) => return Ok(logs),
                Err(e) => {
                    tracing::warn!(source = source.name(), "Log source failed: {e}");
                }
            }
        }
        Err(IntelError::BackendUnavailable(
            "no log source available".to_string(),
        ))
    }
}

/// Where live metrics come from (Prometheus).
#[async_trait]
pub trait MetricSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn health_check(&self) -> bool;

    async fn fetch_metrics(&self) -> Result<MetricsSnapshot>;
}

/// Opaque learned risk scorer. The feature-vector order is a fixed contract;
/// see [`crate::scorer::feature_vector`].
pub trait RiskModel: Send + Sync {
    fn is_trained(&self) -> bool;

    /// Incident probability in [0, 1]. Errors and untrained models are
    /// treated as "no learned score" by the caller.
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

/// Semantic enrichment of a diff, produced by an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffAnnotation {
    pub risk_score: f64,
    pub summary: String,
    pub breaking_change: bool,
    pub suggested_action: String,
}

/// Best-effort semantic annotator. Failures are swallowed by the caller and
/// never block the primary score.
#[async_trait]
pub trait DiffAnnotator: Send + Sync {
    async fn annotate(&self, diff: &str) -> Result<DiffAnnotation>;
}
