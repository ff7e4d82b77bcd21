//! Logical memory-store contract.
//!
//! The store exclusively owns durable state; the engine holds only transient
//! working copies. Sessions are request-scoped: implementations must not
//! share a mutable connection across concurrent analyses.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::commit::CommitRecord;
use crate::models::deployment::DeploymentRecord;
use crate::models::incident::IncidentRecord;
use crate::models::pattern::PatternRecord;

/// Aggregate statistics for one commit author, from memory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthorStats {
    pub total_commits: i64,
    pub incident_count: i64,
    /// Incidents attributed to the author's commits ÷ their analyzed commits.
    pub incident_rate: f64,
    pub avg_risk_score: f64,
}

/// Durable record of commits, deployments, incidents, and learned patterns.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    // ── Commits ──

    /// Insert or update by sha. Re-analysis of a known sha is an update,
    /// never a duplicate insert.
    async fn upsert_commit(&self, commit: &CommitRecord) -> Result<()>;

    async fn get_commit(&self, sha: &str) -> Result<Option<CommitRecord>>;

    /// Total commit memory volume; drives prediction confidence.
    async fn count_commits(&self) -> Result<i64>;

    /// Commits with `committed_at` in [from, to], newest first.
    async fn commits_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>>;

    async fn author_stats(&self, author: &str) -> Result<AuthorStats>;

    // ── Deployments ──

    /// Rejects a duplicate deployment_id.
    async fn insert_deployment(&self, deployment: &DeploymentRecord) -> Result<()>;

    async fn get_deployment(&self, deployment_id: &str) -> Result<Option<DeploymentRecord>>;

    async fn latest_deployment_for_commit(&self, sha: &str)
        -> Result<Option<DeploymentRecord>>;

    /// Deployments with `deployed_at` >= cutoff, newest first.
    async fn deployments_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<DeploymentRecord>>;

    /// The single permitted deployment mutation: link an incident outcome.
    async fn mark_deployment_incident(&self, deployment_id: &str, incident_id: &str)
        -> Result<()>;

    async fn count_deployments_since(&self, cutoff: DateTime<Utc>) -> Result<i64>;

    // ── Incidents ──

    /// Rejects a duplicate incident_id.
    async fn insert_incident(&self, incident: &IncidentRecord) -> Result<()>;

    /// Incidents with `occurred_at` >= cutoff, newest first.
    async fn incidents_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<IncidentRecord>>;

    /// Recent incidents joined to their root-cause commit, newest first.
    async fn recent_incidents_with_commits(
        &self,
        limit: i64,
    ) -> Result<Vec<(IncidentRecord, CommitRecord)>>;

    async fn count_incidents_since(&self, cutoff: DateTime<Utc>) -> Result<i64>;

    // ── Patterns ──

    async fn get_pattern(&self, pattern_type: &str) -> Result<Option<PatternRecord>>;

    /// Insert or update by pattern_type. Patterns are never deleted.
    async fn upsert_pattern(&self, pattern: &PatternRecord) -> Result<()>;

    /// Patterns at or above the confidence threshold, by occurrence count
    /// descending.
    async fn patterns_above_confidence(
        &self,
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<PatternRecord>>;
}
