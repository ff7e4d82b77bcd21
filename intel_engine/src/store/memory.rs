//! In-memory store — used by tests and as the fallback when no database is
//! configured. Same contract, no durability.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{IntelError, Result};
use crate::models::commit::CommitRecord;
use crate::models::deployment::DeploymentRecord;
use crate::models::incident::IncidentRecord;
use crate::models::pattern::PatternRecord;

use super::{AuthorStats, MemoryStore};

#[derive(Default)]
struct Inner {
    commits: HashMap<String, CommitRecord>,
    deployments: HashMap<String, DeploymentRecord>,
    incidents: Vec<IncidentRecord>,
    patterns: HashMap<String, PatternRecord>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn upsert_commit(&self, commit: &CommitRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.commits.insert(commit.sha.clone(), commit.clone());
        Ok(())
    }

    async fn get_commit(&self, sha: &str) -> Result<Option<CommitRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.commits.get(sha).cloned())
    }

    async fn count_commits(&self) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner.commits.len() as i64)
    }

    async fn commits_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>> {
        let inner = self.inner.read().await;
        let mut commits: Vec<CommitRecord> = inner
            .commits
            .values()
            .filter(|c| c.committed_at >= from && c.committed_at <= to)
            .cloned()
            .collect();
        commits.sort_by(|a, b| b.committed_at.cmp(&a.committed_at));
        Ok(commits)
    }

    async fn author_stats(&self, author: &str) -> Result<AuthorStats> {
        let inner = self.inner.read().await;

        let matches = |c: &CommitRecord| {
            c.author_email.as_deref() == Some(author) || c.author.as_deref() == Some(author)
        };

        let authored: Vec<&CommitRecord> =
            inner.commits.values().filter(|c| matches(c)).collect();
        let total_commits = authored.len() as i64;
        if total_commits == 0 {
            return Ok(AuthorStats::default());
        }

        let incident_count = inner
            .incidents
            .iter()
            .filter(|i| {
                i.root_cause_commit
                    .as_deref()
                    .and_then(|sha| inner.commits.get(sha))
                    .is_some_and(matches)
            })
            .count() as i64;

        let avg_risk_score =
            authored.iter().map(|c| c.risk_score).sum::<f64>() / total_commits as f64;

        Ok(AuthorStats {
            total_commits,
            incident_count,
            incident_rate: incident_count as f64 / total_commits as f64,
            avg_risk_score,
        })
    }

    async fn insert_deployment(&self, deployment: &DeploymentRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.deployments.contains_key(&deployment.deployment_id) {
            return Err(IntelError::InvalidRecord(format!(
                "duplicate deployment_id: {}",
                deployment.deployment_id
            )));
        }
        inner
            .deployments
            .insert(deployment.deployment_id.clone(), deployment.clone());
        Ok(())
    }

    async fn get_deployment(&self, deployment_id: &str) -> Result<Option<DeploymentRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.deployments.get(deployment_id).cloned())
    }

    async fn latest_deployment_for_commit(
        &self,
        sha: &str,
    ) -> Result<Option<DeploymentRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .deployments
            .values()
            .filter(|d| d.commit_sha == sha)
            .max_by_key(|d| d.deployed_at)
            .cloned())
    }

    async fn deployments_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<DeploymentRecord>> {
        let inner = self.inner.read().await;
        let mut deployments: Vec<DeploymentRecord> = inner
            .deployments
            .values()
            .filter(|d| d.deployed_at >= cutoff)
            .cloned()
            .collect();
        deployments.sort_by(|a, b| b.deployed_at.cmp(&a.deployed_at));
        deployments.truncate(limit as usize);
        Ok(deployments)
    }

    async fn mark_deployment_incident(
        &self,
        deployment_id: &str,
        incident_id: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let deployment = inner
            .deployments
            .get_mut(deployment_id)
            .ok_or_else(|| IntelError::DeploymentNotFound(deployment_id.to_string()))?;
        deployment.resulted_in_incident = true;
        deployment.incident_id = Some(incident_id.to_string());
        Ok(())
    }

    async fn count_deployments_since(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .deployments
            .values()
            .filter(|d| d.deployed_at >= cutoff)
            .count() as i64)
    }

    async fn insert_incident(&self, incident: &IncidentRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner
            .incidents
            .iter()
            .any(|i| i.incident_id == incident.incident_id)
        {
            return Err(IntelError::InvalidRecord(format!(
                "duplicate incident_id: {}",
                incident.incident_id
            )));
        }
        inner.incidents.push(incident.clone());
        Ok(())
    }

    async fn incidents_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<IncidentRecord>> {
        let inner = self.inner.read().await;
        let mut incidents: Vec<IncidentRecord> = inner
            .incidents
            .iter()
            .filter(|i| i.occurred_at >= cutoff)
            .cloned()
            .collect();
        incidents.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        incidents.truncate(limit as usize);
        Ok(incidents)
    }

    async fn recent_incidents_with_commits(
        &self,
        limit: i64,
    ) -> Result<Vec<(IncidentRecord, CommitRecord)>> {
        let inner = self.inner.read().await;
        let mut incidents: Vec<&IncidentRecord> = inner.incidents.iter().collect();
        incidents.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));

        let joined = incidents
            .into_iter()
            .filter_map(|incident| {
                let sha = incident.root_cause_commit.as_deref()?;
                let commit = inner.commits.get(sha)?;
                Some((incident.clone(), commit.clone()))
            })
            .take(limit as usize)
            .collect();
        Ok(joined)
    }

    async fn count_incidents_since(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .incidents
            .iter()
            .filter(|i| i.occurred_at >= cutoff)
            .count() as i64)
    }

    async fn get_pattern(&self, pattern_type: &str) -> Result<Option<PatternRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.patterns.get(pattern_type).cloned())
    }

    async fn upsert_pattern(&self, pattern: &PatternRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .patterns
            .insert(pattern.pattern_type.clone(), pattern.clone());
        Ok(())
    }

    async fn patterns_above_confidence(
        &self,
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<PatternRecord>> {
        let inner = self.inner.read().await;
        let mut patterns: Vec<PatternRecord> = inner
            .patterns
            .values()
            .filter(|p| p.confidence >= threshold)
            .cloned()
            .collect();
        patterns.sort_by(|a, b| {
            b.occurrence_count
                .cmp(&a.occurrence_count)
                .then_with(|| a.pattern_type.cmp(&b.pattern_type))
        });
        patterns.truncate(limit as usize);
        Ok(patterns)
    }
}
