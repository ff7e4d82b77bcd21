//! The intelligence engine facade — correlates commits, deployments, and
//! incidents, and exposes the four decision operations.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};

use crate::config::EngineConfig;
use crate::error::{IntelError, Result};
use crate::models::commit::CommitRecord;
use crate::models::deployment::DeploymentRecord;
use crate::models::incident::IncidentRecord;
use crate::models::telemetry::{LogEntry, SystemState};
use crate::models::{HealthStatus, Severity};
use crate::report::{
    AnalysisReport, BaselineHealth, CommitAnalysis, CommitSummary, CurrentHealth, HealthDelta,
    HealthReport, LogEvidence, RootCauseReport,
};
use crate::sources::{CommitChain, DiffAnnotation, DiffAnnotator, LogChain, MetricSource, RiskModel};
use crate::store::MemoryStore;
use crate::{health, logs, metrics, patterns, recall, recommend, rootcause, scorer};

pub struct IntelligenceEngine {
    store: Arc<dyn MemoryStore>,
    commits: CommitChain,
    log_sources: LogChain,
    metric_source: Option<Arc<dyn MetricSource>>,
    model: Option<Arc<dyn RiskModel>>,
    annotator: Option<Arc<dyn DiffAnnotator>>,
    config: EngineConfig,
}

impl IntelligenceEngine {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        commits: CommitChain,
        log_sources: LogChain,
        metric_source: Option<Arc<dyn MetricSource>>,
        model: Option<Arc<dyn RiskModel>>,
        annotator: Option<Arc<dyn DiffAnnotator>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            commits,
            log_sources,
            metric_source,
            model,
            annotator,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Analyze one deployment: enrich the commit, recall memory and live
    /// system state concurrently, score, recommend, and write back for
    /// learning. Write failures never suppress the computed result.
    pub async fn analyze_deployment(
        &self,
        commit_sha: &str,
        repository: &str,
        deployment_id: Option<&str>,
    ) -> Result<AnalysisReport> {
        let started = Instant::now();
        let now = Utc::now();
        let mut degraded: Vec<&'static str> = Vec::new();

        tracing::info!(sha = short_sha(commit_sha), repository, "Analyzing deployment");

        // Commit first: recall needs the changed-file list.
        let (mut commit, annotation) = self
            .analyze_commit(commit_sha, repository, now, &mut degraded)
            .await;

        let author_key = commit
            .author_email
            .clone()
            .or_else(|| commit.author.clone());
        let ((system, system_degraded), mut recall) = tokio::join!(
            self.system_state(),
            recall::recall(
                self.store.as_ref(),
                &commit.files,
                author_key.as_deref(),
                now,
                &self.config,
            ),
        );
        degraded.extend(system_degraded);
        degraded.append(&mut recall.degraded);

        let prediction = scorer::score(&commit, &system, &recall, self.model.as_deref(), now);
        let recommendations = recommend::recommendations(
            &commit,
            &system,
            &recall,
            &prediction,
            self.config.elevated_error_rate,
        );
        let action = recommend::decide_action(prediction.probability);
        let monitoring = recommend::monitoring_plan(&commit, &prediction);

        commit.prediction_details = serde_json::to_value(&prediction).ok();
        if let Err(e) = self.store.upsert_commit(&commit).await {
            tracing::error!(sha = short_sha(commit_sha), "Failed to persist commit memory: {e}");
            degraded.push("commit_write");
        }

        let deployment_id = deployment_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| format!("deploy-{}", short_sha(commit_sha)));
        let deployment = DeploymentRecord {
            deployment_id: deployment_id.clone(),
            commit_sha: commit_sha.to_string(),
            repository: repository.to_string(),
            deployed_at: now,
            predicted_risk: prediction.probability,
            predicted_impact: prediction.expected_impact,
            recommended_action: action,
            system_state: system.clone(),
            resulted_in_incident: false,
            incident_id: None,
        };
        if let Err(e) = self.store.insert_deployment(&deployment).await {
            tracing::error!(deployment_id = %deployment.deployment_id, "Failed to persist deployment event: {e}");
            degraded.push("deployment_write");
        }

        metrics::analysis_completed(action.as_str());
        metrics::analysis_duration(started.elapsed().as_millis() as u64);
        metrics::memory_size(recall.total_memories);

        tracing::info!(
            sha = short_sha(commit_sha),
            probability = prediction.probability,
            action = %action,
            "Deployment analysis complete"
        );

        let learned_from = format!("{} past events", recall.total_memories);
        Ok(AnalysisReport {
            commit_sha: commit_sha.to_string(),
            repository: repository.to_string(),
            analysis: CommitAnalysis {
                risk_score: commit.risk_score,
                complexity: commit.complexity_score,
                blast_radius: commit.blast_radius,
                test_ratio: commit.test_ratio,
                commit_type: commit.commit_type.clone(),
                patterns_detected: commit.risky_patterns.clone(),
                llm_analysis: annotation,
            },
            system_state: system,
            intelligence: recall,
            prediction,
            recommendations,
            action,
            monitoring,
            learned_from,
            degraded,
        })
    }

    /// Record an incident for learning: persist it, link it to the causing
    /// deployment, and reinforce the pattern catalog.
    pub async fn record_incident(
        &self,
        incident_id: &str,
        severity: Severity,
        description: &str,
        root_cause_commit: Option<&str>,
        incident_patterns: Vec<String>,
    ) -> Result<()> {
        let now = Utc::now();

        let deployment = match root_cause_commit {
            Some(sha) => self.store.latest_deployment_for_commit(sha).await?,
            None => None,
        };
        let time_to_detect_minutes = deployment
            .as_ref()
            .map(|d| (now - d.deployed_at).num_minutes() as i32);

        let incident = IncidentRecord {
            incident_id: incident_id.to_string(),
            severity,
            description: description.to_string(),
            root_cause_commit: root_cause_commit.map(|s| s.to_string()),
            occurred_at: now,
            time_to_detect_minutes,
            patterns: incident_patterns,
        };
        self.store.insert_incident(&incident).await?;

        if let Some(deployment) = &deployment {
            if let Err(e) = self
                .store
                .mark_deployment_incident(&deployment.deployment_id, incident_id)
                .await
            {
                tracing::warn!(
                    deployment_id = %deployment.deployment_id,
                    "Failed to link incident to deployment: {e}"
                );
            }
        }

        patterns::learn_from_incident(self.store.as_ref(), &incident, now).await?;
        metrics::incident_recorded(severity.as_str());

        tracing::info!(incident_id, severity = %severity, "Recorded incident memory");
        Ok(())
    }

    /// Compare post-deploy telemetry against the pre-deploy baseline and
    /// decide whether to roll back. CRITICAL and UNHEALTHY outcomes
    /// synthesize an auto-incident so the pattern learner sees them.
    pub async fn monitor_deployment_health(
        &self,
        deployment_id: &str,
        current_logs: &[LogEntry],
        duration_minutes: i64,
    ) -> Result<HealthReport> {
        let deployment = self
            .store
            .get_deployment(deployment_id)
            .await?
            .ok_or_else(|| IntelError::DeploymentNotFound(deployment_id.to_string()))?;

        let baseline_error_rate = deployment.system_state.error_rate;
        let current = logs::digest(current_logs);
        let error_rate_increase = current.error_rate - baseline_error_rate;
        let degradation_percent = error_rate_increase / baseline_error_rate.max(0.01) * 100.0;
        let new_patterns = logs::scan_signatures(current_logs);

        let status = health::assess(
            &self.config.health,
            error_rate_increase,
            degradation_percent,
            &new_patterns,
            &current.anomalies,
        );
        let rollback = health::rollback_policy(status, deployment.predicted_risk);

        metrics::health_assessed(status.as_str());
        if rollback.recommended {
            metrics::rollback_recommended(rollback.urgency.as_str());
        }

        if matches!(status, HealthStatus::Critical | HealthStatus::Unhealthy)
            && !deployment.resulted_in_incident
        {
            let incident_id = format!("auto-{deployment_id}");
            let description = format!("Deployment {deployment_id} health degraded to {status}");
            match self
                .record_incident(
                    &incident_id,
                    health::auto_incident_severity(status),
                    &description,
                    Some(&deployment.commit_sha),
                    new_patterns.clone(),
                )
                .await
            {
                Ok(()) => tracing::warn!(
                    deployment_id,
                    status = %status,
                    "Deployment unhealthy - auto-incident created"
                ),
                Err(e) => tracing::warn!(deployment_id, "Failed to record auto-incident: {e}"),
            }
        }

        Ok(HealthReport {
            deployment_id: deployment_id.to_string(),
            commit_sha: deployment.commit_sha.clone(),
            monitoring_duration_minutes: duration_minutes,
            baseline: BaselineHealth {
                error_rate: baseline_error_rate,
                health_score: deployment.system_state.health_score,
            },
            current: CurrentHealth {
                error_rate: current.error_rate,
                error_count: current.error_count,
                anomalies: current.anomalies,
            },
            changes: HealthDelta {
                error_rate_increase,
                degradation_percent,
                new_error_patterns: new_patterns,
            },
            health_status: status,
            rollback,
        })
    }

    /// Trace an incident back to the commit that most likely caused it.
    pub async fn detect_incident_cause(
        &self,
        incident_timestamp: DateTime<Utc>,
        error_logs: Option<&[LogEntry]>,
    ) -> Result<RootCauseReport> {
        let window_start =
            incident_timestamp - Duration::hours(self.config.root_cause_window_hours);
        let commits = self
            .store
            .commits_between(window_start, incident_timestamp)
            .await?;

        let (log_patterns, log_evidence) = match error_logs {
            Some(entries) if !entries.is_empty() => {
                let digest = logs::digest(entries);
                let patterns = logs::scan_signatures(entries);
                (
                    patterns.clone(),
                    LogEvidence {
                        error_count: digest.error_count,
                        error_rate: digest.error_rate,
                        patterns,
                        anomalies: digest.anomalies,
                    },
                )
            }
            _ => (Vec::new(), LogEvidence::default()),
        };

        let similar = if log_patterns.is_empty() {
            Vec::new()
        } else {
            let cutoff = Utc::now() - Duration::days(self.config.similar_incident_days);
            let incidents = self.store.incidents_since(cutoff, 20).await?;
            rootcause::rank_similar(&incidents, &log_patterns)
        };

        let likely_root_cause = rootcause::attribute(&commits, &log_patterns, &similar);
        let confidence = likely_root_cause
            .as_ref()
            .map(|c| c.confidence)
            .unwrap_or(0.0);

        if let Some(cause) = &likely_root_cause {
            tracing::info!(
                sha = short_sha(&cause.sha),
                confidence = cause.confidence,
                "Root-cause attribution complete"
            );
        }

        Ok(RootCauseReport {
            incident_timestamp,
            likely_root_cause,
            recent_commits: commits.iter().map(CommitSummary::from).collect(),
            log_evidence,
            similar_past_incidents: similar,
            confidence,
        })
    }

    /// Current system health from the telemetry chains. An unreachable
    /// backend degrades to neutral values without penalizing health score.
    pub async fn system_state(&self) -> (SystemState, Vec<&'static str>) {
        let mut degraded = Vec::new();
        let mut state = SystemState::default();

        match self
            .log_sources
            .fetch_recent_logs(self.config.system_state_log_minutes)
            .await
        {
            Ok(entries) => {
                let digest = logs::digest(&entries);
                state.error_rate = digest.error_rate;
                state.recent_errors = digest.error_count as i64;
                state.anomalies = digest.anomalies;
                if digest.spike_score > 0.5 {
                    state.health_score -= 0.3;
                }
            }
            Err(e) => {
                tracing::debug!("System-state log fetch degraded: {e}");
                metrics::degraded_path("log_backend");
                degraded.push("log_backend");
            }
        }

        if let Some(metric_source) = &self.metric_source {
            match metric_source.fetch_metrics().await {
                Ok(snapshot) => {
                    state.cpu_usage = snapshot.cpu_usage;
                    state.memory_usage = snapshot.memory_usage;
                    state.request_rate = snapshot.request_rate;
                    state.error_rate = state.error_rate.max(snapshot.error_rate);
                }
                Err(e) => {
                    tracing::debug!("System-state metric fetch degraded: {e}");
                    metrics::degraded_path("metric_backend");
                    degraded.push("metric_backend");
                }
            }
        }

        state.health_score = state.health_score.clamp(0.0, 1.0);
        (state, degraded)
    }

    async fn analyze_commit(
        &self,
        sha: &str,
        repository: &str,
        now: DateTime<Utc>,
        degraded: &mut Vec<&'static str>,
    ) -> (CommitRecord, Option<DiffAnnotation>) {
        let mut record = match self.commits.commit_details(sha).await {
            Ok(stats) => crate::enrich::build_record(&stats, repository, now),
            Err(e) => {
                tracing::warn!(sha = short_sha(sha), "Commit enrichment degraded: {e}");
                metrics::degraded_path("commit_source");
                degraded.push("commit_source");
                CommitRecord::neutral(sha, repository, now)
            }
        };

        let mut annotation = None;
        if self.config.enable_llm_enrichment {
            if let Some(annotator) = &self.annotator {
                if let Ok(Some(diff)) = self.commits.commit_diff(sha).await {
                    match annotator.annotate(&diff).await {
                        Ok(result) => {
                            record.risk_score =
                                ((record.risk_score + result.risk_score) / 2.0).clamp(0.0, 10.0);
                            annotation = Some(result);
                        }
                        Err(e) => {
                            tracing::warn!(sha = short_sha(sha), "Diff annotation failed: {e}");
                        }
                    }
                }
            }
        }

        (record, annotation)
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}
