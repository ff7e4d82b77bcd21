//! Engine output types — analysis, health, and root-cause reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::health::RollbackDirective;
use crate::models::commit::CommitRecord;
use crate::models::telemetry::{Anomaly, SystemState};
use crate::models::{Action, HealthStatus};
use crate::recall::RecallContext;
use crate::rootcause::{RootCauseCandidate, SimilarIncident};
use crate::scorer::Prediction;
use crate::sources::DiffAnnotation;

/// Summary of the analyzed commit in the analysis response.
#[derive(Debug, Clone, Serialize)]
pub struct CommitAnalysis {
    pub risk_score: f64,
    pub complexity: f64,
    pub blast_radius: i32,
    pub test_ratio: f64,
    pub commit_type: String,
    pub patterns_detected: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_analysis: Option<DiffAnnotation>,
}

/// Alert thresholds scaled with predicted risk.
#[derive(Debug, Clone, Serialize)]
pub struct AlertThresholds {
    pub error_rate: f64,
    pub latency_increase: f64,
}

/// Post-deploy monitoring guidance.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringPlan {
    pub watch_metrics: Vec<String>,
    pub alert_thresholds: AlertThresholds,
    pub duration: String,
}

/// Full deployment-analysis response.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub commit_sha: String,
    pub repository: String,
    pub analysis: CommitAnalysis,
    pub system_state: SystemState,
    pub intelligence: RecallContext,
    pub prediction: Prediction,
    pub recommendations: Vec<String>,
    pub action: Action,
    pub monitoring: MonitoringPlan,
    pub learned_from: String,
    /// Which fallback paths were taken while producing this report.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<&'static str>,
}

/// Pre-deploy baseline slice used for comparison.
#[derive(Debug, Clone, Serialize)]
pub struct BaselineHealth {
    pub error_rate: f64,
    pub health_score: f64,
}

/// Current telemetry slice for the monitored deployment.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentHealth {
    pub error_rate: f64,
    pub error_count: usize,
    pub anomalies: Vec<Anomaly>,
}

/// What changed between baseline and now.
#[derive(Debug, Clone, Serialize)]
pub struct HealthDelta {
    pub error_rate_increase: f64,
    pub degradation_percent: f64,
    pub new_error_patterns: Vec<String>,
}

/// Health-monitoring response for one deployment.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub deployment_id: String,
    pub commit_sha: String,
    pub monitoring_duration_minutes: i64,
    pub baseline: BaselineHealth,
    pub current: CurrentHealth,
    pub changes: HealthDelta,
    pub health_status: HealthStatus,
    pub rollback: RollbackDirective,
}

/// Digest of the error logs supplied with an incident.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogEvidence {
    pub error_count: usize,
    pub error_rate: f64,
    pub patterns: Vec<String>,
    pub anomalies: Vec<Anomaly>,
}

/// Compact commit view listed among root-cause candidates.
#[derive(Debug, Clone, Serialize)]
pub struct CommitSummary {
    pub sha: String,
    pub author: Option<String>,
    pub risk_score: f64,
    pub patterns: Vec<String>,
    pub committed_at: DateTime<Utc>,
}

impl From<&CommitRecord> for CommitSummary {
    fn from(commit: &CommitRecord) -> Self {
        Self {
            sha: commit.sha.clone(),
            author: commit.author.clone(),
            risk_score: commit.risk_score,
            patterns: commit.risky_patterns.clone(),
            committed_at: commit.committed_at,
        }
    }
}

/// Root-cause attribution response.
#[derive(Debug, Clone, Serialize)]
pub struct RootCauseReport {
    pub incident_timestamp: DateTime<Utc>,
    pub likely_root_cause: Option<RootCauseCandidate>,
    pub recent_commits: Vec<CommitSummary>,
    pub log_evidence: LogEvidence,
    pub similar_past_incidents: Vec<SimilarIncident>,
    pub confidence: f64,
}
