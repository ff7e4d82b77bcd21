//! JSON API types and query logic for the intelligence platform.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use intel_engine::engine::IntelligenceEngine;
use intel_engine::error::Result;
use intel_engine::models::deployment::DeploymentRecord;
use intel_engine::models::telemetry::LogEntry;

/// Request body for a deployment analysis.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub commit_sha: String,
    pub repository: Option<String>,
    pub deployment_id: Option<String>,
}

/// Request body for recording an incident.
#[derive(Debug, Deserialize)]
pub struct IncidentRequest {
    pub incident_id: Option<String>,
    pub severity: String,
    pub description: String,
    pub root_cause_commit: Option<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct IncidentResponse {
    pub incident_id: String,
}

/// Request body for a deployment-health check.
#[derive(Debug, Deserialize)]
pub struct MonitorRequest {
    pub deployment_id: String,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: i64,
}

fn default_duration_minutes() -> i64 {
    30
}

/// Request body for root-cause attribution.
#[derive(Debug, Deserialize)]
pub struct RootCauseRequest {
    pub timestamp: Option<DateTime<Utc>>,
    pub error_logs: Option<Vec<LogEntry>>,
}

#[derive(Debug, Serialize)]
pub struct KpiSummary {
    pub days: i64,
    pub deployments: i64,
    pub incidents: i64,
    pub incident_rate: f64,
}

/// Deployment/incident volume over the last N days.
pub async fn kpi_summary(engine: &IntelligenceEngine, days: i64) -> Result<KpiSummary> {
    let cutoff = Utc::now() - Duration::days(days);
    let deployments = engine.store().count_deployments_since(cutoff).await?;
    let incidents = engine.store().count_incidents_since(cutoff).await?;
    Ok(KpiSummary {
        days,
        deployments,
        incidents,
        incident_rate: if deployments == 0 {
            0.0
        } else {
            incidents as f64 / deployments as f64
        },
    })
}

/// Most recent deployments, newest first.
pub async fn list_deployments(
    engine: &IntelligenceEngine,
    days: i64,
    limit: i64,
) -> Result<Vec<DeploymentRecord>> {
    let cutoff = Utc::now() - Duration::days(days);
    engine.store().deployments_since(cutoff, limit).await
}
