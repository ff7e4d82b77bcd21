//! Diesel row structs for the intelligence memory tables, with conversions
//! to and from the engine's domain records.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use intel_engine::error::{IntelError, Result};
use intel_engine::models::commit::CommitRecord;
use intel_engine::models::deployment::DeploymentRecord;
use intel_engine::models::incident::IncidentRecord;
use intel_engine::models::pattern::PatternRecord;
use intel_engine::models::telemetry::SystemState;
use intel_engine::models::{Action, Impact, Severity};

use crate::schema::{intel_commits, intel_deployments, intel_incidents, intel_patterns};

fn tags_to_json(tags: &[String]) -> serde_json::Value {
    serde_json::json!(tags)
}

fn tags_from_json(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

// ── Commits ──

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = intel_commits)]
pub struct CommitRow {
    pub id: i64,
    pub sha: String,
    pub repository: String,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub files_changed: i32,
    pub lines_added: i32,
    pub lines_deleted: i32,
    pub risk_score: f64,
    pub complexity_score: f64,
    pub blast_radius: i32,
    pub test_ratio: f64,
    pub commit_type: String,
    pub risky_patterns: serde_json::Value,
    pub files: serde_json::Value,
    pub prediction_details: Option<serde_json::Value>,
    pub committed_at: DateTime<Utc>,
    pub analyzed_at: DateTime<Utc>,
}

impl CommitRow {
    pub fn into_record(self) -> CommitRecord {
        CommitRecord {
            sha: self.sha,
            repository: self.repository,
            author: self.author,
            author_email: self.author_email,
            files_changed: self.files_changed,
            lines_added: self.lines_added,
            lines_deleted: self.lines_deleted,
            risk_score: self.risk_score,
            complexity_score: self.complexity_score,
            blast_radius: self.blast_radius,
            test_ratio: self.test_ratio,
            commit_type: self.commit_type,
            risky_patterns: tags_from_json(self.risky_patterns),
            files: tags_from_json(self.files),
            prediction_details: self.prediction_details,
            committed_at: self.committed_at,
            analyzed_at: self.analyzed_at,
        }
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = intel_commits)]
pub struct NewCommitRow {
    pub sha: String,
    pub repository: String,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub files_changed: i32,
    pub lines_added: i32,
    pub lines_deleted: i32,
    pub risk_score: f64,
    pub complexity_score: f64,
    pub blast_radius: i32,
    pub test_ratio: f64,
    pub commit_type: String,
    pub risky_patterns: serde_json::Value,
    pub files: serde_json::Value,
    pub prediction_details: Option<serde_json::Value>,
    pub committed_at: DateTime<Utc>,
    pub analyzed_at: DateTime<Utc>,
}

impl From<&CommitRecord> for NewCommitRow {
    fn from(record: &CommitRecord) -> Self {
        Self {
            sha: record.sha.clone(),
            repository: record.repository.clone(),
            author: record.author.clone(),
            author_email: record.author_email.clone(),
            files_changed: record.files_changed,
            lines_added: record.lines_added,
            lines_deleted: record.lines_deleted,
            risk_score: record.risk_score,
            complexity_score: record.complexity_score,
            blast_radius: record.blast_radius,
            test_ratio: record.test_ratio,
            commit_type: record.commit_type.clone(),
            risky_patterns: tags_to_json(&record.risky_patterns),
            files: tags_to_json(&record.files),
            prediction_details: record.prediction_details.clone(),
            committed_at: record.committed_at,
            analyzed_at: record.analyzed_at,
        }
    }
}

// ── Deployments ──

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = intel_deployments)]
pub struct DeploymentRow {
    pub id: i64,
    pub deployment_id: String,
    pub commit_sha: String,
    pub repository: String,
    pub deployed_at: DateTime<Utc>,
    pub predicted_risk: f64,
    pub predicted_impact: String,
    pub recommended_action: String,
    pub system_state: serde_json::Value,
    pub resulted_in_incident: bool,
    pub incident_id: Option<String>,
}

impl DeploymentRow {
    pub fn into_record(self) -> Result<DeploymentRecord> {
        let predicted_impact = Impact::parse(&self.predicted_impact).ok_or_else(|| {
            IntelError::InvalidRecord(format!("unknown impact: {}", self.predicted_impact))
        })?;
        let recommended_action = Action::parse(&self.recommended_action).ok_or_else(|| {
            IntelError::InvalidRecord(format!("unknown action: {}", self.recommended_action))
        })?;
        let system_state: SystemState =
            serde_json::from_value(self.system_state).map_err(|e| {
                IntelError::InvalidRecord(format!("bad system_state snapshot: {e}"))
            })?;

        Ok(DeploymentRecord {
            deployment_id: self.deployment_id,
            commit_sha: self.commit_sha,
            repository: self.repository,
            deployed_at: self.deployed_at,
            predicted_risk: self.predicted_risk,
            predicted_impact,
            recommended_action,
            system_state,
            resulted_in_incident: self.resulted_in_incident,
            incident_id: self.incident_id,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = intel_deployments)]
pub struct NewDeploymentRow {
    pub deployment_id: String,
    pub commit_sha: String,
    pub repository: String,
    pub deployed_at: DateTime<Utc>,
    pub predicted_risk: f64,
    pub predicted_impact: String,
    pub recommended_action: String,
    pub system_state: serde_json::Value,
    pub resulted_in_incident: bool,
    pub incident_id: Option<String>,
}

impl From<&DeploymentRecord> for NewDeploymentRow {
    fn from(record: &DeploymentRecord) -> Self {
        Self {
            deployment_id: record.deployment_id.clone(),
            commit_sha: record.commit_sha.clone(),
            repository: record.repository.clone(),
            deployed_at: record.deployed_at,
            predicted_risk: record.predicted_risk,
            predicted_impact: record.predicted_impact.as_str().to_string(),
            recommended_action: record.recommended_action.as_str().to_string(),
            system_state: serde_json::to_value(&record.system_state)
                .unwrap_or(serde_json::Value::Null),
            resulted_in_incident: record.resulted_in_incident,
            incident_id: record.incident_id.clone(),
        }
    }
}

// ── Incidents ──

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = intel_incidents)]
pub struct IncidentRow {
    pub id: i64,
    pub incident_id: String,
    pub severity: String,
    pub description: String,
    pub root_cause_commit: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub time_to_detect_minutes: Option<i32>,
    pub patterns: serde_json::Value,
}

impl IncidentRow {
    pub fn into_record(self) -> Result<IncidentRecord> {
        let severity = Severity::parse(&self.severity).ok_or_else(|| {
            IntelError::InvalidRecord(format!("unknown severity: {}", self.severity))
        })?;
        Ok(IncidentRecord {
            incident_id: self.incident_id,
            severity,
            description: self.description,
            root_cause_commit: self.root_cause_commit,
            occurred_at: self.occurred_at,
            time_to_detect_minutes: self.time_to_detect_minutes,
            patterns: tags_from_json(self.patterns),
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = intel_incidents)]
pub struct NewIncidentRow {
    pub incident_id: String,
    pub severity: String,
    pub description: String,
    pub root_cause_commit: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub time_to_detect_minutes: Option<i32>,
    pub patterns: serde_json::Value,
}

impl From<&IncidentRecord> for NewIncidentRow {
    fn from(record: &IncidentRecord) -> Self {
        Self {
            incident_id: record.incident_id.clone(),
            severity: record.severity.as_str().to_string(),
            description: record.description.clone(),
            root_cause_commit: record.root_cause_commit.clone(),
            occurred_at: record.occurred_at,
            time_to_detect_minutes: record.time_to_detect_minutes,
            patterns: tags_to_json(&record.patterns),
        }
    }
}

// ── Patterns ──

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = intel_patterns)]
pub struct PatternRow {
    pub id: i64,
    pub pattern_type: String,
    pub description: String,
    pub occurrence_count: i32,
    pub incident_count: i32,
    pub confidence: f64,
    pub typical_impact: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl PatternRow {
    pub fn into_record(self) -> Result<PatternRecord> {
        let typical_impact = Severity::parse(&self.typical_impact).ok_or_else(|| {
            IntelError::InvalidRecord(format!("unknown severity: {}", self.typical_impact))
        })?;
        Ok(PatternRecord {
            pattern_type: self.pattern_type,
            description: self.description,
            occurrence_count: self.occurrence_count,
            incident_count: self.incident_count,
            confidence: self.confidence,
            typical_impact,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
        })
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = intel_patterns)]
pub struct NewPatternRow {
    pub pattern_type: String,
    pub description: String,
    pub occurrence_count: i32,
    pub incident_count: i32,
    pub confidence: f64,
    pub typical_impact: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl From<&PatternRecord> for NewPatternRow {
    fn from(record: &PatternRecord) -> Self {
        Self {
            pattern_type: record.pattern_type.clone(),
            description: record.description.clone(),
            occurrence_count: record.occurrence_count,
            incident_count: record.incident_count,
            confidence: record.confidence,
            typical_impact: record.typical_impact.as_str().to_string(),
            first_seen: record.first_seen,
            last_seen: record.last_seen,
        }
    }
}
