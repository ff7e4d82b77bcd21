//! intel.incident — Memory of every production incident.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Severity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub incident_id: String,
    pub severity: Severity,
    pub description: String,
    pub root_cause_commit: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub time_to_detect_minutes: Option<i32>,
    /// Risk-pattern tags involved in the incident.
    pub patterns: Vec<String>,
}
