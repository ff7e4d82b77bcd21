//! intel.deployment — One deployment attempt and what was predicted for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::telemetry::SystemState;
use super::{Action, Impact};

/// Links a commit to a production outcome. Created at deploy time; mutated
/// exactly once, when an incident is later attributed to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployment_id: String,
    pub commit_sha: String,
    pub repository: String,
    pub deployed_at: DateTime<Utc>,
    /// Fused incident probability at deploy time, in [0, 1].
    pub predicted_risk: f64,
    pub predicted_impact: Impact,
    pub recommended_action: Action,
    /// Telemetry snapshot captured at deploy time; the post-deploy baseline.
    pub system_state: SystemState,
    pub resulted_in_incident: bool,
    pub incident_id: Option<String>,
}

impl DeploymentRecord {
    pub fn clamp_scores(&mut self) {
        self.predicted_risk = self.predicted_risk.clamp(0.0, 1.0);
    }
}
