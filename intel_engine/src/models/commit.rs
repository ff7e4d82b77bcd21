//! intel.commit — Long-term memory of every analyzed commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One analyzed commit. Created at analysis time and never mutated
/// afterwards, except `files`/`prediction_details` enrichment at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub repository: String,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub files_changed: i32,
    pub lines_added: i32,
    pub lines_deleted: i32,
    /// Heuristic risk estimate, clamped to [0, 10].
    pub risk_score: f64,
    pub complexity_score: f64,
    /// Distinct directories touched; proxy for change breadth.
    pub blast_radius: i32,
    /// Test files / total files, in [0, 1].
    pub test_ratio: f64,
    pub commit_type: String,
    pub risky_patterns: Vec<String>,
    pub files: Vec<String>,
    pub prediction_details: Option<serde_json::Value>,
    pub committed_at: DateTime<Utc>,
    pub analyzed_at: DateTime<Utc>,
}

impl CommitRecord {
    /// A neutral placeholder used when every commit source is unavailable.
    pub fn neutral(sha: &str, repository: &str, now: DateTime<Utc>) -> Self {
        Self {
            sha: sha.to_string(),
            repository: repository.to_string(),
            author: None,
            author_email: None,
            files_changed: 0,
            lines_added: 0,
            lines_deleted: 0,
            risk_score: 5.0,
            complexity_score: 0.0,
            blast_radius: 0,
            test_ratio: 0.0,
            commit_type: "unknown".to_string(),
            risky_patterns: Vec::new(),
            files: Vec::new(),
            prediction_details: None,
            committed_at: now,
            analyzed_at: now,
        }
    }

    /// Enforce the [0, 10] risk-score and [0, 1] test-ratio invariants.
    pub fn clamp_scores(&mut self) {
        self.risk_score = self.risk_score.clamp(0.0, 10.0);
        self.test_ratio = self.test_ratio.clamp(0.0, 1.0);
    }
}
