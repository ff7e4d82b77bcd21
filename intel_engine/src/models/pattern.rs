//! intel.pattern — A learned risk-indicating tag with reinforced confidence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Severity;

/// Created lazily on first occurrence, updated forever, never deleted.
/// Confidence only grows, capped at 0.99: the memory never forgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRecord {
    pub pattern_type: String,
    pub description: String,
    pub occurrence_count: i32,
    pub incident_count: i32,
    /// In [0, 1], monotonically non-decreasing, capped at 0.99.
    pub confidence: f64,
    pub typical_impact: Severity,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl PatternRecord {
    /// A freshly observed pattern starts at confidence 0.6 and inherits the
    /// severity of the incident that surfaced it.
    pub fn first_occurrence(pattern_type: &str, severity: Severity, now: DateTime<Utc>) -> Self {
        Self {
            pattern_type: pattern_type.to_string(),
            description: format!("Pattern: {pattern_type}"),
            occurrence_count: 1,
            incident_count: 1,
            confidence: 0.6,
            typical_impact: severity,
            first_seen: now,
            last_seen: now,
        }
    }

    /// Reinforce with one more incident observation.
    pub fn reinforce(&mut self, now: DateTime<Utc>) {
        self.occurrence_count += 1;
        self.incident_count += 1;
        self.confidence = (self.confidence + 0.05).min(0.99);
        self.last_seen = now;
    }
}
