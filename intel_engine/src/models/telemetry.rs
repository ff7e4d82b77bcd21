//! Telemetry wire types — log entries, metric snapshots, system state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One log line from whatever backend is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub service: String,
}

impl LogEntry {
    pub fn is_error(&self) -> bool {
        matches!(self.level.to_lowercase().as_str(), "error" | "critical")
    }

    pub fn is_warning(&self) -> bool {
        self.level.eq_ignore_ascii_case("warning")
    }
}

/// Current system metrics from the metric backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub error_rate: f64,
    pub request_rate: f64,
}

/// An anomaly surfaced by log analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: String,
    pub severity: String,
    pub message: String,
}

/// Live system health, captured as the pre-deploy baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub error_rate: f64,
    pub request_rate: f64,
    pub recent_errors: i64,
    pub anomalies: Vec<Anomaly>,
    /// In [0, 1]; 1.0 means fully healthy.
    pub health_score: f64,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            cpu_usage: 0.0,
            memory_usage: 0.0,
            error_rate: 0.0,
            request_rate: 0.0,
            recent_errors: 0,
            anomalies: Vec::new(),
            health_score: 1.0,
        }
    }
}
