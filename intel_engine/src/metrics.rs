//! Prometheus metrics for engine observability.

use metrics::{counter, gauge, histogram};

/// Record a completed deployment analysis and its decided action.
pub fn analysis_completed(action: &str) {
    counter!("intel_analyses_total", "action" => action.to_string()).increment(1);
}

/// Record analysis latency.
pub fn analysis_duration(duration_ms: u64) {
    histogram!("intel_analysis_duration_ms").record(duration_ms as f64);
}

/// Record a recorded incident.
pub fn incident_recorded(severity: &str) {
    counter!("intel_incidents_total", "severity" => severity.to_string()).increment(1);
}

/// Record a pattern reinforcement.
pub fn pattern_reinforced(pattern: &str) {
    counter!("intel_pattern_reinforcements_total", "pattern" => pattern.to_string()).increment(1);
}

/// Record a health assessment outcome.
pub fn health_assessed(status: &str) {
    counter!("intel_health_checks_total", "status" => status.to_string()).increment(1);
}

/// Record a rollback recommendation.
pub fn rollback_recommended(urgency: &str) {
    counter!("intel_rollbacks_recommended_total", "urgency" => urgency.to_string()).increment(1);
}

/// Record a degraded fallback path being taken.
pub fn degraded_path(which: &str) {
    counter!("intel_degraded_paths_total", "path" => which.to_string()).increment(1);
}

/// Record one background poll tick.
pub fn poll_tick(kind: &str) {
    counter!("intel_poll_ticks_total", "kind" => kind.to_string()).increment(1);
}

/// Set the current size of commit memory.
pub fn memory_size(count: i64) {
    gauge!("intel_memory_commits").set(count as f64);
}
