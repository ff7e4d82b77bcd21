//! Deployment health assessment and rollback policy.
//!
//! Health states are recomputed fresh on every monitoring tick from current
//! vs. baseline telemetry; there is no stored previous-state dependency.

use serde::Serialize;

use crate::config::HealthThresholds;
use crate::models::telemetry::Anomaly;
use crate::models::{HealthStatus, RollbackUrgency, Severity};

/// Whether to roll back, and how urgently.
#[derive(Debug, Clone, Serialize)]
pub struct RollbackDirective {
    pub recommended: bool,
    pub urgency: RollbackUrgency,
    pub reason: String,
    pub action: String,
}

/// Assess deployment health from error-rate deltas and newly observed
/// error patterns.
pub fn assess(
    thresholds: &HealthThresholds,
    error_rate_increase: f64,
    degradation_percent: f64,
    new_patterns: &[String],
    anomalies: &[Anomaly],
) -> HealthStatus {
    // Critical: major error-rate spike or several new failure signatures.
    if error_rate_increase > thresholds.critical_error_rate_increase
        || new_patterns.len() >= thresholds.critical_new_patterns
    {
        return HealthStatus::Critical;
    }

    if error_rate_increase > thresholds.unhealthy_error_rate_increase
        || degradation_percent > thresholds.unhealthy_degradation_percent
    {
        return HealthStatus::Unhealthy;
    }

    if error_rate_increase > thresholds.degraded_error_rate_increase
        || !new_patterns.is_empty()
        || !anomalies.is_empty()
    {
        return HealthStatus::Degraded;
    }

    HealthStatus::Healthy
}

/// Rollback policy as a function of health state and the deployment's
/// original predicted risk.
pub fn rollback_policy(status: HealthStatus, predicted_risk: f64) -> RollbackDirective {
    match status {
        HealthStatus::Critical => RollbackDirective {
            recommended: true,
            urgency: RollbackUrgency::Immediate,
            reason: "Critical errors detected - immediate rollback required".to_string(),
            action: "Execute rollback now".to_string(),
        },
        HealthStatus::Unhealthy if predicted_risk >= 0.7 => RollbackDirective {
            recommended: true,
            urgency: RollbackUrgency::High,
            reason: "High-risk deployment showing degradation".to_string(),
            action: "Rollback within 15 minutes if not improving".to_string(),
        },
        HealthStatus::Unhealthy => RollbackDirective {
            recommended: true,
            urgency: RollbackUrgency::Medium,
            reason: "Deployment health degraded".to_string(),
            action: "Monitor closely, prepare rollback".to_string(),
        },
        HealthStatus::Degraded => RollbackDirective {
            recommended: false,
            urgency: RollbackUrgency::Low,
            reason: "Minor issues detected".to_string(),
            action: "Continue monitoring, investigate errors".to_string(),
        },
        HealthStatus::Healthy => RollbackDirective {
            recommended: false,
            urgency: RollbackUrgency::None,
            reason: "Deployment healthy".to_string(),
            action: "Continue normal monitoring".to_string(),
        },
    }
}

/// Severity of the auto-incident synthesized when a deployment goes bad:
/// P2 for a degraded escalation, P1 otherwise.
pub fn auto_incident_severity(status: HealthStatus) -> Severity {
    if status == HealthStatus::Degraded {
        Severity::P2
    } else {
        Severity::P1
    }
}
