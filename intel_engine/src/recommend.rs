//! Recommendation generation — a pure function of commit, memory, and
//! prediction, evaluated in a fixed rule order so output is deterministic.

use std::collections::BTreeSet;

use crate::models::commit::CommitRecord;
use crate::models::telemetry::SystemState;
use crate::models::Action;
use crate::recall::RecallContext;
use crate::report::{AlertThresholds, MonitoringPlan};
use crate::scorer::Prediction;

/// Categorical deployment action from fused probability.
pub fn decide_action(probability: f64) -> Action {
    if probability >= 0.8 {
        Action::Block
    } else if probability >= 0.6 {
        Action::StagedRollout
    } else if probability >= 0.4 {
        Action::ProceedWithCaution
    } else {
        Action::Proceed
    }
}

/// Ordered, human-readable recommendations. Rule order is fixed:
/// risk tier, pattern-specific, test coverage, temporal, system state,
/// historical, file-specific.
pub fn recommendations(
    commit: &CommitRecord,
    system: &SystemState,
    recall: &RecallContext,
    prediction: &Prediction,
    elevated_error_rate: f64,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    let prob = prediction.probability;

    if prob >= 0.8 {
        recommendations.push("BLOCK DEPLOYMENT - High incident probability".to_string());
    } else if prob >= 0.6 {
        recommendations.push("Use staged/canary rollout".to_string());
    } else if prob >= 0.4 {
        recommendations.push("Deploy with enhanced monitoring".to_string());
    }

    let has = |tag: &str| commit.risky_patterns.iter().any(|p| p == tag);
    if has("auth_logic") {
        recommendations.push("Enable verbose auth logging before deploy".to_string());
    }
    if has("db_migration") {
        recommendations
            .push("Test migration on staging with production data volume".to_string());
    }

    if commit.test_ratio < 0.2 {
        recommendations.push("Low test coverage - add integration tests".to_string());
    }

    if recall.temporal.is_off_hours {
        recommendations.push("Off-hours deploy - ensure on-call coverage".to_string());
    }
    if recall.temporal.is_weekend {
        recommendations.push("Weekend deploy - consider waiting for Monday".to_string());
    }

    if system.error_rate > elevated_error_rate {
        recommendations.push("System already has elevated errors - stabilize first".to_string());
    }

    if !recall.similar_incidents.is_empty() {
        recommendations.push(format!(
            "{} similar incidents in past 90 days - review history",
            recall.similar_incidents.len()
        ));
    }

    if !recall.file_incidents.is_empty() {
        let involved: BTreeSet<&str> = recall
            .file_incidents
            .iter()
            .flat_map(|i| i.involved_files.iter().map(|f| f.as_str()))
            .collect();
        let involved: Vec<&str> = involved.into_iter().collect();
        recommendations.push(format!(
            "HIGH RISK: files [{}] have caused {} recent incidents",
            involved.join(", "),
            recall.file_incidents.len()
        ));
    }

    recommendations
}

/// What to watch after the deploy, how tightly, and for how long.
pub fn monitoring_plan(commit: &CommitRecord, prediction: &Prediction) -> MonitoringPlan {
    let mut watch_metrics = vec![
        "error_rate".to_string(),
        "p95_latency".to_string(),
        "cpu_usage".to_string(),
    ];

    let has = |tag: &str| commit.risky_patterns.iter().any(|p| p == tag);
    if has("auth_logic") {
        watch_metrics.push("auth_failures".to_string());
        watch_metrics.push("unauthorized_attempts".to_string());
    }
    if has("db_migration") {
        watch_metrics.push("db_connection_pool".to_string());
        watch_metrics.push("query_time".to_string());
        watch_metrics.push("deadlocks".to_string());
    }
    if has("api_contract") {
        watch_metrics.push("4xx_errors".to_string());
        watch_metrics.push("5xx_errors".to_string());
        watch_metrics.push("request_validation_errors".to_string());
    }

    // Higher risk tightens alert thresholds.
    let alert_thresholds = if prediction.probability >= 0.7 {
        AlertThresholds {
            error_rate: 0.01,
            latency_increase: 0.10,
        }
    } else if prediction.probability >= 0.4 {
        AlertThresholds {
            error_rate: 0.03,
            latency_increase: 0.20,
        }
    } else {
        AlertThresholds {
            error_rate: 0.05,
            latency_increase: 0.30,
        }
    };

    let duration = if commit.risk_score >= 8.0 {
        "24 hours"
    } else if commit.risk_score >= 6.0 {
        "12 hours"
    } else if commit.risk_score >= 4.0 {
        "6 hours"
    } else {
        "2 hours"
    };

    MonitoringPlan {
        watch_metrics,
        alert_thresholds,
        duration: duration.to_string(),
    }
}
