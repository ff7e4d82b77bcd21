//! Health-state determinism and the rollback policy table.

use intel_engine::config::HealthThresholds;
use intel_engine::health;
use intel_engine::models::telemetry::Anomaly;
use intel_engine::models::{HealthStatus, RollbackUrgency, Severity};

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn anomaly() -> Anomaly {
    Anomaly {
        kind: "high_error_rate".to_string(),
        severity: "high".to_string(),
        message: "Error rate is 40.0% (threshold: 30%)".to_string(),
    }
}

#[test]
fn health_state_is_deterministic() {
    let t = HealthThresholds::default();

    // Rate threshold alone triggers CRITICAL.
    assert_eq!(
        health::assess(&t, 0.25, 0.0, &tags(&["auth_failure"]), &[]),
        HealthStatus::Critical
    );
    // Pattern-count threshold alone triggers CRITICAL.
    assert_eq!(
        health::assess(&t, 0.0, 0.0, &tags(&["a", "b", "c"]), &[]),
        HealthStatus::Critical
    );
    assert_eq!(
        health::assess(&t, 0.12, 50.0, &[], &[]),
        HealthStatus::Unhealthy
    );
    assert_eq!(
        health::assess(&t, 0.0, 0.0, &[], &[anomaly()]),
        HealthStatus::Degraded
    );
    assert_eq!(health::assess(&t, 0.0, 0.0, &[], &[]), HealthStatus::Healthy);
}

#[test]
fn degradation_percent_alone_is_unhealthy() {
    let t = HealthThresholds::default();
    assert_eq!(
        health::assess(&t, 0.06, 150.0, &[], &[]),
        HealthStatus::Unhealthy
    );
}

#[test]
fn single_new_pattern_is_degraded() {
    let t = HealthThresholds::default();
    assert_eq!(
        health::assess(&t, 0.0, 0.0, &tags(&["server_error"]), &[]),
        HealthStatus::Degraded
    );
}

#[test]
fn rollback_policy_table() {
    let d = health::rollback_policy(HealthStatus::Critical, 0.1);
    assert!(d.recommended);
    assert_eq!(d.urgency, RollbackUrgency::Immediate);

    let d = health::rollback_policy(HealthStatus::Unhealthy, 0.75);
    assert!(d.recommended);
    assert_eq!(d.urgency, RollbackUrgency::High);

    let d = health::rollback_policy(HealthStatus::Unhealthy, 0.3);
    assert!(d.recommended);
    assert_eq!(d.urgency, RollbackUrgency::Medium);

    let d = health::rollback_policy(HealthStatus::Degraded, 0.9);
    assert!(!d.recommended);
    assert_eq!(d.urgency, RollbackUrgency::Low);

    let d = health::rollback_policy(HealthStatus::Healthy, 0.9);
    assert!(!d.recommended);
    assert_eq!(d.urgency, RollbackUrgency::None);
}

#[test]
fn auto_incident_severity_mapping() {
    assert_eq!(
        health::auto_incident_severity(HealthStatus::Critical),
        Severity::P1
    );
    assert_eq!(
        health::auto_incident_severity(HealthStatus::Unhealthy),
        Severity::P1
    );
    assert_eq!(
        health::auto_incident_severity(HealthStatus::Degraded),
        Severity::P2
    );
}
