//! Risk scorer properties: confidence buckets, factor monotonicity,
//! impact thresholds, failure-mode precedence, and learned-model blending.

use chrono::{TimeZone, Utc};
use intel_engine::error::Result;
use intel_engine::models::commit::CommitRecord;
use intel_engine::models::telemetry::SystemState;
use intel_engine::models::Impact;
use intel_engine::recall::{RecallContext, TemporalContext};
use intel_engine::models::incident::IncidentRecord;
use intel_engine::models::Severity;
use intel_engine::scorer;
use intel_engine::sources::RiskModel;

fn commit(risk_score: f64, blast_radius: i32) -> CommitRecord {
    let now = Utc.with_ymd_and_hms(2025, 6, 4, 14, 0, 0).unwrap();
    let mut c = CommitRecord::neutral("abcdef1234567890", "centrix/api", now);
    c.risk_score = risk_score;
    c.blast_radius = blast_radius;
    c
}

fn incident(id: &str, patterns: &[&str], time_to_detect: Option<i32>) -> IncidentRecord {
    IncidentRecord {
        incident_id: id.to_string(),
        severity: Severity::P2,
        description: "elevated errors".to_string(),
        root_cause_commit: None,
        occurred_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
        time_to_detect_minutes: time_to_detect,
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
    }
}

fn empty_recall() -> RecallContext {
    RecallContext::empty(Utc.with_ymd_and_hms(2025, 6, 4, 14, 0, 0).unwrap())
}

#[test]
fn confidence_buckets_are_boundary_inclusive() {
    let cases = [
        (0, 0.3),
        (9, 0.3),
        (10, 0.6),
        (49, 0.6),
        (50, 0.8),
        (199, 0.8),
        (200, 0.95),
        (500, 0.95),
    ];
    for (count, expected) in cases {
        assert_eq!(
            scorer::confidence_bucket(count),
            expected,
            "memory count {count}"
        );
    }
}

#[test]
fn rule_probability_is_monotone_in_each_factor() {
    let base_commit = commit(4.0, 1);
    let system = SystemState::default();
    let recall = empty_recall();
    let baseline = scorer::rule_probability(&base_commit, &system, &recall);

    // System factor
    let mut degraded_system = SystemState::default();
    degraded_system.health_score = 0.7;
    assert!(scorer::rule_probability(&base_commit, &degraded_system, &recall) >= baseline);

    // Historical factor
    let mut with_history = empty_recall();
    with_history.similar_incidents = vec![incident("i1", &[], None)];
    assert!(scorer::rule_probability(&base_commit, &system, &with_history) >= baseline);

    // Author factor
    let mut with_author = empty_recall();
    with_author.author_stats.incident_rate = 0.5;
    assert!(scorer::rule_probability(&base_commit, &system, &with_author) >= baseline);

    // Time factor
    let mut off_hours = empty_recall();
    off_hours.temporal = TemporalContext {
        day_of_week: "Wed".to_string(),
        hour_of_day: 23,
        is_weekend: false,
        is_off_hours: true,
    };
    assert!(scorer::rule_probability(&base_commit, &system, &off_hours) >= baseline);
}

#[test]
fn rule_probability_is_clamped_to_unit_interval() {
    let hot = commit(10.0, 8);
    let mut system = SystemState::default();
    system.health_score = 0.0;
    let mut recall = empty_recall();
    recall.similar_incidents = (0..10).map(|i| incident(&format!("i{i}"), &[], None)).collect();
    recall.author_stats.incident_rate = 1.0;
    recall.temporal.is_off_hours = true;

    let prob = scorer::rule_probability(&hot, &system, &recall);
    assert_eq!(prob, 1.0);

    let cold = commit(0.0, 0);
    let prob = scorer::rule_probability(&cold, &SystemState::default(), &empty_recall());
    assert!((0.0..=1.0).contains(&prob));
}

#[test]
fn file_risk_factor_is_capped() {
    // Three overlapping-file incidents would add 0.9 uncapped; the factor
    // caps at 0.6.
    let base = commit(0.0, 1);
    let mut recall = empty_recall();
    for i in 0..3 {
        recall.file_incidents.push(intel_engine::recall::FileIncident {
            incident_id: format!("i{i}"),
            severity: Severity::P2,
            involved_files: vec!["src/auth/login.rs".to_string()],
            description: String::new(),
            occurred_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
        });
    }
    let prob = scorer::rule_probability(&base, &SystemState::default(), &recall);
    assert!((prob - 0.6).abs() < 1e-9);
}

#[test]
fn expected_impact_thresholds() {
    assert_eq!(scorer::expected_impact(6), Impact::Critical);
    assert_eq!(scorer::expected_impact(5), Impact::Critical);
    assert_eq!(scorer::expected_impact(3), Impact::High);
    assert_eq!(scorer::expected_impact(2), Impact::Medium);
    assert_eq!(scorer::expected_impact(1), Impact::Low);
    assert_eq!(scorer::expected_impact(0), Impact::Low);
}

#[test]
fn failure_mode_precedence_and_fallback() {
    let mut c = commit(5.0, 1);
    c.risky_patterns = vec!["db_migration".to_string(), "auth_logic".to_string()];
    let recall = empty_recall();
    assert_eq!(
        scorer::failure_mode(&c, &recall).as_deref(),
        Some("Authentication/Authorization failure")
    );

    c.risky_patterns = vec!["dependency_version".to_string(), "api_contract".to_string()];
    assert_eq!(
        scorer::failure_mode(&c, &recall).as_deref(),
        Some("API compatibility break")
    );

    // No recognized pattern: fall back to the most recent similar incident.
    c.risky_patterns = vec!["config_change".to_string()];
    let mut with_history = empty_recall();
    with_history.similar_incidents = vec![incident("i1", &["rate_limit"], None)];
    assert_eq!(
        scorer::failure_mode(&c, &with_history).as_deref(),
        Some("rate_limit")
    );

    assert_eq!(scorer::failure_mode(&c, &recall), None);
}

#[test]
fn eta_comes_from_mean_detection_time() {
    let mut recall = empty_recall();
    recall.similar_incidents = vec![
        incident("i1", &[], Some(20)),
        incident("i2", &[], Some(40)),
    ];
    assert_eq!(
        scorer::eta_to_incident(&recall).as_deref(),
        Some("30 minutes")
    );

    recall.similar_incidents = vec![incident("i1", &[], Some(180))];
    assert_eq!(scorer::eta_to_incident(&recall).as_deref(), Some("3.0 hours"));

    assert_eq!(scorer::eta_to_incident(&empty_recall()), None);
}

struct FixedModel(f64);

impl RiskModel for FixedModel {
    fn is_trained(&self) -> bool {
        true
    }
    fn predict(&self, _features: &[f64]) -> Result<f64> {
        Ok(self.0)
    }
}

struct UntrainedModel;

impl RiskModel for UntrainedModel {
    fn is_trained(&self) -> bool {
        false
    }
    fn predict(&self, _features: &[f64]) -> Result<f64> {
        Err(intel_engine::IntelError::ScorerUntrained)
    }
}

#[test]
fn learned_model_blends_seventy_thirty_and_boosts_confidence() {
    let c = commit(10.0, 1); // rule probability 1.0
    let now = Utc.with_ymd_and_hms(2025, 6, 4, 14, 0, 0).unwrap();
    let recall = empty_recall();

    let model = FixedModel(0.5);
    let prediction = scorer::score(&c, &SystemState::default(), &recall, Some(&model), now);
    assert!((prediction.probability - (0.5 * 0.7 + 1.0 * 0.3)).abs() < 1e-9);
    assert_eq!(prediction.ml_probability, Some(0.5));
    // Bucket 0.3 for empty memory, +0.2 for the learned contribution.
    assert!((prediction.confidence - 0.5).abs() < 1e-9);
}

#[test]
fn untrained_model_falls_back_to_rules_without_boost() {
    let c = commit(10.0, 1);
    let now = Utc.with_ymd_and_hms(2025, 6, 4, 14, 0, 0).unwrap();
    let recall = empty_recall();

    let prediction = scorer::score(
        &c,
        &SystemState::default(),
        &recall,
        Some(&UntrainedModel),
        now,
    );
    assert_eq!(prediction.probability, 1.0);
    assert_eq!(prediction.ml_probability, None);
    assert_eq!(prediction.confidence, 0.3);
}

#[test]
fn feature_vector_order_is_stable() {
    let mut c = commit(7.5, 2);
    c.lines_added = 120;
    c.lines_deleted = 30;
    c.files_changed = 4;
    c.complexity_score = 3.2;
    c.test_ratio = 0.25;
    let now = Utc.with_ymd_and_hms(2025, 6, 6, 9, 0, 0).unwrap(); // Friday 09:00

    assert_eq!(
        scorer::feature_vector(&c, now),
        vec![120.0, 30.0, 4.0, 3.2, 7.5, 0.25, 9.0, 4.0]
    );
}
