//! Pattern learner: confidence grows monotonically and converges at 0.99.

use chrono::{Duration, TimeZone, Utc};
use intel_engine::models::incident::IncidentRecord;
use intel_engine::models::Severity;
use intel_engine::patterns;
use intel_engine::store::memory::InMemoryStore;
use intel_engine::store::MemoryStore;

fn incident(id: &str, pattern_tags: &[&str]) -> IncidentRecord {
    IncidentRecord {
        incident_id: id.to_string(),
        severity: Severity::P1,
        description: "login outage".to_string(),
        root_cause_commit: None,
        occurred_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        time_to_detect_minutes: Some(12),
        patterns: pattern_tags.iter().map(|p| p.to_string()).collect(),
    }
}

#[tokio::test]
async fn first_occurrence_starts_at_point_six_with_incident_severity() {
    let store = InMemoryStore::new();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    patterns::learn_from_incident(&store, &incident("i1", &["auth_logic"]), now)
        .await
        .unwrap();

    let pattern = store.get_pattern("auth_logic").await.unwrap().unwrap();
    assert_eq!(pattern.confidence, 0.6);
    assert_eq!(pattern.occurrence_count, 1);
    assert_eq!(pattern.incident_count, 1);
    assert_eq!(pattern.typical_impact, Severity::P1);
    assert_eq!(pattern.first_seen, now);
}

#[tokio::test]
async fn ten_reinforcements_converge_at_the_cap() {
    let store = InMemoryStore::new();
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    let mut previous = 0.0;
    for i in 0..11 {
        let now = base + Duration::days(i);
        patterns::learn_from_incident(&store, &incident(&format!("i{i}"), &["db_migration"]), now)
            .await
            .unwrap();

        let confidence = store
            .get_pattern("db_migration")
            .await
            .unwrap()
            .unwrap()
            .confidence;
        assert!(confidence >= previous, "confidence must never decrease");
        assert!(confidence <= 0.99);
        previous = confidence;
    }

    // 0.6 + 10 × 0.05 = 1.1, capped.
    let pattern = store.get_pattern("db_migration").await.unwrap().unwrap();
    assert_eq!(pattern.confidence, 0.99);
    assert_eq!(pattern.occurrence_count, 11);
    assert_eq!(pattern.last_seen, base + Duration::days(10));
}

#[tokio::test]
async fn every_tag_on_the_incident_is_learned() {
    let store = InMemoryStore::new();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    patterns::learn_from_incident(
        &store,
        &incident("i1", &["auth_logic", "db_migration"]),
        now,
    )
    .await
    .unwrap();

    assert!(store.get_pattern("auth_logic").await.unwrap().is_some());
    assert!(store.get_pattern("db_migration").await.unwrap().is_some());
    assert!(store.get_pattern("api_contract").await.unwrap().is_none());
}

#[tokio::test]
async fn recall_threshold_filters_low_confidence_patterns() {
    let store = InMemoryStore::new();
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    // One reinforcement: confidence 0.65, below the 0.7 recall threshold.
    for i in 0..2 {
        patterns::learn_from_incident(
            &store,
            &incident(&format!("a{i}"), &["config_change"]),
            base + Duration::days(i),
        )
        .await
        .unwrap();
    }
    // Four reinforcements: confidence 0.75.
    for i in 0..4 {
        patterns::learn_from_incident(
            &store,
            &incident(&format!("b{i}"), &["auth_logic"]),
            base + Duration::days(i),
        )
        .await
        .unwrap();
    }

    let matches = store.patterns_above_confidence(0.7, 5).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].pattern_type, "auth_logic");
    assert!((matches[0].confidence - 0.75).abs() < 1e-9);
}
