//! Root-cause attribution: scoring weights and the deterministic tie-break.

use chrono::{Duration, TimeZone, Utc};
use intel_engine::models::commit::CommitRecord;
use intel_engine::models::incident::IncidentRecord;
use intel_engine::models::Severity;
use intel_engine::rootcause;

fn commit(sha: &str, risk_score: f64, patterns: &[&str], hours_ago: i64) -> CommitRecord {
    let base = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();
    let mut c = CommitRecord::neutral(sha, "centrix/api", base);
    c.risk_score = risk_score;
    c.risky_patterns = patterns.iter().map(|p| p.to_string()).collect();
    c.committed_at = base - Duration::hours(hours_ago);
    c
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn pattern_overlap_dominates_scoring() {
    let commits = vec![
        commit("aaa", 2.0, &["auth_logic"], 1),
        commit("bbb", 2.0, &[], 2),
    ];
    let cause = rootcause::attribute(&commits, &tags(&["auth_logic"]), &[]).unwrap();
    assert_eq!(cause.sha, "aaa");
    assert_eq!(cause.matched_patterns, vec!["auth_logic"]);
    // 1 × 0.4 + 0.2 × 0.3 = 0.46
    assert!((cause.confidence - 0.46).abs() < 1e-9);
}

#[test]
fn historical_evidence_adds_weight() {
    let commits = vec![
        commit("aaa", 0.0, &[], 1),
        commit("bbb", 0.0, &[], 2),
    ];
    let similar = vec![rootcause::SimilarIncident {
        incident_id: "i1".to_string(),
        severity: Severity::P1,
        root_cause_commit: Some("bbb".to_string()),
        occurred_at: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
        pattern_overlap: 1,
        patterns: tags(&["server_error"]),
    }];
    let cause = rootcause::attribute(&commits, &tags(&["server_error"]), &similar).unwrap();
    assert_eq!(cause.sha, "bbb");
    assert!((cause.confidence - 0.3).abs() < 1e-9);
}

#[test]
fn ties_break_to_the_most_recent_candidate() {
    // Identical scores: the earlier entry in the most-recent-first list wins.
    let commits = vec![
        commit("newer", 5.0, &["auth_logic"], 1),
        commit("older", 5.0, &["auth_logic"], 5),
    ];
    let cause = rootcause::attribute(&commits, &tags(&["auth_logic"]), &[]).unwrap();
    assert_eq!(cause.sha, "newer");
}

#[test]
fn confidence_is_capped() {
    let commits = vec![commit(
        "aaa",
        10.0,
        &["auth_failure", "database_connection", "server_error"],
        1,
    )];
    let cause = rootcause::attribute(
        &commits,
        &tags(&["auth_failure", "database_connection", "server_error"]),
        &[],
    )
    .unwrap();
    // 3 × 0.4 + 0.3 = 1.5 raw, capped at 0.95.
    assert_eq!(cause.confidence, 0.95);
}

#[test]
fn no_candidates_yields_none() {
    assert!(rootcause::attribute(&[], &tags(&["server_error"]), &[]).is_none());
}

#[test]
fn similar_incidents_rank_by_overlap_top_five() {
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let mk = |id: &str, patterns: &[&str], days_ago: i64| IncidentRecord {
        incident_id: id.to_string(),
        severity: Severity::P2,
        description: String::new(),
        root_cause_commit: None,
        occurred_at: base - Duration::days(days_ago),
        time_to_detect_minutes: None,
        patterns: tags(patterns),
    };

    let incidents = vec![
        mk("one-match", &["auth_failure"], 1),
        mk("no-match", &["memory_leak"], 2),
        mk("two-match", &["auth_failure", "server_error"], 3),
    ];
    let ranked =
        rootcause::rank_similar(&incidents, &tags(&["auth_failure", "server_error"]));
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].incident_id, "two-match");
    assert_eq!(ranked[0].pattern_overlap, 2);
    assert_eq!(ranked[1].incident_id, "one-match");
}
