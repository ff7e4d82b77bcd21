//! End-to-end engine flows over the in-memory store with stub backends.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use intel_engine::config::EngineConfig;
use intel_engine::engine::IntelligenceEngine;
use intel_engine::error::Result;
use intel_engine::models::commit::CommitRecord;
use intel_engine::models::telemetry::{LogEntry, SystemState};
use intel_engine::models::{Action, HealthStatus, Impact, Severity};
use intel_engine::recall::RecallContext;
use intel_engine::scorer;
use intel_engine::recommend;
use intel_engine::sources::{
    AuthorHistory, ChangedFile, CommitChain, CommitSource, CommitStats, LogChain,
};
use intel_engine::store::memory::InMemoryStore;
use intel_engine::store::MemoryStore;
use intel_engine::IntelError;

struct StubCommitSource {
    files: Vec<&'static str>,
}

#[async_trait]
impl CommitSource for StubCommitSource {
    fn name(&self) -> &'static str {
        "stub"
    }
    async fn health_check(&self) -> bool {
        true
    }
    async fn commit_details(&self, sha: &str) -> Result<CommitStats> {
        Ok(CommitStats {
            sha: sha.to_string(),
            message: "feat: session token refresh".to_string(),
            author: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 6, 4, 14, 0, 0).unwrap(),
            additions: 240,
            deletions: 80,
            files: self
                .files
                .iter()
                .map(|f| ChangedFile {
                    filename: f.to_string(),
                    additions: 30,
                    deletions: 10,
                })
                .collect(),
        })
    }
    async fn author_history(&self, _email: &str, _window_days: u32) -> Result<AuthorHistory> {
        Ok(AuthorHistory {
            total_commits: 12,
            avg_files_changed: 3.5,
        })
    }
    async fn commit_diff(&self, _sha: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

struct FailingCommitSource;

#[async_trait]
impl CommitSource for FailingCommitSource {
    fn name(&self) -> &'static str {
        "failing"
    }
    async fn health_check(&self) -> bool {
        true
    }
    async fn commit_details(&self, sha: &str) -> Result<CommitStats> {
        Err(IntelError::SourceUnavailable(sha.to_string()))
    }
    async fn author_history(&self, email: &str, _window_days: u32) -> Result<AuthorHistory> {
        Err(IntelError::SourceUnavailable(email.to_string()))
    }
    async fn commit_diff(&self, _sha: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

fn log(level: &str, message: &str) -> LogEntry {
    LogEntry {
        timestamp: Utc::now(),
        level: level.to_string(),
        message: message.to_string(),
        service: "api".to_string(),
    }
}

fn engine_with(store: Arc<InMemoryStore>, files: Vec<&'static str>) -> IntelligenceEngine {
    IntelligenceEngine::new(
        store,
        CommitChain::new(vec![Arc::new(StubCommitSource { files })]),
        LogChain::new(vec![]),
        None,
        None,
        None,
        EngineConfig::default(),
    )
}

#[tokio::test]
async fn analyzing_the_same_commit_twice_keeps_one_record() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_with(store.clone(), vec!["src/api/routes.rs"]);

    engine
        .analyze_deployment("abc123def456", "centrix/api", Some("d-1"))
        .await
        .unwrap();
    engine
        .analyze_deployment("abc123def456", "centrix/api", Some("d-2"))
        .await
        .unwrap();

    assert_eq!(store.count_commits().await.unwrap(), 1);
    assert!(store.get_deployment("d-1").await.unwrap().is_some());
    assert!(store.get_deployment("d-2").await.unwrap().is_some());
}

#[tokio::test]
async fn duplicate_deployment_id_is_rejected_but_analysis_still_returns() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_with(store.clone(), vec!["src/api/routes.rs"]);

    engine
        .analyze_deployment("abc123def456", "centrix/api", Some("d-1"))
        .await
        .unwrap();
    let report = engine
        .analyze_deployment("abc123def456", "centrix/api", Some("d-1"))
        .await
        .unwrap();

    assert!(report.degraded.contains(&"deployment_write"));
    assert_eq!(
        store
            .count_deployments_since(Utc::now() - Duration::hours(1))
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn unavailable_sources_degrade_to_neutral_defaults() {
    let store = Arc::new(InMemoryStore::new());
    let engine = IntelligenceEngine::new(
        store.clone(),
        CommitChain::new(vec![Arc::new(FailingCommitSource)]),
        LogChain::new(vec![]),
        None,
        None,
        None,
        EngineConfig::default(),
    );

    let report = engine
        .analyze_deployment("deadbeef0123", "centrix/api", None)
        .await
        .unwrap();

    assert_eq!(report.analysis.risk_score, 5.0);
    assert!(report.degraded.contains(&"commit_source"));
    assert!(report.degraded.contains(&"log_backend"));
    // Telemetry failure must not penalize health score.
    assert_eq!(report.system_state.health_score, 1.0);
    // The neutral commit is still remembered.
    assert_eq!(store.count_commits().await.unwrap(), 1);
}

#[tokio::test]
async fn analysis_report_carries_prediction_and_monitoring_plan() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_with(
        store.clone(),
        vec!["src/auth/login.rs", "migrations/0007_tokens.sql"],
    );

    let report = engine
        .analyze_deployment("abc123def456", "centrix/api", Some("d-1"))
        .await
        .unwrap();

    assert!(report
        .analysis
        .patterns_detected
        .contains(&"auth_logic".to_string()));
    assert!((0.0..=1.0).contains(&report.prediction.probability));
    assert_eq!(
        report.prediction.failure_mode.as_deref(),
        Some("Authentication/Authorization failure")
    );
    assert!(!report.monitoring.watch_metrics.is_empty());
    assert!(report
        .monitoring
        .watch_metrics
        .contains(&"auth_failures".to_string()));

    let stored = store.get_commit("abc123def456").await.unwrap().unwrap();
    assert!(stored.prediction_details.is_some());
}

#[tokio::test]
async fn recorded_incident_links_deployment_and_learns_patterns() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_with(store.clone(), vec!["src/auth/login.rs"]);

    engine
        .analyze_deployment("abc123def456", "centrix/api", Some("d-1"))
        .await
        .unwrap();
    engine
        .record_incident(
            "inc-42",
            Severity::P1,
            "login failures spiking",
            Some("abc123def456"),
            vec!["auth_logic".to_string()],
        )
        .await
        .unwrap();

    let deployment = store.get_deployment("d-1").await.unwrap().unwrap();
    assert!(deployment.resulted_in_incident);
    assert_eq!(deployment.incident_id.as_deref(), Some("inc-42"));

    let pattern = store.get_pattern("auth_logic").await.unwrap().unwrap();
    assert_eq!(pattern.confidence, 0.6);

    // A second incident with the same id is rejected.
    let err = engine
        .record_incident("inc-42", Severity::P2, "dup", None, vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, IntelError::InvalidRecord(_)));
}

#[tokio::test]
async fn unhealthy_deployment_synthesizes_one_auto_incident() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_with(store.clone(), vec!["src/db/pool.rs"]);

    engine
        .analyze_deployment("abc123def456", "centrix/api", Some("d-1"))
        .await
        .unwrap();

    // 30% error rate over a zero baseline, plus a database signature.
    let mut entries = vec![
        log("error", "database connection timeout on primary"),
        log("error", "database connection timeout on primary"),
        log("error", "database connection timeout on primary"),
    ];
    for _ in 0..7 {
        entries.push(log("info", "request ok"));
    }

    let report = engine
        .monitor_deployment_health("d-1", &entries, 20)
        .await
        .unwrap();

    assert_eq!(report.health_status, HealthStatus::Critical);
    assert!(report.rollback.recommended);
    assert_eq!(
        report.changes.new_error_patterns,
        vec!["database_connection".to_string()]
    );

    let deployment = store.get_deployment("d-1").await.unwrap().unwrap();
    assert!(deployment.resulted_in_incident);
    assert_eq!(deployment.incident_id.as_deref(), Some("auto-d-1"));
    // The learning loop closed: the signature became a pattern.
    assert!(store
        .get_pattern("database_connection")
        .await
        .unwrap()
        .is_some());

    // A second tick on the same deployment does not synthesize another.
    let before = store
        .count_incidents_since(Utc::now() - Duration::hours(1))
        .await
        .unwrap();
    engine
        .monitor_deployment_health("d-1", &entries, 25)
        .await
        .unwrap();
    let after = store
        .count_incidents_since(Utc::now() - Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn monitoring_an_unknown_deployment_fails() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_with(store, vec![]);
    let err = engine
        .monitor_deployment_health("missing", &[], 5)
        .await
        .unwrap_err();
    assert!(matches!(err, IntelError::DeploymentNotFound(_)));
}

#[tokio::test]
async fn root_cause_flows_from_memory_to_report() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_with(store.clone(), vec!["src/auth/login.rs"]);

    engine
        .analyze_deployment("abc123def456", "centrix/api", Some("d-1"))
        .await
        .unwrap();

    let errors = vec![
        log("error", "auth handshake failed for session"),
        log("error", "auth handshake failed for session"),
    ];
    // Shortly after the stub commit's June 4th 14:00 timestamp.
    let incident_at = Utc.with_ymd_and_hms(2025, 6, 5, 2, 0, 0).unwrap();
    let report = engine
        .detect_incident_cause(incident_at, Some(&errors))
        .await
        .unwrap();

    assert_eq!(report.recent_commits.len(), 1);
    assert_eq!(report.log_evidence.patterns, vec!["auth_failure"]);
    let cause = report.likely_root_cause.unwrap();
    assert_eq!(cause.sha, "abc123def456");
    assert!(report.confidence > 0.0);
}

// End-to-end decision composition: a hot commit on an off-hours weekday
// with incident history must be blocked.
#[tokio::test]
async fn high_risk_scenario_is_blocked() {
    let now = Utc.with_ymd_and_hms(2025, 6, 4, 23, 30, 0).unwrap(); // Wed 23:30
    let mut commit = CommitRecord::neutral("feedface0000", "centrix/api", now);
    commit.risk_score = 9.0;
    commit.blast_radius = 6;
    commit.test_ratio = 0.1;
    commit.risky_patterns = vec!["auth_logic".to_string()];
    commit.files = vec!["src/auth/login.rs".to_string()];

    let mut recall = RecallContext::empty(now);
    let incident_at = now - Duration::days(3);
    for i in 0..2 {
        recall.similar_incidents.push(
            intel_engine::models::incident::IncidentRecord {
                incident_id: format!("i{i}"),
                severity: Severity::P1,
                description: "auth outage".to_string(),
                root_cause_commit: None,
                occurred_at: incident_at,
                time_to_detect_minutes: Some(15),
                patterns: vec!["auth_failure".to_string()],
            },
        );
    }
    recall.file_incidents.push(intel_engine::recall::FileIncident {
        incident_id: "i9".to_string(),
        severity: Severity::P1,
        involved_files: vec!["src/auth/login.rs".to_string()],
        description: "login outage".to_string(),
        occurred_at: incident_at,
    });

    let prediction = scorer::score(&commit, &SystemState::default(), &recall, None, now);
    assert!(prediction.probability >= 0.8);
    assert_eq!(prediction.expected_impact, Impact::Critical);
    assert_eq!(
        prediction.failure_mode.as_deref(),
        Some("Authentication/Authorization failure")
    );

    let action = recommend::decide_action(prediction.probability);
    assert_eq!(action, Action::Block);

    let recommendations = recommend::recommendations(
        &commit,
        &SystemState::default(),
        &recall,
        &prediction,
        0.05,
    );
    assert!(recommendations
        .iter()
        .any(|r| r.contains("BLOCK DEPLOYMENT")));
    assert!(recommendations.iter().any(|r| r.contains("Low test coverage")));
    assert!(recommendations.iter().any(|r| r.contains("Off-hours deploy")));
}
