//! Commit feature extraction — turns raw commit stats into the scored,
//! pattern-tagged record the decision engine works with.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::models::commit::CommitRecord;
use crate::sources::{ChangedFile, CommitStats};

/// Heuristic 0–10 risk score from commit shape and timing.
pub fn risk_score(stats: &CommitStats, test_ratio: f64) -> f64 {
    let mut score = 0.0;

    // File count factor (0-3 points)
    score += (stats.files.len() as f64 / 10.0).min(3.0);

    // Code churn factor (0-3 points)
    let churn = (stats.additions + stats.deletions) as f64;
    score += (churn / 200.0).min(3.0);

    // Test coverage factor (0-2 points)
    score += (1.0 - test_ratio) * 2.0;

    // Weekend/night commit factor (0-2 points)
    let hour = stats.timestamp.hour();
    let weekday = stats.timestamp.weekday().num_days_from_monday();
    if weekday >= 5 || hour < 6 || hour > 22 {
        score += 2.0;
    }

    score.min(10.0)
}

/// Complexity from file spread, language spread, churn, and directory depth.
pub fn complexity_score(stats: &CommitStats) -> f64 {
    let extensions: BTreeSet<&str> = stats
        .files
        .iter()
        .filter_map(|f| f.filename.rsplit_once('.').map(|(_, ext)| ext))
        .collect();

    let total_changes = (stats.additions + stats.deletions) as f64;
    let complexity = stats.files.len() as f64 * 0.5
        + extensions.len() as f64 * 0.3
        + total_changes / 100.0
        + directory_depth(&stats.files) as f64 * 0.2;

    complexity.min(10.0)
}

/// Count of distinct directories touched.
pub fn blast_radius(files: &[ChangedFile]) -> i32 {
    let directories: BTreeSet<&str> = files
        .iter()
        .filter_map(|f| f.filename.rsplit_once('/').map(|(dir, _)| dir))
        .collect();
    directories.len() as i32
}

/// Ratio of test files to total files, in [0, 1].
pub fn test_ratio(files: &[ChangedFile]) -> f64 {
    if files.is_empty() {
        return 0.0;
    }
    let test_files = files
        .iter()
        .filter(|f| {
            let name = f.filename.to_lowercase();
            name.contains("test") || name.starts_with("tests/")
        })
        .count();
    test_files as f64 / files.len() as f64
}

fn directory_depth(files: &[ChangedFile]) -> usize {
    if files.is_empty() {
        return 0;
    }
    let total: usize = files
        .iter()
        .map(|f| f.filename.matches('/').count())
        .sum();
    total / files.len()
}

/// Classify a commit from its message keywords.
pub fn classify_commit_type(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    if ["fix", "bug", "hotfix", "patch"].iter().any(|w| lower.contains(w)) {
        "bugfix"
    } else if ["feat", "feature", "add"].iter().any(|w| lower.contains(w)) {
        "feature"
    } else if ["refactor", "cleanup", "improve"].iter().any(|w| lower.contains(w)) {
        "refactor"
    } else if ["test", "spec"].iter().any(|w| lower.contains(w)) {
        "test"
    } else if ["doc", "readme"].iter().any(|w| lower.contains(w)) {
        "documentation"
    } else {
        "other"
    }
}

/// Extract risk-pattern tags from the paths a commit touches.
pub fn extract_risky_patterns(files: &[ChangedFile]) -> Vec<String> {
    let mut patterns = BTreeSet::new();

    for file in files {
        let name = file.filename.to_lowercase();

        if name.contains("migration") || name.contains("schema") {
            patterns.insert("db_migration");
        }
        if name.contains("auth") || name.contains("login") || name.contains("permission") {
            patterns.insert("auth_logic");
        }
        if ["config", "settings", ".env", "dockerfile"]
            .iter()
            .any(|n| name.contains(n))
        {
            patterns.insert("config_change");
        }
        if [
            "requirements.txt",
            "package.json",
            "go.mod",
            "pom.xml",
            "cargo.toml",
            "cargo.lock",
        ]
        .iter()
        .any(|n| name.contains(n))
        {
            patterns.insert("dependency_version");
        }
        if name.contains("api") || name.contains("schema") || name.contains(".proto") {
            patterns.insert("api_contract");
        }
    }

    patterns.into_iter().map(|p| p.to_string()).collect()
}

/// Build the analyzed commit record from raw source stats.
pub fn build_record(stats: &CommitStats, repository: &str, now: DateTime<Utc>) -> CommitRecord {
    let test_ratio = test_ratio(&stats.files);
    let mut record = CommitRecord {
        sha: stats.sha.clone(),
        repository: repository.to_string(),
        author: Some(stats.author.clone()),
        author_email: Some(stats.email.clone()),
        files_changed: stats.files.len() as i32,
        lines_added: stats.additions,
        lines_deleted: stats.deletions,
        risk_score: risk_score(stats, test_ratio),
        complexity_score: complexity_score(stats),
        blast_radius: blast_radius(&stats.files),
        test_ratio,
        commit_type: classify_commit_type(&stats.message).to_string(),
        risky_patterns: extract_risky_patterns(&stats.files),
        files: stats.files.iter().map(|f| f.filename.clone()).collect(),
        prediction_details: None,
        committed_at: stats.timestamp,
        analyzed_at: now,
    };
    record.clamp_scores();
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(name: &str) -> ChangedFile {
        ChangedFile {
            filename: name.to_string(),
            additions: 10,
            deletions: 2,
        }
    }

    #[test]
    fn blast_radius_counts_distinct_directories() {
        let files = vec![
            file("src/auth/token.rs"),
            file("src/auth/session.rs"),
            file("src/api/routes.rs"),
            file("README.md"),
        ];
        assert_eq!(blast_radius(&files), 2);
    }

    #[test]
    fn risky_patterns_are_sorted_and_deduplicated() {
        let files = vec![
            file("src/auth/login.rs"),
            file("migrations/0001_init.sql"),
            file("api/schema.proto"),
        ];
        assert_eq!(
            extract_risky_patterns(&files),
            vec!["api_contract", "auth_logic", "db_migration"]
        );
    }

    #[test]
    fn off_hours_commit_scores_higher() {
        let base = CommitStats {
            sha: "abc".into(),
            message: "tweak".into(),
            author: "a".into(),
            email: "a@example.com".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 6, 4, 14, 0, 0).unwrap(),
            additions: 10,
            deletions: 0,
            files: vec![file("src/lib.rs")],
        };
        let mut night = base.clone();
        night.timestamp = Utc.with_ymd_and_hms(2025, 6, 4, 3, 0, 0).unwrap();
        assert!(risk_score(&night, 0.0) > risk_score(&base, 0.0));
    }

    #[test]
    fn commit_type_classification() {
        assert_eq!(classify_commit_type("fix: null deref in parser"), "bugfix");
        assert_eq!(classify_commit_type("feat: staged rollout"), "feature");
        assert_eq!(classify_commit_type("chore: bump year"), "other");
    }
}
