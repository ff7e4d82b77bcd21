//! Log digestion — error rates, anomalies, and the lexical signature scan
//! shared by the health monitor and the root-cause attributor.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::telemetry::{Anomaly, LogEntry};

/// Summary of one batch of log lines.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogDigest {
    pub log_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub error_rate: f64,
    pub anomalies: Vec<Anomaly>,
    pub spike_score: f64,
}

/// Digest a batch of logs: counts, error rate, and simple anomalies
/// (overall error-rate spike, identical errors repeated 3+ times).
pub fn digest(logs: &[LogEntry]) -> LogDigest {
    if logs.is_empty() {
        return LogDigest::default();
    }

    let log_count = logs.len();
    let error_count = logs.iter().filter(|l| l.is_error()).count();
    let warning_count = logs.iter().filter(|l| l.is_warning()).count();
    let error_rate = error_count as f64 / log_count as f64;

    let mut anomalies = Vec::new();

    if error_rate > 0.3 {
        anomalies.push(Anomaly {
            kind: "high_error_rate".to_string(),
            severity: if error_rate > 0.7 { "critical" } else { "high" }.to_string(),
            message: format!("Error rate is {:.1}% (threshold: 30%)", error_rate * 100.0),
        });
    }

    let mut message_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for log in logs.iter().filter(|l| l.is_error()) {
        *message_counts.entry(log.message.as_str()).or_default() += 1;
    }
    for (message, count) in message_counts {
        if count >= 3 {
            let truncated: String = message.chars().take(100).collect();
            anomalies.push(Anomaly {
                kind: "repeated_error".to_string(),
                severity: "high".to_string(),
                message: format!("Error repeated {count} times: {truncated}"),
            });
        }
    }

    let spike_score = if anomalies.is_empty() {
        0.0
    } else {
        (0.3 + anomalies.len() as f64 * 0.2).min(0.9)
    };

    LogDigest {
        log_count,
        error_count,
        warning_count,
        error_rate,
        anomalies,
        spike_score,
    }
}

/// Scan error-level log lines for fixed lexical signatures and return the
/// deduplicated set of pattern tags. First matching signature wins per line.
pub fn scan_signatures(logs: &[LogEntry]) -> Vec<String> {
    let mut tags = BTreeSet::new();

    for log in logs.iter().filter(|l| l.is_error()) {
        let message = log.message.to_lowercase();

        if message.contains("auth") && message.contains("failed") {
            tags.insert("auth_failure");
        } else if message.contains("database")
            && (message.contains("timeout") || message.contains("connection"))
        {
            tags.insert("database_connection");
        } else if message.contains("null") || message.contains("undefined") {
            tags.insert("null_reference");
        } else if message.contains("memory") || message.contains("heap") {
            tags.insert("memory_leak");
        } else if message.contains("429") || message.contains("rate limit") {
            tags.insert("rate_limit");
        } else if message.contains("500") || message.contains("internal server") {
            tags.insert("server_error");
        }
    }

    tags.into_iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(level: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level: level.to_string(),
            message: message.to_string(),
            service: "api".to_string(),
        }
    }

    #[test]
    fn signature_scan_dedupes_and_skips_non_errors() {
        let logs = vec![
            entry("error", "Auth check failed for user 42"),
            entry("error", "auth token failed validation"),
            entry("info", "database connection established"),
            entry("critical", "database connection timeout"),
        ];
        let tags = scan_signatures(&logs);
        assert_eq!(tags, vec!["auth_failure", "database_connection"]);
    }

    #[test]
    fn digest_flags_repeated_errors() {
        let logs = vec![
            entry("error", "boom"),
            entry("error", "boom"),
            entry("error", "boom"),
            entry("info", "ok"),
        ];
        let digest = digest(&logs);
        assert_eq!(digest.error_count, 3);
        assert!(digest
            .anomalies
            .iter()
            .any(|a| a.kind == "repeated_error"));
        assert!(digest.anomalies.iter().any(|a| a.kind == "high_error_rate"));
    }
}
