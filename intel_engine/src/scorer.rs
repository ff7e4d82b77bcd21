//! Risk scoring — fuses rule-based factors with an optional learned model
//! into a single incident-probability estimate.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

use crate::models::commit::CommitRecord;
use crate::models::telemetry::SystemState;
use crate::models::Impact;
use crate::recall::RecallContext;
use crate::sources::RiskModel;

/// The scorer's verdict for one deployment.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Fused incident probability, in [0, 1].
    pub probability: f64,
    /// How much to trust the probability, in [0, 1].
    pub confidence: f64,
    pub expected_impact: Impact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_to_incident: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_probability: Option<f64>,
}

/// Feature vector for the learned scorer. The order is a fixed contract:
/// lines_added, lines_deleted, files_changed, complexity_score, risk_score,
/// test_ratio, hour_of_day, day_of_week.
pub fn feature_vector(commit: &CommitRecord, now: DateTime<Utc>) -> Vec<f64> {
    vec![
        commit.lines_added as f64,
        commit.lines_deleted as f64,
        commit.files_changed as f64,
        commit.complexity_score,
        commit.risk_score,
        commit.test_ratio,
        now.hour() as f64,
        now.weekday().num_days_from_monday() as f64,
    ]
}

/// Sum of bounded rule factors, capped at 1.0.
pub fn rule_probability(
    commit: &CommitRecord,
    system: &SystemState,
    recall: &RecallContext,
) -> f64 {
    let base = commit.risk_score / 10.0;
    let system_factor = 1.0 - system.health_score;
    let historical_factor = recall.similar_incidents.len() as f64 * 0.1;
    let file_risk_factor = (recall.file_incidents.len() as f64 * 0.3).min(0.6);
    let author_factor = recall.author_stats.incident_rate;
    let time_factor = if recall.temporal.is_off_hours { 0.2 } else { 0.0 };

    (base + system_factor + historical_factor + file_risk_factor + author_factor + time_factor)
        .clamp(0.0, 1.0)
}

/// Step-function confidence over total memory volume.
pub fn confidence_bucket(total_memories: i64) -> f64 {
    if total_memories < 10 {
        0.3
    } else if total_memories < 50 {
        0.6
    } else if total_memories < 200 {
        0.8
    } else {
        0.95
    }
}

/// Expected impact from blast radius.
pub fn expected_impact(blast_radius: i32) -> Impact {
    if blast_radius >= 5 {
        Impact::Critical
    } else if blast_radius >= 3 {
        Impact::High
    } else if blast_radius >= 2 {
        Impact::Medium
    } else {
        Impact::Low
    }
}

/// Most likely failure mode, in fixed precedence order; falls back to the
/// most recent similar incident's first pattern.
pub fn failure_mode(commit: &CommitRecord, recall: &RecallContext) -> Option<String> {
    let has = |tag: &str| commit.risky_patterns.iter().any(|p| p == tag);

    if has("auth_logic") {
        return Some("Authentication/Authorization failure".to_string());
    }
    if has("db_migration") {
        return Some("Database schema issues".to_string());
    }
    if has("api_contract") {
        return Some("API compatibility break".to_string());
    }
    if has("dependency_version") {
        return Some("Dependency conflict".to_string());
    }

    recall
        .similar_incidents
        .first()
        .and_then(|incident| incident.patterns.first())
        .cloned()
}

/// Mean detection time of recalled similar incidents, as a human-readable
/// estimate of when an incident would surface.
pub fn eta_to_incident(recall: &RecallContext) -> Option<String> {
    if recall.similar_incidents.is_empty() {
        return None;
    }
    let total: i64 = recall
        .similar_incidents
        .iter()
        .map(|i| i.time_to_detect_minutes.unwrap_or(0) as i64)
        .sum();
    let avg = total as f64 / recall.similar_incidents.len() as f64;

    if avg < 60.0 {
        Some(format!("{} minutes", avg as i64))
    } else {
        Some(format!("{:.1} hours", avg / 60.0))
    }
}

/// Score one deployment: rule-based probability, blended with the learned
/// model's when one is trained (70% learned, 30% rules), with confidence
/// from memory volume.
pub fn score(
    commit: &CommitRecord,
    system: &SystemState,
    recall: &RecallContext,
    model: Option<&dyn RiskModel>,
    now: DateTime<Utc>,
) -> Prediction {
    let rule_prob = rule_probability(commit, system, recall);

    let ml_probability = model.filter(|m| m.is_trained()).and_then(|m| {
        match m.predict(&feature_vector(commit, now)) {
            Ok(p) if (0.0..=1.0).contains(&p) => Some(p),
            Ok(p) => {
                tracing::warn!(probability = p, "Learned scorer returned out-of-range value");
                None
            }
            Err(e) => {
                tracing::warn!("Learned scorer prediction failed: {e}");
                None
            }
        }
    });

    let probability = match ml_probability {
        Some(ml) => {
            tracing::debug!(ml, rule = rule_prob, "Blending learned and rule probabilities");
            (ml * 0.7 + rule_prob * 0.3).clamp(0.0, 1.0)
        }
        None => rule_prob,
    };

    let mut confidence = confidence_bucket(recall.total_memories);
    if ml_probability.is_some() {
        confidence = (confidence + 0.2).min(0.99);
    }

    Prediction {
        probability,
        confidence,
        expected_impact: expected_impact(commit.blast_radius),
        eta_to_incident: eta_to_incident(recall),
        failure_mode: failure_mode(commit, recall),
        ml_probability,
    }
}
