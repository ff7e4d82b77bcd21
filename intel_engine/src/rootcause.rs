//! Root-cause attribution — which recent commit most likely caused an
//! incident.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::commit::CommitRecord;
use crate::models::incident::IncidentRecord;
use crate::models::Severity;

/// The commit judged most likely to have caused the incident.
#[derive(Debug, Clone, Serialize)]
pub struct RootCauseCandidate {
    pub sha: String,
    pub author: Option<String>,
    pub risk_score: f64,
    pub matched_patterns: Vec<String>,
    pub confidence: f64,
    pub committed_at: DateTime<Utc>,
}

/// A historical incident whose patterns overlap the current log evidence.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarIncident {
    pub incident_id: String,
    pub severity: Severity,
    pub root_cause_commit: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub pattern_overlap: usize,
    pub patterns: Vec<String>,
}

/// Rank historical incidents by pattern overlap with the log evidence,
/// keeping the top five. Equal overlaps preserve recency order.
pub fn rank_similar(incidents: &[IncidentRecord], log_patterns: &[String]) -> Vec<SimilarIncident> {
    if log_patterns.is_empty() {
        return Vec::new();
    }

    let mut similar: Vec<SimilarIncident> = incidents
        .iter()
        .filter_map(|incident| {
            let overlap = incident
                .patterns
                .iter()
                .filter(|p| log_patterns.contains(p))
                .count();
            if overlap == 0 {
                return None;
            }
            Some(SimilarIncident {
                incident_id: incident.incident_id.clone(),
                severity: incident.severity,
                root_cause_commit: incident.root_cause_commit.clone(),
                occurred_at: incident.occurred_at,
                pattern_overlap: overlap,
                patterns: incident.patterns.clone(),
            })
        })
        .collect();

    similar.sort_by(|a, b| b.pattern_overlap.cmp(&a.pattern_overlap));
    similar.truncate(5);
    similar
}

/// Score each candidate commit and return the best one.
///
/// Score = 0.4 × pattern overlap with log evidence
///       + 0.3 × (risk_score / 10)
///       + 0.3 if a similar incident already blamed this commit.
///
/// Candidates arrive most-recent-first; ties keep the earlier (more recent)
/// candidate, so the comparison is strictly greater-than by contract.
pub fn attribute(
    commits: &[CommitRecord],
    log_patterns: &[String],
    similar: &[SimilarIncident],
) -> Option<RootCauseCandidate> {
    let mut best: Option<(f64, &CommitRecord, Vec<String>)> = None;

    for commit in commits {
        let matched: Vec<String> = commit
            .risky_patterns
            .iter()
            .filter(|p| log_patterns.contains(p))
            .cloned()
            .collect();

        let mut score = matched.len() as f64 * 0.4;
        score += commit.risk_score / 10.0 * 0.3;
        if similar
            .iter()
            .any(|s| s.root_cause_commit.as_deref() == Some(commit.sha.as_str()))
        {
            score += 0.3;
        }

        let better = match &best {
            Some((best_score, _, _)) => score > *best_score,
            None => true,
        };
        if better {
            best = Some((score, commit, matched));
        }
    }

    best.map(|(score, commit, matched)| RootCauseCandidate {
        sha: commit.sha.clone(),
        author: commit.author.clone(),
        risk_score: commit.risk_score,
        matched_patterns: matched,
        confidence: score.min(0.95),
        committed_at: commit.committed_at,
    })
}
