//! Memory recall — what the engine remembers that is relevant to the commit
//! under analysis.
//!
//! The four store recalls are read-only and touch disjoint query shapes, so
//! they fan out concurrently; scoring waits for all of them.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::models::incident::IncidentRecord;
use crate::models::pattern::PatternRecord;
use crate::models::Severity;
use crate::store::{AuthorStats, MemoryStore};

/// A past incident whose root-cause commit touched files also touched now.
#[derive(Debug, Clone, Serialize)]
pub struct FileIncident {
    pub incident_id: String,
    pub severity: Severity,
    pub involved_files: Vec<String>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// Time-of-day context for the analysis timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct TemporalContext {
    pub day_of_week: String,
    pub hour_of_day: u32,
    pub is_weekend: bool,
    pub is_off_hours: bool,
}

impl TemporalContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        let hour = now.hour();
        Self {
            day_of_week: now.weekday().to_string(),
            hour_of_day: hour,
            is_weekend: now.weekday().num_days_from_monday() >= 5,
            is_off_hours: hour < 6 || hour > 22,
        }
    }
}

/// Everything memory has to say about the current situation.
#[derive(Debug, Clone, Serialize)]
pub struct RecallContext {
    pub similar_incidents: Vec<IncidentRecord>,
    pub file_incidents: Vec<FileIncident>,
    pub pattern_matches: Vec<PatternRecord>,
    pub author_stats: AuthorStats,
    pub temporal: TemporalContext,
    pub total_memories: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<&'static str>,
}

impl RecallContext {
    /// Empty memory, for tests and for fully degraded recalls.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            similar_incidents: Vec::new(),
            file_incidents: Vec::new(),
            pattern_matches: Vec::new(),
            author_stats: AuthorStats::default(),
            temporal: TemporalContext::at(now),
            total_memories: 0,
            degraded: Vec::new(),
        }
    }
}

/// How many joined incident/commit rows the file-overlap scan considers.
const FILE_INCIDENT_SCAN: i64 = 50;
const SIMILAR_INCIDENT_LIMIT: i64 = 10;
const PATTERN_MATCH_LIMIT: i64 = 5;

/// Query memory for similar past situations. Individual recall failures
/// degrade to empty results and are marked, never raised.
pub async fn recall(
    store: &dyn MemoryStore,
    files: &[String],
    author: Option<&str>,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> RecallContext {
    let similar_cutoff = now - Duration::days(config.similar_incident_days);

    let (joined, similar, patterns, author_stats, total) = tokio::join!(
        store.recent_incidents_with_commits(FILE_INCIDENT_SCAN),
        store.incidents_since(similar_cutoff, SIMILAR_INCIDENT_LIMIT),
        store.patterns_above_confidence(config.pattern_confidence_threshold, PATTERN_MATCH_LIMIT),
        async {
            match author {
                Some(author) => store.author_stats(author).await,
                None => Ok(AuthorStats::default()),
            }
        },
        store.count_commits(),
    );

    let mut degraded = Vec::new();
    let mut mark = |which: &'static str| {
        tracing::warn!(recall = which, "Memory recall degraded to empty result");
        crate::metrics::degraded_path(which);
        degraded.push(which);
    };

    let file_incidents = match joined {
        Ok(joined) => file_overlap_incidents(&joined, files),
        Err(_) => {
            mark("recall_file_incidents");
            Vec::new()
        }
    };
    let similar_incidents = similar.unwrap_or_else(|_| {
        mark("recall_similar_incidents");
        Vec::new()
    });
    let pattern_matches = patterns.unwrap_or_else(|_| {
        mark("recall_patterns");
        Vec::new()
    });
    let author_stats = author_stats.unwrap_or_else(|_| {
        mark("recall_author_stats");
        AuthorStats::default()
    });
    let total_memories = total.unwrap_or_else(|_| {
        mark("recall_memory_count");
        0
    });

    RecallContext {
        similar_incidents,
        file_incidents,
        pattern_matches,
        author_stats,
        temporal: TemporalContext::at(now),
        total_memories,
        degraded,
    }
}

/// Intersect each root-cause commit's file list with the current one; any
/// non-empty intersection is a file incident.
fn file_overlap_incidents(
    joined: &[(IncidentRecord, crate::models::commit::CommitRecord)],
    files: &[String],
) -> Vec<FileIncident> {
    if files.is_empty() {
        return Vec::new();
    }
    let current: BTreeSet<&str> = files.iter().map(|f| f.as_str()).collect();

    joined
        .iter()
        .filter_map(|(incident, commit)| {
            let common: Vec<String> = commit
                .files
                .iter()
                .filter(|f| current.contains(f.as_str()))
                .cloned()
                .collect();
            if common.is_empty() {
                return None;
            }
            Some(FileIncident {
                incident_id: incident.incident_id.clone(),
                severity: incident.severity,
                involved_files: common,
                description: incident.description.clone(),
                occurred_at: incident.occurred_at,
            })
        })
        .collect()
}
