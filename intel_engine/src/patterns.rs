//! Pattern learning — reinforce the confidence-weighted pattern catalog on
//! every recorded incident. There is no decay: the memory never forgets.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::incident::IncidentRecord;
use crate::models::pattern::PatternRecord;
use crate::store::MemoryStore;

/// Update the pattern catalog with every tag present on the incident.
/// Existing patterns are reinforced (+0.05 confidence, capped at 0.99);
/// unseen ones are created at confidence 0.6 with the incident's severity
/// as typical impact.
pub async fn learn_from_incident(
    store: &dyn MemoryStore,
    incident: &IncidentRecord,
    now: DateTime<Utc>,
) -> Result<()> {
    for tag in &incident.patterns {
        let pattern = match store.get_pattern(tag).await? {
            Some(mut pattern) => {
                pattern.reinforce(now);
                pattern
            }
            None => PatternRecord::first_occurrence(tag, incident.severity, now),
        };
        store.upsert_pattern(&pattern).await?;
        crate::metrics::pattern_reinforced(tag);
    }

    if !incident.patterns.is_empty() {
        tracing::info!(
            incident_id = %incident.incident_id,
            patterns = incident.patterns.len(),
            "Updated pattern confidence from incident"
        );
    }
    Ok(())
}
