//! Engine error taxonomy.
//!
//! Most of these never reach the caller as fatal: the engine degrades to a
//! neutral default and records that a degraded path was used instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntelError {
    /// Commit enrichment source and its fallback both failed.
    #[error("commit source unavailable: {0}")]
    SourceUnavailable(String),

    /// Log/metric backend unreachable.
    #[error("telemetry backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The learned scorer exists but has not been trained.
    #[error("learned scorer is not trained")]
    ScorerUntrained,

    /// Best-effort LLM enrichment failed; never blocks the primary score.
    #[error("enrichment failed: {0}")]
    EnrichmentFailure(String),

    /// A memory-store operation failed.
    #[error("store operation failed: {0}")]
    StoreFailure(String),

    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),

    /// A record violates a uniqueness or range invariant.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, IntelError>;
