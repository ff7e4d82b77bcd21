//! PostgreSQL memory store — diesel-async over a deadpool connection pool.
//!
//! Every operation checks its own connection out of the pool, so store
//! sessions stay request-scoped across concurrent analyses.

pub mod rows;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use intel_engine::error::{IntelError, Result};
use intel_engine::models::commit::CommitRecord;
use intel_engine::models::deployment::DeploymentRecord;
use intel_engine::models::incident::IncidentRecord;
use intel_engine::models::pattern::PatternRecord;
use intel_engine::store::{AuthorStats, MemoryStore};

use crate::schema::{intel_commits, intel_deployments, intel_incidents, intel_patterns};
use self::rows::{
    CommitRow, DeploymentRow, IncidentRow, NewCommitRow, NewDeploymentRow, NewIncidentRow,
    NewPatternRow, PatternRow,
};

const MIGRATION: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS intel_commits (
        id BIGSERIAL PRIMARY KEY,
        sha VARCHAR NOT NULL UNIQUE,
        repository VARCHAR NOT NULL,
        author VARCHAR,
        author_email VARCHAR,
        files_changed INT4 NOT NULL,
        lines_added INT4 NOT NULL,
        lines_deleted INT4 NOT NULL,
        risk_score FLOAT8 NOT NULL,
        complexity_score FLOAT8 NOT NULL,
        blast_radius INT4 NOT NULL,
        test_ratio FLOAT8 NOT NULL,
        commit_type VARCHAR NOT NULL,
        risky_patterns JSONB NOT NULL,
        files JSONB NOT NULL,
        prediction_details JSONB,
        committed_at TIMESTAMPTZ NOT NULL,
        analyzed_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_intel_commits_author_email ON intel_commits (author_email)",
    "CREATE INDEX IF NOT EXISTS idx_intel_commits_committed_at ON intel_commits (committed_at)",
    "CREATE TABLE IF NOT EXISTS intel_deployments (
        id BIGSERIAL PRIMARY KEY,
        deployment_id VARCHAR NOT NULL UNIQUE,
        commit_sha VARCHAR NOT NULL,
        repository VARCHAR NOT NULL,
        deployed_at TIMESTAMPTZ NOT NULL,
        predicted_risk FLOAT8 NOT NULL,
        predicted_impact VARCHAR NOT NULL,
        recommended_action VARCHAR NOT NULL,
        system_state JSONB NOT NULL,
        resulted_in_incident BOOL NOT NULL DEFAULT FALSE,
        incident_id VARCHAR
    )",
    "CREATE INDEX IF NOT EXISTS idx_intel_deployments_commit_sha ON intel_deployments (commit_sha)",
    "CREATE INDEX IF NOT EXISTS idx_intel_deployments_deployed_at ON intel_deployments (deployed_at)",
    "CREATE TABLE IF NOT EXISTS intel_incidents (
        id BIGSERIAL PRIMARY KEY,
        incident_id VARCHAR NOT NULL UNIQUE,
        severity VARCHAR NOT NULL,
        description TEXT NOT NULL,
        root_cause_commit VARCHAR,
        occurred_at TIMESTAMPTZ NOT NULL,
        time_to_detect_minutes INT4,
        patterns JSONB NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_intel_incidents_occurred_at ON intel_incidents (occurred_at)",
    "CREATE TABLE IF NOT EXISTS intel_patterns (
        id BIGSERIAL PRIMARY KEY,
        pattern_type VARCHAR NOT NULL UNIQUE,
        description TEXT NOT NULL,
        occurrence_count INT4 NOT NULL,
        incident_count INT4 NOT NULL,
        confidence FLOAT8 NOT NULL,
        typical_impact VARCHAR NOT NULL,
        first_seen TIMESTAMPTZ NOT NULL,
        last_seen TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_intel_patterns_confidence ON intel_patterns (confidence)",
];

fn store_err(e: diesel::result::Error) -> IntelError {
    match e {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            info,
        ) => IntelError::InvalidRecord(info.message().to_string()),
        other => IntelError::StoreFailure(other.to_string()),
    }
}

pub struct PgMemoryStore {
    pool: Pool<AsyncPgConnection>,
}

impl PgMemoryStore {
    /// Connect and verify the pool with one checkout, so a bad URL fails at
    /// startup rather than on the first analysis.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(manager).max_size(10).build()?;
        drop(pool.get().await.map_err(|e| anyhow::anyhow!("pg pool: {e}"))?);
        Ok(Self { pool })
    }

    /// Create the intelligence tables and indexes if missing.
    pub async fn run_migration(&self) -> anyhow::Result<()> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| anyhow::anyhow!("pg pool: {e}"))?;
        for statement in MIGRATION {
            diesel::sql_query(*statement).execute(&mut conn).await?;
        }
        tracing::info!("Intelligence store migration completed");
        Ok(())
    }

    async fn conn(&self) -> Result<Object<AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .map_err(|e| IntelError::StoreFailure(format!("pg pool: {e}")))
    }
}

#[async_trait]
impl MemoryStore for PgMemoryStore {
    async fn upsert_commit(&self, commit: &CommitRecord) -> Result<()> {
        let mut conn = self.conn().await?;
        let row = NewCommitRow::from(commit);
        diesel::insert_into(intel_commits::table)
            .values(&row)
            .on_conflict(intel_commits::sha)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn get_commit(&self, sha: &str) -> Result<Option<CommitRecord>> {
        let mut conn = self.conn().await?;
        let row: Option<CommitRow> = intel_commits::table
            .filter(intel_commits::sha.eq(sha))
            .first(&mut conn)
            .await
            .optional()
            .map_err(store_err)?;
        Ok(row.map(CommitRow::into_record))
    }

    async fn count_commits(&self) -> Result<i64> {
        let mut conn = self.conn().await?;
        intel_commits::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(store_err)
    }

    async fn commits_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>> {
        let mut conn = self.conn().await?;
        let rows: Vec<CommitRow> = intel_commits::table
            .filter(intel_commits::committed_at.ge(from))
            .filter(intel_commits::committed_at.le(to))
            .order(intel_commits::committed_at.desc())
            .load(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(CommitRow::into_record).collect())
    }

    async fn author_stats(&self, author: &str) -> Result<AuthorStats> {
        let mut conn = self.conn().await?;

        let (total_commits, avg_risk): (i64, Option<f64>) = intel_commits::table
            .filter(
                intel_commits::author_email
                    .eq(author)
                    .or(intel_commits::author.eq(author)),
            )
            .select((
                diesel::dsl::count_star(),
                diesel::dsl::avg(intel_commits::risk_score),
            ))
            .first(&mut conn)
            .await
            .map_err(store_err)?;

        if total_commits == 0 {
            return Ok(AuthorStats::default());
        }

        let shas: Vec<String> = intel_commits::table
            .filter(
                intel_commits::author_email
                    .eq(author)
                    .or(intel_commits::author.eq(author)),
            )
            .select(intel_commits::sha)
            .load(&mut conn)
            .await
            .map_err(store_err)?;

        let incident_count: i64 = intel_incidents::table
            .filter(
                intel_incidents::root_cause_commit
                    .assume_not_null()
                    .eq_any(&shas),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(store_err)?;

        Ok(AuthorStats {
            total_commits,
            incident_count,
            incident_rate: incident_count as f64 / total_commits as f64,
            avg_risk_score: avg_risk.unwrap_or(0.0),
        })
    }

    async fn insert_deployment(&self, deployment: &DeploymentRecord) -> Result<()> {
        let mut conn = self.conn().await?;
        diesel::insert_into(intel_deployments::table)
            .values(&NewDeploymentRow::from(deployment))
            .execute(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn get_deployment(&self, deployment_id: &str) -> Result<Option<DeploymentRecord>> {
        let mut conn = self.conn().await?;
        let row: Option<DeploymentRow> = intel_deployments::table
            .filter(intel_deployments::deployment_id.eq(deployment_id))
            .first(&mut conn)
            .await
            .optional()
            .map_err(store_err)?;
        row.map(DeploymentRow::into_record).transpose()
    }

    async fn latest_deployment_for_commit(
        &self,
        sha: &str,
    ) -> Result<Option<DeploymentRecord>> {
        let mut conn = self.conn().await?;
        let row: Option<DeploymentRow> = intel_deployments::table
            .filter(intel_deployments::commit_sha.eq(sha))
            .order(intel_deployments::deployed_at.desc())
            .first(&mut conn)
            .await
            .optional()
            .map_err(store_err)?;
        row.map(DeploymentRow::into_record).transpose()
    }

    async fn deployments_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<DeploymentRecord>> {
        let mut conn = self.conn().await?;
        let rows: Vec<DeploymentRow> = intel_deployments::table
            .filter(intel_deployments::deployed_at.ge(cutoff))
            .order(intel_deployments::deployed_at.desc())
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(store_err)?;
        rows.into_iter().map(DeploymentRow::into_record).collect()
    }

    async fn mark_deployment_incident(
        &self,
        deployment_id: &str,
        incident_id: &str,
    ) -> Result<()> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(
            intel_deployments::table
                .filter(intel_deployments::deployment_id.eq(deployment_id)),
        )
        .set((
            intel_deployments::resulted_in_incident.eq(true),
            intel_deployments::incident_id.eq(incident_id),
        ))
        .execute(&mut conn)
        .await
        .map_err(store_err)?;

        if updated == 0 {
            return Err(IntelError::DeploymentNotFound(deployment_id.to_string()));
        }
        Ok(())
    }

    async fn count_deployments_since(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let mut conn = self.conn().await?;
        intel_deployments::table
            .filter(intel_deployments::deployed_at.ge(cutoff))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(store_err)
    }

    async fn insert_incident(&self, incident: &IncidentRecord) -> Result<()> {
        let mut conn = self.conn().await?;
        diesel::insert_into(intel_incidents::table)
            .values(&NewIncidentRow::from(incident))
            .execute(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn incidents_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<IncidentRecord>> {
        let mut conn = self.conn().await?;
        let rows: Vec<IncidentRow> = intel_incidents::table
            .filter(intel_incidents::occurred_at.ge(cutoff))
            .order(intel_incidents::occurred_at.desc())
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(store_err)?;
        rows.into_iter().map(IncidentRow::into_record).collect()
    }

    async fn recent_incidents_with_commits(
        &self,
        limit: i64,
    ) -> Result<Vec<(IncidentRecord, CommitRecord)>> {
        let mut conn = self.conn().await?;
        let incidents: Vec<IncidentRow> = intel_incidents::table
            .filter(intel_incidents::root_cause_commit.is_not_null())
            .order(intel_incidents::occurred_at.desc())
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(store_err)?;

        let shas: Vec<String> = incidents
            .iter()
            .filter_map(|i| i.root_cause_commit.clone())
            .collect();
        let commits: Vec<CommitRow> = intel_commits::table
            .filter(intel_commits::sha.eq_any(&shas))
            .load(&mut conn)
            .await
            .map_err(store_err)?;
        let by_sha: HashMap<String, CommitRecord> = commits
            .into_iter()
            .map(|row| (row.sha.clone(), row.into_record()))
            .collect();

        let mut joined = Vec::new();
        for incident_row in incidents {
            let Some(sha) = incident_row.root_cause_commit.clone() else {
                continue;
            };
            let Some(commit) = by_sha.get(&sha) else {
                continue;
            };
            joined.push((incident_row.into_record()?, commit.clone()));
        }
        Ok(joined)
    }

    async fn count_incidents_since(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let mut conn = self.conn().await?;
        intel_incidents::table
            .filter(intel_incidents::occurred_at.ge(cutoff))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(store_err)
    }

    async fn get_pattern(&self, pattern_type: &str) -> Result<Option<PatternRecord>> {
        let mut conn = self.conn().await?;
        let row: Option<PatternRow> = intel_patterns::table
            .filter(intel_patterns::pattern_type.eq(pattern_type))
            .first(&mut conn)
            .await
            .optional()
            .map_err(store_err)?;
        row.map(PatternRow::into_record).transpose()
    }

    async fn upsert_pattern(&self, pattern: &PatternRecord) -> Result<()> {
        let mut conn = self.conn().await?;
        let row = NewPatternRow::from(pattern);
        diesel::insert_into(intel_patterns::table)
            .values(&row)
            .on_conflict(intel_patterns::pattern_type)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn patterns_above_confidence(
        &self,
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<PatternRecord>> {
        let mut conn = self.conn().await?;
        let rows: Vec<PatternRow> = intel_patterns::table
            .filter(intel_patterns::confidence.ge(threshold))
            .order((
                intel_patterns::occurrence_count.desc(),
                intel_patterns::pattern_type.asc(),
            ))
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(store_err)?;
        rows.into_iter().map(PatternRow::into_record).collect()
    }
}
