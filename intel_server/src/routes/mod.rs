//! Intelligence platform HTTP routes — webhook + JSON API.

pub mod api;
pub mod webhook;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;

use intel_engine::engine::IntelligenceEngine;
use intel_engine::error::IntelError;
use intel_engine::models::deployment::DeploymentRecord;
use intel_engine::models::Severity;
use intel_engine::report::{AnalysisReport, HealthReport, RootCauseReport};

use crate::config::ServerConfig;

/// Shared state for the intelligence route handlers.
#[derive(Clone)]
pub struct IntelRouterState {
    pub engine: Arc<IntelligenceEngine>,
    pub config: Arc<ServerConfig>,
}

/// Build the platform's Axum router (nested at `/intel`).
pub fn intel_router(state: IntelRouterState) -> Router {
    Router::new()
        // Webhook
        .route("/webhook/github", post(webhook_handler))
        // Decision API
        .route("/api/analyze", post(analyze_handler))
        .route("/api/incidents", post(record_incident_handler))
        .route("/api/monitor", post(monitor_handler))
        .route("/api/rootcause", post(rootcause_handler))
        // Read API
        .route("/api/deployments", get(list_deployments_handler))
        .route("/api/kpi/summary", get(kpi_summary_handler))
        .with_state(state)
}

fn error_status(e: &IntelError) -> StatusCode {
    match e {
        IntelError::DeploymentNotFound(_) => StatusCode::NOT_FOUND,
        IntelError::InvalidRecord(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ── Webhook ──

async fn webhook_handler(
    State(state): State<IntelRouterState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    metrics::counter!(
        "intel_webhooks_received_total",
        "event" => headers
            .get("x-github-event")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string()
    )
    .increment(1);

    webhook::handle_webhook(&state.config, &state.engine, &headers, body).await
}

// ── Decision API ──

async fn analyze_handler(
    State(state): State<IntelRouterState>,
    Json(req): Json<api::AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, StatusCode> {
    let repository = req
        .repository
        .as_deref()
        .unwrap_or(state.config.github_repo.as_str());

    state
        .engine
        .analyze_deployment(&req.commit_sha, repository, req.deployment_id.as_deref())
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Analyze error: {e}");
            error_status(&e)
        })
}

async fn record_incident_handler(
    State(state): State<IntelRouterState>,
    Json(req): Json<api::IncidentRequest>,
) -> Result<(StatusCode, Json<api::IncidentResponse>), StatusCode> {
    let severity = Severity::parse(&req.severity).ok_or(StatusCode::BAD_REQUEST)?;
    let incident_id = req
        .incident_id
        .unwrap_or_else(|| format!("inc-{}", uuid::Uuid::new_v4()));

    state
        .engine
        .record_incident(
            &incident_id,
            severity,
            &req.description,
            req.root_cause_commit.as_deref(),
            req.patterns,
        )
        .await
        .map_err(|e| {
            tracing::error!("Record incident error: {e}");
            error_status(&e)
        })?;

    Ok((
        StatusCode::CREATED,
        Json(api::IncidentResponse { incident_id }),
    ))
}

async fn monitor_handler(
    State(state): State<IntelRouterState>,
    Json(req): Json<api::MonitorRequest>,
) -> Result<Json<HealthReport>, StatusCode> {
    state
        .engine
        .monitor_deployment_health(&req.deployment_id, &req.logs, req.duration_minutes)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Monitor error: {e}");
            error_status(&e)
        })
}

async fn rootcause_handler(
    State(state): State<IntelRouterState>,
    Json(req): Json<api::RootCauseRequest>,
) -> Result<Json<RootCauseReport>, StatusCode> {
    let timestamp = req.timestamp.unwrap_or_else(Utc::now);

    state
        .engine
        .detect_incident_cause(timestamp, req.error_logs.as_deref())
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Root-cause error: {e}");
            error_status(&e)
        })
}

// ── Read API ──

#[derive(serde::Deserialize)]
pub struct ListDeploymentsQuery {
    pub days: Option<i64>,
    pub limit: Option<i64>,
}

async fn list_deployments_handler(
    State(state): State<IntelRouterState>,
    Query(query): Query<ListDeploymentsQuery>,
) -> Result<Json<Vec<DeploymentRecord>>, StatusCode> {
    api::list_deployments(
        &state.engine,
        query.days.unwrap_or(7),
        query.limit.unwrap_or(20),
    )
    .await
    .map(Json)
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

#[derive(serde::Deserialize)]
pub struct KpiQuery {
    pub days: Option<i64>,
}

async fn kpi_summary_handler(
    State(state): State<IntelRouterState>,
    Query(query): Query<KpiQuery>,
) -> Result<Json<api::KpiSummary>, StatusCode> {
    api::kpi_summary(&state.engine, query.days.unwrap_or(30))
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
