//! GitHub webhook handler — push events feed the analysis pipeline.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use intel_engine::engine::IntelligenceEngine;

use crate::config::ServerConfig;

type HmacSha256 = Hmac<Sha256>;

/// Validate a GitHub webhook signature (X-Hub-Signature-256).
pub fn validate_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        tracing::warn!("Webhook secret not configured, skipping validation");
        return true;
    }

    let sig = signature.strip_prefix("sha256=").unwrap_or(signature);
    let sig_bytes = match hex::decode(sig) {
        Ok(b) => b,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(payload);

    mac.verify_slice(&sig_bytes).is_ok()
}

/// Handle an incoming GitHub webhook payload.
pub async fn handle_webhook(
    config: &ServerConfig,
    engine: &Arc<IntelligenceEngine>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !validate_signature(&config.webhook_secret, &body, signature) {
        tracing::warn!("Webhook signature validation failed");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let event_type = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?;

    match event_type {
        "push" => handle_push(config, engine, &payload).await,
        "ping" => {
            tracing::info!("Received GitHub ping webhook");
            Ok(StatusCode::OK)
        }
        _ => {
            tracing::debug!("Ignoring webhook event: {}", event_type);
            Ok(StatusCode::OK)
        }
    }
}

async fn handle_push(
    config: &ServerConfig,
    engine: &Arc<IntelligenceEngine>,
    payload: &serde_json::Value,
) -> Result<StatusCode, StatusCode> {
    let repo_full_name = payload["repository"]["full_name"]
        .as_str()
        .unwrap_or_default();
    let commit_sha = payload["after"].as_str().unwrap_or_default();

    if commit_sha.is_empty() {
        return Ok(StatusCode::OK);
    }
    if !config.github_repo.is_empty() && repo_full_name != config.github_repo {
        tracing::debug!("Ignoring push for unwatched repo: {}", repo_full_name);
        return Ok(StatusCode::OK);
    }

    // Throttle: a sha analyzed within the window is not re-analyzed.
    if let Ok(Some(existing)) = engine.store().get_commit(commit_sha).await {
        let age = Utc::now() - existing.analyzed_at;
        if age.num_seconds() < config.throttle_window_secs as i64 {
            tracing::info!(
                sha = &commit_sha[..8.min(commit_sha.len())],
                "Duplicate analysis throttled"
            );
            return Ok(StatusCode::OK);
        }
    }

    let engine = engine.clone();
    let repository = repo_full_name.to_string();
    let sha = commit_sha.to_string();
    let deployment_id = format!("push-{}", &sha[..8.min(sha.len())]);
    tokio::spawn(async move {
        if let Err(e) = engine
            .analyze_deployment(&sha, &repository, Some(&deployment_id))
            .await
        {
            tracing::error!(sha = %sha, "Webhook-triggered analysis failed: {e}");
        }
    });

    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_passes() {
        let payload = br#"{"after":"abc"}"#;
        let signature = sign("s3cret", payload);
        assert!(validate_signature("s3cret", payload, &signature));
    }

    #[test]
    fn wrong_secret_fails() {
        let payload = br#"{"after":"abc"}"#;
        let signature = sign("s3cret", payload);
        assert!(!validate_signature("other", payload, &signature));
        assert!(!validate_signature("s3cret", payload, "sha256=zz"));
    }

    #[test]
    fn missing_secret_skips_validation() {
        assert!(validate_signature("", b"anything", ""));
    }
}
