//! Grafana Loki log backend.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use intel_engine::error::{IntelError, Result};
use intel_engine::models::telemetry::LogEntry;
use intel_engine::sources::LogSource;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub struct LokiLogSource {
    url: String,
    client: reqwest::Client,
}

impl LokiLogSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

fn level_of(line: &str) -> &'static str {
    let lower = line.to_lowercase();
    if lower.contains("error") || lower.contains("fatal") {
        "error"
    } else if lower.contains("warn") {
        "warning"
    } else {
        "info"
    }
}

#[async_trait]
impl LogSource for LokiLogSource {
    fn name(&self) -> &'static str {
        "loki"
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/ready", self.url))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn fetch_recent_logs(&self, since_minutes: u32) -> Result<Vec<LogEntry>> {
        let end = Utc::now();
        let start = end - Duration::minutes(since_minutes as i64);

        let resp = self
            .client
            .get(format!("{}/loki/api/v1/query_range", self.url))
            .query(&[
                ("query", r#"{job=~".+"}"#.to_string()),
                ("start", (start.timestamp_nanos_opt().unwrap_or(0)).to_string()),
                ("end", (end.timestamp_nanos_opt().unwrap_or(0)).to_string()),
                ("limit", "1000".to_string()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| IntelError::BackendUnavailable(format!("loki: {e}")))?;

        if !resp.status().is_success() {
            return Err(IntelError::BackendUnavailable(format!(
                "loki: {}",
                resp.status()
            )));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IntelError::BackendUnavailable(format!("loki: {e}")))?;

        let mut logs = Vec::new();
        for stream in data["data"]["result"].as_array().unwrap_or(&Vec::new()) {
            let labels = &stream["stream"];
            let service = labels["service"]
                .as_str()
                .or_else(|| labels["job"].as_str())
                .unwrap_or("unknown")
                .to_string();

            for value in stream["values"].as_array().unwrap_or(&Vec::new()) {
                let Some(ts_ns) = value[0].as_str().and_then(|t| t.parse::<i64>().ok()) else {
                    continue;
                };
                let Some(line) = value[1].as_str() else {
                    continue;
                };
                logs.push(LogEntry {
                    timestamp: DateTime::from_timestamp_nanos(ts_ns),
                    level: level_of(line).to_string(),
                    message: line.to_string(),
                    service: service.clone(),
                });
            }
        }

        tracing::debug!(count = logs.len(), "Fetched logs from Loki");
        Ok(logs)
    }
}
