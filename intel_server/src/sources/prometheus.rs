//! Prometheus metric backend — a fixed set of PromQL queries mapped onto
//! the engine's metric snapshot.

use async_trait::async_trait;

use intel_engine::error::{IntelError, Result};
use intel_engine::models::telemetry::MetricsSnapshot;
use intel_engine::sources::MetricSource;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

const QUERIES: &[(&str, &str)] = &[
    ("cpu_usage", "avg(rate(process_cpu_seconds_total[5m]))"),
    (
        "memory_usage",
        "avg(process_resident_memory_bytes) / avg(node_memory_MemTotal_bytes)",
    ),
    (
        "error_rate",
        r#"sum(rate(http_requests_total{status=~"5.."}[5m])) / sum(rate(http_requests_total[5m]))"#,
    ),
    ("request_rate", "sum(rate(http_requests_total[5m]))"),
];

pub struct PrometheusMetricSource {
    url: String,
    client: reqwest::Client,
}

impl PrometheusMetricSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn query_value(&self, query: &str) -> Result<Option<f64>> {
        let resp = self
            .client
            .get(format!("{}/api/v1/query", self.url))
            .query(&[("query", query)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| IntelError::BackendUnavailable(format!("prometheus: {e}")))?;

        if !resp.status().is_success() {
            return Ok(None);
        }
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IntelError::BackendUnavailable(format!("prometheus: {e}")))?;

        Ok(data["data"]["result"]
            .as_array()
            .and_then(|r| r.first())
            .and_then(|first| first["value"].as_array())
            .and_then(|v| v.get(1))
            .and_then(|v| v.as_str())
            .and_then(|v| v.parse().ok()))
    }
}

#[async_trait]
impl MetricSource for PrometheusMetricSource {
    fn name(&self) -> &'static str {
        "prometheus"
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/-/healthy", self.url))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn fetch_metrics(&self) -> Result<MetricsSnapshot> {
        let mut snapshot = MetricsSnapshot::default();

        for (field, query) in QUERIES {
            match self.query_value(query).await {
                Ok(Some(value)) => match *field {
                    "cpu_usage" => snapshot.cpu_usage = value,
                    "memory_usage" => snapshot.memory_usage = value,
                    "error_rate" => snapshot.error_rate = value,
                    "request_rate" => snapshot.request_rate = value,
                    _ => {}
                },
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(field, "Prometheus query failed: {e}");
                }
            }
        }

        Ok(snapshot)
    }
}
