//! Intelligence platform configuration — loaded from environment variables
//! once in `main` and passed into each component explicitly.

use intel_engine::config::EngineConfig;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// GitHub personal access token for the commit enrichment API.
    pub github_token: String,
    /// GitHub repository being watched, "owner/repo".
    pub github_repo: String,
    /// GitHub webhook secret for HMAC validation.
    pub webhook_secret: String,
    /// Local checkout used by the git fallback source.
    pub local_repo_path: String,
    /// Grafana Loki base URL; empty disables the Loki backend.
    pub loki_url: String,
    /// Directory scanned by the file-based log fallback.
    pub log_path: String,
    /// Prometheus base URL; empty disables the metric backend.
    pub prometheus_url: String,
    /// LLM enrichment mode: disabled | metadata_only | full.
    pub llm_mode: String,
    /// LLM provider: openai | anthropic.
    pub llm_provider: String,
    pub llm_api_key: String,
    pub llm_model: String,
    /// Seconds between commit-polling ticks.
    pub commit_poll_secs: u64,
    /// Seconds between log-monitoring ticks.
    pub log_poll_secs: u64,
    /// Window in seconds during which a commit is not re-analyzed.
    pub throttle_window_secs: u64,
    pub engine: EngineConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let github_token = std::env::var("INTEL_GITHUB_TOKEN").unwrap_or_default();
        let github_repo = std::env::var("INTEL_GITHUB_REPO").unwrap_or_default();
        let webhook_secret = std::env::var("INTEL_WEBHOOK_SECRET").unwrap_or_default();
        let local_repo_path =
            std::env::var("INTEL_LOCAL_REPO").unwrap_or_else(|_| ".".to_string());
        let loki_url = std::env::var("INTEL_LOKI_URL").unwrap_or_default();
        let log_path = std::env::var("INTEL_LOG_PATH").unwrap_or_default();
        let prometheus_url = std::env::var("INTEL_PROMETHEUS_URL").unwrap_or_default();
        let llm_mode =
            std::env::var("INTEL_LLM_MODE").unwrap_or_else(|_| "disabled".to_string());
        let llm_provider =
            std::env::var("INTEL_LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let llm_api_key = std::env::var("INTEL_LLM_API_KEY").unwrap_or_default();
        let llm_model = std::env::var("INTEL_LLM_MODEL").unwrap_or_default();
        let commit_poll_secs = std::env::var("INTEL_COMMIT_POLL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);
        let log_poll_secs = std::env::var("INTEL_LOG_POLL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120);
        let throttle_window_secs = std::env::var("INTEL_THROTTLE_WINDOW")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        let mut engine = EngineConfig::default();
        engine.enable_llm_enrichment = llm_mode != "disabled" && !llm_api_key.is_empty();
        if let Some(threshold) = std::env::var("INTEL_PATTERN_CONFIDENCE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            engine.pattern_confidence_threshold = threshold;
        }
        if let Some(rate) = std::env::var("INTEL_ELEVATED_ERROR_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            engine.elevated_error_rate = rate;
        }

        if github_token.is_empty() {
            tracing::warn!("INTEL_GITHUB_TOKEN not set -- falling back to local git inspection");
        }
        if webhook_secret.is_empty() {
            tracing::warn!("INTEL_WEBHOOK_SECRET not set -- webhook signature validation disabled");
        }

        Self {
            github_token,
            github_repo,
            webhook_secret,
            local_repo_path,
            loki_url,
            log_path,
            prometheus_url,
            llm_mode,
            llm_provider,
            llm_api_key,
            llm_model,
            commit_poll_secs,
            log_poll_secs,
            throttle_window_secs,
            engine,
        }
    }
}
