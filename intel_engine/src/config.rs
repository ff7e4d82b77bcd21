//! Engine configuration — an explicit object passed into the engine
//! constructor. No component reads ambient global state.

/// Health-state thresholds for the deployment monitor.
#[derive(Clone, Debug)]
pub struct HealthThresholds {
    /// Error-rate increase that alone makes a deployment CRITICAL.
    pub critical_error_rate_increase: f64,
    /// Count of newly observed error patterns that makes it CRITICAL.
    pub critical_new_patterns: usize,
    /// Error-rate increase for UNHEALTHY.
    pub unhealthy_error_rate_increase: f64,
    /// Relative degradation (percent) for UNHEALTHY.
    pub unhealthy_degradation_percent: f64,
    /// Error-rate increase for DEGRADED.
    pub degraded_error_rate_increase: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            critical_error_rate_increase: 0.2,
            critical_new_patterns: 3,
            unhealthy_error_rate_increase: 0.1,
            unhealthy_degradation_percent: 100.0,
            degraded_error_rate_increase: 0.05,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Gate for best-effort diff annotation via the configured LLM.
    pub enable_llm_enrichment: bool,
    /// Minimum confidence for a learned pattern to be recalled.
    pub pattern_confidence_threshold: f64,
    /// Lookback window for similar-incident recall.
    pub similar_incident_days: i64,
    /// Lookback window for root-cause candidate commits, in hours.
    pub root_cause_window_hours: i64,
    /// How far back the live system-state log query reaches, in minutes.
    pub system_state_log_minutes: u32,
    /// Error rate above which the system is considered already unstable.
    pub elevated_error_rate: f64,
    pub health: HealthThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_llm_enrichment: false,
            pattern_confidence_threshold: 0.7,
            similar_incident_days: 90,
            root_cause_window_hours: 24,
            system_state_log_minutes: 15,
            elevated_error_rate: 0.05,
            health: HealthThresholds::default(),
        }
    }
}
