//! Intelligence memory data models — commits, deployments, incidents, patterns.

pub mod commit;
pub mod deployment;
pub mod incident;
pub mod pattern;
pub mod telemetry;

use serde::{Deserialize, Serialize};

/// Incident severity, P1 (worst) through P4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    P1,
    P2,
    P3,
    P4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::P1 => "P1",
            Severity::P2 => "P2",
            Severity::P3 => "P3",
            Severity::P4 => "P4",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "P1" => Some(Severity::P1),
            "P2" => Some(Severity::P2),
            "P3" => Some(Severity::P3),
            "P4" => Some(Severity::P4),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected blast impact of a deployment if it goes wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Impact {
    Low,
    Medium,
    High,
    Critical,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Low => "LOW",
            Impact::Medium => "MEDIUM",
            Impact::High => "HIGH",
            Impact::Critical => "CRITICAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Impact::Low),
            "MEDIUM" => Some(Impact::Medium),
            "HIGH" => Some(Impact::High),
            "CRITICAL" => Some(Impact::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorical deployment decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Block,
    StagedRollout,
    ProceedWithCaution,
    Proceed,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Block => "BLOCK",
            Action::StagedRollout => "STAGED_ROLLOUT",
            Action::ProceedWithCaution => "PROCEED_WITH_CAUTION",
            Action::Proceed => "PROCEED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BLOCK" => Some(Action::Block),
            "STAGED_ROLLOUT" => Some(Action::StagedRollout),
            "PROCEED_WITH_CAUTION" => Some(Action::ProceedWithCaution),
            "PROCEED" => Some(Action::Proceed),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post-deploy health assessment, recomputed on every monitoring tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Degraded => "DEGRADED",
            HealthStatus::Unhealthy => "UNHEALTHY",
            HealthStatus::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently a rollback should happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollbackUrgency {
    None,
    Low,
    Medium,
    High,
    Immediate,
}

impl RollbackUrgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            RollbackUrgency::None => "NONE",
            RollbackUrgency::Low => "LOW",
            RollbackUrgency::Medium => "MEDIUM",
            RollbackUrgency::High => "HIGH",
            RollbackUrgency::Immediate => "IMMEDIATE",
        }
    }
}

impl std::fmt::Display for RollbackUrgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
