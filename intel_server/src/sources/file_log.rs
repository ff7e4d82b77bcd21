//! File-based log fallback — for systems without centralized logging.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;

use intel_engine::error::{IntelError, Result};
use intel_engine::models::telemetry::LogEntry;
use intel_engine::sources::LogSource;

static LEVEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(critical|fatal|error|warn(?:ing)?|info|debug)\b").unwrap());

/// How many trailing lines each log file contributes.
const TAIL_LINES: usize = 500;
const MAX_FILES: usize = 10;

pub struct FileLogSource {
    log_path: String,
}

impl FileLogSource {
    pub fn new(log_path: &str) -> Self {
        Self {
            log_path: log_path.to_string(),
        }
    }
}

fn level_of(line: &str) -> &'static str {
    match LEVEL_REGEX
        .find(line)
        .map(|m| m.as_str().to_lowercase())
        .as_deref()
    {
        Some("critical") | Some("fatal") => "critical",
        Some("error") => "error",
        Some("warn") | Some("warning") => "warning",
        Some("debug") => "debug",
        _ => "info",
    }
}

#[async_trait]
impl LogSource for FileLogSource {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn health_check(&self) -> bool {
        tokio::fs::metadata(&self.log_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn fetch_recent_logs(&self, _since_minutes: u32) -> Result<Vec<LogEntry>> {
        let mut dir = tokio::fs::read_dir(&self.log_path)
            .await
            .map_err(|e| IntelError::BackendUnavailable(format!("log dir: {e}")))?;

        let mut logs = Vec::new();
        let mut files_read = 0usize;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| IntelError::BackendUnavailable(format!("log dir: {e}")))?
        {
            if files_read >= MAX_FILES {
                break;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("log") {
                continue;
            }
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };
            files_read += 1;

            let service = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();

            let lines: Vec<&str> = content.lines().collect();
            let tail_start = lines.len().saturating_sub(TAIL_LINES);
            for line in &lines[tail_start..] {
                if line.trim().is_empty() {
                    continue;
                }
                logs.push(LogEntry {
                    timestamp: Utc::now(),
                    level: level_of(line).to_string(),
                    message: line.to_string(),
                    service: service.clone(),
                });
            }
        }

        tracing::debug!(count = logs.len(), files = files_read, "Read logs from files");
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_extraction() {
        assert_eq!(level_of("2025-06-04 ERROR something broke"), "error");
        assert_eq!(level_of("[WARN] disk almost full"), "warning");
        assert_eq!(level_of("FATAL: cannot fork"), "critical");
        assert_eq!(level_of("plain message"), "info");
    }
}
