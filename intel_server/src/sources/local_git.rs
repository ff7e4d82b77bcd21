//! Local git fallback — commit inspection via the `git` CLI when the GitHub
//! API is unavailable or unconfigured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::process::Command;

use intel_engine::error::{IntelError, Result};
use intel_engine::sources::{AuthorHistory, ChangedFile, CommitSource, CommitStats};

use super::CommitFeed;

pub struct LocalGitSource {
    repo_path: String,
}

impl LocalGitSource {
    pub fn new(repo_path: &str) -> Self {
        Self {
            repo_path: repo_path.to_string(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(["-C", &self.repo_path])
            .args(args)
            .output()
            .await
            .map_err(|e| IntelError::SourceUnavailable(format!("git: {e}")))?;

        if !output.status.success() {
            return Err(IntelError::SourceUnavailable(format!(
                "git {}: {}",
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Parse `--numstat` output lines ("added<TAB>deleted<TAB>path"); binary
/// files report "-" and count as zero churn.
fn parse_numstat(output: &str) -> Vec<ChangedFile> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let additions = parts.next()?.trim();
            let deletions = parts.next()?.trim();
            let filename = parts.next()?.trim();
            if filename.is_empty() {
                return None;
            }
            Some(ChangedFile {
                filename: filename.to_string(),
                additions: additions.parse().unwrap_or(0),
                deletions: deletions.parse().unwrap_or(0),
            })
        })
        .collect()
}

#[async_trait]
impl CommitSource for LocalGitSource {
    fn name(&self) -> &'static str {
        "local-git"
    }

    async fn health_check(&self) -> bool {
        self.git(&["rev-parse", "--git-dir"]).await.is_ok()
    }

    async fn commit_details(&self, sha: &str) -> Result<CommitStats> {
        let meta = self
            .git(&[
                "show",
                "-s",
                "--format=%H%x1f%an%x1f%ae%x1f%aI%x1f%s",
                sha,
            ])
            .await?;
        let mut fields = meta.trim().split('\x1f');
        let full_sha = fields.next().unwrap_or(sha).to_string();
        let author = fields.next().unwrap_or_default().to_string();
        let email = fields.next().unwrap_or_default().to_string();
        let timestamp = fields
            .next()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let message = fields.next().unwrap_or_default().to_string();

        let numstat = self.git(&["show", "--numstat", "--format=", sha]).await?;
        let files = parse_numstat(&numstat);
        let additions = files.iter().map(|f| f.additions).sum();
        let deletions = files.iter().map(|f| f.deletions).sum();

        Ok(CommitStats {
            sha: full_sha,
            message,
            author,
            email,
            timestamp,
            additions,
            deletions,
            files,
        })
    }

    async fn author_history(&self, email: &str, window_days: u32) -> Result<AuthorHistory> {
        let since = format!("--since={window_days} days ago");
        let author = format!("--author={email}");
        let output = self
            .git(&["log", &since, &author, "--pretty=format:%H", "--numstat"])
            .await?;

        let mut total_commits = 0i64;
        let mut total_files = 0i64;
        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.len() == 40 && line.chars().all(|c| c.is_ascii_hexdigit()) {
                total_commits += 1;
            } else if line.contains('\t') {
                total_files += 1;
            }
        }

        Ok(AuthorHistory {
            total_commits,
            avg_files_changed: if total_commits == 0 {
                0.0
            } else {
                total_files as f64 / total_commits as f64
            },
        })
    }

    async fn commit_diff(&self, sha: &str) -> Result<Option<String>> {
        Ok(self.git(&["show", "--format=", sha]).await.ok())
    }
}

#[async_trait]
impl CommitFeed for LocalGitSource {
    fn name(&self) -> &'static str {
        "local-git"
    }

    async fn healthy(&self) -> bool {
        self.health_check().await
    }

    async fn recent_commits(&self, limit: usize) -> anyhow::Result<Vec<String>> {
        let output = self
            .git(&["rev-list", "-n", &limit.to_string(), "HEAD"])
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        Ok(output.lines().map(|l| l.trim().to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numstat_parsing_handles_binary_files() {
        let output = "12\t3\tsrc/auth/login.rs\n-\t-\tassets/logo.png\n";
        let files = parse_numstat(output);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].additions, 12);
        assert_eq!(files[0].deletions, 3);
        assert_eq!(files[1].additions, 0);
        assert_eq!(files[1].filename, "assets/logo.png");
    }
}
