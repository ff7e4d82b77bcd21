//! GitHub commit enrichment — commit details, author history, raw diffs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use intel_engine::error::{IntelError, Result};
use intel_engine::sources::{AuthorHistory, ChangedFile, CommitSource, CommitStats};

use super::CommitFeed;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub struct GithubCommitSource {
    token: String,
    repo: String,
    base_url: String,
    client: reqwest::Client,
}

impl GithubCommitSource {
    pub fn new(token: &str, repo: &str) -> Self {
        Self {
            token: token.to_string(),
            repo: repo.to_string(),
            base_url: "https://api.github.com".to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn configured(&self) -> bool {
        !self.token.is_empty() && !self.repo.is_empty()
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "centrix-intel")
            .timeout(REQUEST_TIMEOUT)
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        let resp = self
            .request(url)
            .send()
            .await
            .map_err(|e| IntelError::SourceUnavailable(format!("github: {e}")))?;
        if !resp.status().is_success() {
            return Err(IntelError::SourceUnavailable(format!(
                "github: {} for {url}",
                resp.status()
            )));
        }
        resp.json()
            .await
            .map_err(|e| IntelError::SourceUnavailable(format!("github: {e}")))
    }
}

#[async_trait]
impl CommitSource for GithubCommitSource {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn health_check(&self) -> bool {
        self.configured()
    }

    async fn commit_details(&self, sha: &str) -> Result<CommitStats> {
        let url = format!("{}/repos/{}/commits/{sha}", self.base_url, self.repo);
        let data = self.fetch_json(&url).await?;

        let timestamp = data["commit"]["author"]["date"]
            .as_str()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let files = data["files"]
            .as_array()
            .map(|files| {
                files
                    .iter()
                    .filter_map(|f| {
                        Some(ChangedFile {
                            filename: f["filename"].as_str()?.to_string(),
                            additions: f["additions"].as_i64().unwrap_or(0) as i32,
                            deletions: f["deletions"].as_i64().unwrap_or(0) as i32,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(sha, files = data["files"].as_array().map(|f| f.len()).unwrap_or(0),
            "Fetched GitHub commit details");

        Ok(CommitStats {
            sha: sha.to_string(),
            message: data["commit"]["message"].as_str().unwrap_or_default().to_string(),
            author: data["commit"]["author"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            email: data["commit"]["author"]["email"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            timestamp,
            additions: data["stats"]["additions"].as_i64().unwrap_or(0) as i32,
            deletions: data["stats"]["deletions"].as_i64().unwrap_or(0) as i32,
            files,
        })
    }

    async fn author_history(&self, email: &str, window_days: u32) -> Result<AuthorHistory> {
        let since = (Utc::now() - Duration::days(window_days as i64)).to_rfc3339();
        let url = format!(
            "{}/repos/{}/commits?author={email}&since={since}&per_page=100",
            self.base_url, self.repo
        );
        let data = self.fetch_json(&url).await?;

        let commits = data.as_array().cloned().unwrap_or_default();
        let total_files: usize = commits
            .iter()
            .map(|c| c["files"].as_array().map(|f| f.len()).unwrap_or(0))
            .sum();

        Ok(AuthorHistory {
            total_commits: commits.len() as i64,
            avg_files_changed: if commits.is_empty() {
                0.0
            } else {
                total_files as f64 / commits.len() as f64
            },
        })
    }

    async fn commit_diff(&self, sha: &str) -> Result<Option<String>> {
        let url = format!("{}/repos/{}/commits/{sha}", self.base_url, self.repo);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.diff")
            .header("User-Agent", "centrix-intel")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| IntelError::SourceUnavailable(format!("github: {e}")))?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        Ok(resp.text().await.ok())
    }
}

#[async_trait]
impl CommitFeed for GithubCommitSource {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn healthy(&self) -> bool {
        self.configured()
    }

    async fn recent_commits(&self, limit: usize) -> anyhow::Result<Vec<String>> {
        let url = format!(
            "{}/repos/{}/commits?per_page={limit}",
            self.base_url, self.repo
        );
        let data = self.fetch_json(&url).await?;
        Ok(data
            .as_array()
            .map(|commits| {
                commits
                    .iter()
                    .filter_map(|c| c["sha"].as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
