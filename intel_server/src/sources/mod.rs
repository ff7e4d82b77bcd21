//! Backend adapters for the engine's collaborator contracts — GitHub API,
//! local git inspection, Loki, file logs, Prometheus, and LLM providers.

pub mod file_log;
pub mod github;
pub mod llm;
pub mod local_git;
pub mod loki;
pub mod prometheus;

use async_trait::async_trait;

/// A source the commit poller can enumerate new commits from. Tried in
/// capability order, like the other source chains.
#[async_trait]
pub trait CommitFeed: Send + Sync {
    fn name(&self) -> &'static str;

    async fn healthy(&self) -> bool;

    async fn recent_commits(&self, limit: usize) -> anyhow::Result<Vec<String>>;
}
