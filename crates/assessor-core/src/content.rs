//! Content acquisition for submissions that point somewhere else.

use assessor_repo::{RepoClient, RepoConfig, RepoRef, RepoResult, RepoSummarizer};
use async_trait::async_trait;
use tracing::debug;

/// Produces the digest the prompt uses instead of a repository link.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn digest(&self, link: &str, keywords: &[String]) -> RepoResult<String>;
}

/// [`RepositorySource`] backed by the hosting API.
pub struct HostedRepositories {
    summarizer: RepoSummarizer,
}

impl HostedRepositories {
    pub fn new(config: RepoConfig) -> RepoResult<Self> {
        Ok(Self {
            summarizer: RepoSummarizer::new(RepoClient::new(config)?),
        })
    }
}

#[async_trait]
impl RepositorySource for HostedRepositories {
    async fn digest(&self, link: &str, keywords: &[String]) -> RepoResult<String> {
        let repo = RepoRef::parse(link)?;
        let summary = self.summarizer.summarize(&repo, keywords).await?;
        debug!(
            repo = %repo,
            files = summary.file_count,
            analyzed = summary.analyzed_file_count,
            "repository summarized"
        );
        Ok(summary.render_digest())
    }
}
