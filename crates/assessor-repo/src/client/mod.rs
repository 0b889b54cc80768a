//! Read-only repository content client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;
use url::Url;

use crate::error::{RepoError, RepoResult};
use crate::reference::RepoRef;
use crate::types::{ContentResponse, RepoConfig, RepoMetadata, TreeResponse};

mod helpers;
mod http;

use helpers::decode_content;
use http::HttpBackend;

/// User-Agent sent with every request (the host rejects anonymous agents).
pub const REPO_USER_AGENT: &str = concat!("assessor-repo/", env!("CARGO_PKG_VERSION"));

/// Repository content client.
#[derive(Debug, Clone)]
pub struct RepoClient {
    http: HttpBackend,
}

impl RepoClient {
    pub fn new(config: RepoConfig) -> RepoResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(REPO_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| RepoError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let base_url = config.url.trim_end_matches('/').to_string();
        let api_root = Url::parse(&base_url).map_err(|e| RepoError::Config {
            message: format!("invalid API URL '{}': {}", base_url, e),
        })?;
        if api_root.cannot_be_a_base() {
            return Err(RepoError::Config {
                message: format!("API URL '{}' cannot carry a path", base_url),
            });
        }

        Ok(Self {
            http: HttpBackend {
                client,
                base_url,
                api_root,
                config,
            },
        })
    }

    pub fn from_env() -> RepoResult<Self> {
        Self::new(RepoConfig::from_env())
    }

    pub fn config(&self) -> &RepoConfig {
        &self.http.config
    }

    pub async fn get_repository(&self, repo: &RepoRef) -> RepoResult<RepoMetadata> {
        let url = self.repo_url(repo, &[]);
        debug!(url = %url, "fetching repository metadata");
        self.http.get_json(url.as_str()).await
    }

    /// Language name to byte count.
    pub async fn get_languages(&self, repo: &RepoRef) -> RepoResult<BTreeMap<String, u64>> {
        let url = self.repo_url(repo, &["languages"]);
        debug!(url = %url, "fetching language breakdown");
        self.http.get_json(url.as_str()).await
    }

    pub async fn get_tree(&self, repo: &RepoRef, branch: &str) -> RepoResult<TreeResponse> {
        let mut url = self.repo_url(repo, &["git", "trees"]);
        extend_path(&mut url, branch);
        url.query_pairs_mut().append_pair("recursive", "1");
        debug!(url = %url, "fetching file tree");
        self.http.get_json(url.as_str()).await
    }

    /// Fetch one file's text content.
    pub async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        branch: &str,
    ) -> RepoResult<String> {
        let mut url = self.repo_url(repo, &["contents"]);
        extend_path(&mut url, path);
        url.query_pairs_mut().append_pair("ref", branch);
        debug!(url = %url, "fetching file content");
        let response: ContentResponse = self.http.get_json(url.as_str()).await?;
        decode_content(&response)
    }

    /// `{api}/repos/{owner}/{name}/{tail...}`, each segment percent-encoded.
    fn repo_url(&self, repo: &RepoRef, tail: &[&str]) -> Url {
        let mut url = self.http.api_root.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", repo.owner.as_str(), repo.name.as_str()])
                .extend(tail);
        }
        url
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.config.token.is_some()
    }
}

/// Append a `/`-separated repository path, one encoded segment per component.
fn extend_path(url: &mut Url, path: &str) {
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
    }
}
