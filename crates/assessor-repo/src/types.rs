//! API response types and client configuration.

use serde::{Deserialize, Serialize};

/// Repository metadata from `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMetadata {
    /// Repository name.
    pub name: String,

    /// `owner/name`.
    #[serde(default)]
    pub full_name: Option<String>,

    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,

    /// Default branch name.
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Primary language as detected by the host.
    #[serde(default)]
    pub language: Option<String>,

    /// Whether the repository is private.
    #[serde(default)]
    pub private: bool,
}

fn default_branch() -> String {
    "main".to_string()
}

/// Response from `GET /repos/{owner}/{repo}/git/trees/{ref}?recursive=1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeResponse {
    #[serde(default)]
    pub sha: Option<String>,

    pub tree: Vec<TreeEntry>,

    /// Set when the host cut the listing short.
    #[serde(default)]
    pub truncated: bool,
}

/// A single tree entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,

    /// `blob` for files, `tree` for directories.
    #[serde(rename = "type")]
    pub kind: String,

    /// Blob size in bytes (absent for trees).
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn is_file(&self) -> bool {
        self.kind == "blob"
    }
}

/// Response from `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub path: String,

    #[serde(default)]
    pub size: u64,

    /// Payload, usually base64 with embedded newlines.
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub encoding: Option<String>,
}

/// Resource caps for one repository summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepoLimits {
    /// Files larger than this are never fetched.
    pub max_file_bytes: u64,

    /// Total fetched bytes across all files.
    pub max_total_bytes: u64,

    /// Maximum files fetched for ranking.
    pub max_fetched_files: usize,

    /// Files included in full in the digest.
    pub top_files: usize,

    /// Character budget per included file.
    pub file_snippet_chars: usize,

    /// Character budget for the README excerpt.
    pub readme_chars: usize,

    /// Entries shown in the structure listing.
    pub max_structure_entries: usize,
}

impl Default for RepoLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 100 * 1024,
            max_total_bytes: 512 * 1024,
            max_fetched_files: 25,
            top_files: 5,
            file_snippet_chars: 500,
            readme_chars: 1000,
            max_structure_entries: 60,
        }
    }
}

/// Repository client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// API base URL.
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Access token (raises the host's rate limit, enables private repos).
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default)]
    pub limits: RepoLimits,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    2
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            token: None,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            limits: RepoLimits::default(),
        }
    }
}

impl RepoConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `ASSESSOR_REPO_API_URL` | API base URL |
    /// | `ASSESSOR_REPO_TOKEN` | Access token (falls back to `GITHUB_TOKEN`) |
    /// | `ASSESSOR_REPO_TIMEOUT` | Request timeout in seconds |
    /// | `ASSESSOR_REPO_MAX_RETRIES` | Retries for transient failures |
    /// | `ASSESSOR_REPO_MAX_TOTAL_BYTES` | Total fetched-byte cap |
    /// | `ASSESSOR_REPO_MAX_FILE_BYTES` | Per-file size cap |
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields whose environment variable is set; others are kept.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("ASSESSOR_REPO_API_URL") {
            if !url.trim().is_empty() {
                self.url = url;
            }
        }
        if let Some(token) = std::env::var("ASSESSOR_REPO_TOKEN")
            .or_else(|_| std::env::var("GITHUB_TOKEN"))
            .ok()
            .filter(|t| !t.trim().is_empty())
        {
            self.token = Some(token);
        }
        if let Some(v) = env_parse("ASSESSOR_REPO_TIMEOUT") {
            self.timeout_secs = v;
        }
        if let Some(v) = env_parse("ASSESSOR_REPO_MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = env_parse("ASSESSOR_REPO_MAX_TOTAL_BYTES") {
            self.limits.max_total_bytes = v;
        }
        if let Some(v) = env_parse("ASSESSOR_REPO_MAX_FILE_BYTES") {
            self.limits.max_file_bytes = v;
        }
    }

    /// Set the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the API base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Replace the resource caps.
    pub fn with_limits(mut self, limits: RepoLimits) -> Self {
        self.limits = limits;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        std::env::remove_var("ASSESSOR_REPO_API_URL");
        std::env::remove_var("ASSESSOR_REPO_TOKEN");
        std::env::remove_var("GITHUB_TOKEN");
        std::env::remove_var("ASSESSOR_REPO_MAX_TOTAL_BYTES");

        let config = RepoConfig::from_env();
        assert_eq!(config.url, "https://api.github.com");
        assert!(config.token.is_none());
        assert_eq!(config.limits, RepoLimits::default());
    }

    #[test]
    #[serial]
    fn test_config_from_env_overrides() {
        std::env::set_var("ASSESSOR_REPO_TOKEN", "tok");
        std::env::set_var("ASSESSOR_REPO_MAX_TOTAL_BYTES", "2048");

        let config = RepoConfig::from_env();
        assert_eq!(config.token.as_deref(), Some("tok"));
        assert_eq!(config.limits.max_total_bytes, 2048);

        std::env::remove_var("ASSESSOR_REPO_TOKEN");
        std::env::remove_var("ASSESSOR_REPO_MAX_TOTAL_BYTES");
    }

    #[test]
    fn test_config_builder() {
        let config = RepoConfig::default()
            .with_url("http://127.0.0.1:9000")
            .with_token("t")
            .with_max_retries(0);
        assert_eq!(config.url, "http://127.0.0.1:9000");
        assert_eq!(config.token.as_deref(), Some("t"));
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_tree_entry_deserialize() {
        let entry: TreeEntry =
            serde_json::from_str(r#"{"path":"src/main.rs","type":"blob","size":42}"#).unwrap();
        assert!(entry.is_file());
        assert_eq!(entry.size, Some(42));
    }
}
