//! Repository content client and bounded repository digests.
//!
//! Version-control submissions arrive as a link. This crate resolves the link,
//! reads repository metadata, language breakdown, the file tree and a capped
//! set of file contents, and reduces them to a [`RepositorySummary`] whose
//! [`RepositorySummary::render_digest`] output is embedded in the evaluation
//! prompt.
//!
//! # Quick Start
//!
//! ```no_run
//! use assessor_repo::{RepoClient, RepoRef, RepoSummarizer};
//!
//! # async fn example() -> Result<(), assessor_repo::RepoError> {
//! let summarizer = RepoSummarizer::new(RepoClient::from_env()?);
//! let repo = RepoRef::parse("https://github.com/octo/hello-world")?;
//! let summary = summarizer.summarize(&repo, &["calculator".to_string()]).await?;
//! println!("{}", summary.render_digest());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ASSESSOR_REPO_API_URL` | API base URL (default: `https://api.github.com`) |
//! | `ASSESSOR_REPO_TOKEN` | Access token (falls back to `GITHUB_TOKEN`) |
//! | `ASSESSOR_REPO_TIMEOUT` | Request timeout in seconds (default: 15) |
//! | `ASSESSOR_REPO_MAX_RETRIES` | Max retries for transient failures (default: 2) |
//! | `ASSESSOR_REPO_MAX_TOTAL_BYTES` | Total fetched bytes per repository (default: 512 KiB) |
//! | `ASSESSOR_REPO_MAX_FILE_BYTES` | Largest file fetched (default: 100 KiB) |

pub mod client;
pub mod error;
pub mod reference;
pub mod summary;
pub mod types;

pub use client::{RepoClient, REPO_USER_AGENT};
pub use error::{RepoError, RepoResult};
pub use reference::RepoRef;
pub use summary::{
    prioritize_by_path, rank_files, truncate_chars, CandidateFile, RepoSummarizer, RepositorySummary, SelectedFile,
};
pub use types::{
    ContentResponse, RepoConfig, RepoLimits, RepoMetadata, TreeEntry, TreeResponse,
};
