//! Error types for the repository client.

use std::time::Duration;

/// Repository content errors.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Repository (or path) does not exist, or is hidden from this token.
    #[error("repository not found: {owner}/{name}")]
    NotFound { owner: String, name: String },

    /// Repository is private or the token is invalid.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// API rate limit exceeded.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Submitted reference is not a repository URL.
    #[error("invalid repository reference: {reference} - {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Network error.
    #[error("network error: {message}")]
    Network { message: String },

    /// Response body did not match the expected shape.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl RepoError {
    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }

    /// Short remediation hint suitable for an end user.
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => {
                "Check that the repository URL is correct and the repository exists"
            }
            Self::Unauthorized { .. } => {
                "Make the repository public or grant read access before resubmitting"
            }
            Self::RateLimited { .. } => "Resubmit later; the repository host is throttling requests",
            Self::InvalidReference { .. } => {
                "Submit a link of the form https://github.com/<owner>/<repository>"
            }
            Self::Network { .. } | Self::InvalidResponse { .. } | Self::Config { .. } => {
                "Resubmit the repository link; the repository could not be reached"
            }
        }
    }
}

impl From<reqwest::Error> for RepoError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;
