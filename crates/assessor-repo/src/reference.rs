//! Repository reference parsing.
//!
//! Accepted forms:
//! - `https://github.com/owner/name` (optionally `.git`, trailing `/`, or a deeper path)
//! - `github.com/owner/name`
//! - `owner/name`

use std::fmt;

use url::Url;

use crate::error::{RepoError, RepoResult};

const HOST: &str = "github.com";

/// A parsed repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse a submitted repository link.
    ///
    /// ```
    /// use assessor_repo::RepoRef;
    ///
    /// let r = RepoRef::parse("https://github.com/rust-lang/cargo.git").unwrap();
    /// assert_eq!(r.owner, "rust-lang");
    /// assert_eq!(r.name, "cargo");
    ///
    /// let short = RepoRef::parse("rust-lang/cargo").unwrap();
    /// assert_eq!(short, r);
    /// ```
    pub fn parse(reference: &str) -> RepoResult<Self> {
        let reference = reference.trim();

        if reference.is_empty() {
            return Err(invalid(reference, "empty reference"));
        }

        let segments: Vec<String> = if reference.contains("://") {
            let url = Url::parse(reference).map_err(|e| invalid(reference, &e.to_string()))?;
            if url.scheme() != "https" && url.scheme() != "http" {
                return Err(invalid(reference, "unsupported scheme"));
            }
            let host = url.host_str().unwrap_or_default();
            if !host.eq_ignore_ascii_case(HOST) && !host.eq_ignore_ascii_case("www.github.com") {
                return Err(invalid(reference, "not a github.com repository"));
            }
            url.path_segments()
                .map(|s| s.filter(|p| !p.is_empty()).map(String::from).collect())
                .unwrap_or_default()
        } else if let Some(rest) = reference
            .strip_prefix("github.com/")
            .or_else(|| reference.strip_prefix("www.github.com/"))
        {
            split_path(rest)
        } else if reference.matches('/').count() == 1 {
            split_path(reference)
        } else {
            return Err(invalid(reference, "expected owner/name"));
        };

        if segments.len() < 2 {
            return Err(invalid(reference, "expected owner/name"));
        }

        let owner = segments[0].clone();
        let name = segments[1]
            .strip_suffix(".git")
            .unwrap_or(&segments[1])
            .to_string();

        validate_segment(reference, &owner)?;
        validate_segment(reference, &name)?;

        Ok(Self { owner, name })
    }

    /// Canonical web URL.
    pub fn html_url(&self) -> String {
        format!("https://{}/{}/{}", HOST, self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split(['/', '?', '#'])
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

fn validate_segment(reference: &str, segment: &str) -> RepoResult<()> {
    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(invalid(reference, "empty owner or repository name"));
    }
    let ok = segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !ok {
        return Err(invalid(
            reference,
            "owner and repository may only contain [A-Za-z0-9._-]",
        ));
    }
    Ok(())
}

fn invalid(reference: &str, reason: &str) -> RepoError {
    RepoError::InvalidReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}
