//! Pure helpers: URL parsing, content decoding (no HTTP, no status logic).

use base64::Engine as _;

use crate::error::{RepoError, RepoResult};
use crate::types::ContentResponse;

/// Parse owner and repository name from an API URL.
///
/// URL format: .../repos/{owner}/{name}[/...]
pub(crate) fn parse_repo_url(url: &str) -> (String, String) {
    let path = url.split('?').next().unwrap_or(url);
    let parts: Vec<&str> = path.split('/').collect();

    match parts.iter().position(|p| *p == "repos") {
        Some(idx) => (
            parts.get(idx + 1).unwrap_or(&"unknown").to_string(),
            parts.get(idx + 2).unwrap_or(&"unknown").to_string(),
        ),
        None => ("unknown".to_string(), "unknown".to_string()),
    }
}

/// Decode a contents-API payload into text.
///
/// Invalid UTF-8 is replaced rather than rejected; binary files are filtered
/// out before they get here.
pub(crate) fn decode_content(response: &ContentResponse) -> RepoResult<String> {
    let raw = response.content.as_deref().unwrap_or("");
    match response.encoding.as_deref() {
        Some("base64") => {
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| RepoError::InvalidResponse {
                    message: format!("invalid base64 for {}: {}", response.path, e),
                })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        Some("none") | None if raw.is_empty() => Ok(String::new()),
        _ => Ok(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_url() {
        let url = "https://api.github.com/repos/octo/hello/git/trees/main?recursive=1";
        let (owner, name) = parse_repo_url(url);
        assert_eq!(owner, "octo");
        assert_eq!(name, "hello");
    }

    #[test]
    fn test_parse_repo_url_unknown() {
        let (owner, name) = parse_repo_url("https://api.github.com/user");
        assert_eq!(owner, "unknown");
        assert_eq!(name, "unknown");
    }

    #[test]
    fn test_decode_base64_with_newlines() {
        let response = ContentResponse {
            path: "README.md".into(),
            size: 11,
            content: Some("aGVsbG8g\nd29ybGQ=\n".into()),
            encoding: Some("base64".into()),
        };
        assert_eq!(decode_content(&response).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_invalid_base64() {
        let response = ContentResponse {
            path: "x".into(),
            size: 1,
            content: Some("!!!".into()),
            encoding: Some("base64".into()),
        };
        assert!(matches!(
            decode_content(&response),
            Err(RepoError::InvalidResponse { .. })
        ));
    }
}
