//! HTTP layer: status mapping and retry.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use tracing::warn;

use crate::error::{RepoError, RepoResult};
use crate::types::RepoConfig;

use super::helpers::parse_repo_url;

/// HTTP backend for making requests (holds reqwest client, token, config).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) api_root: url::Url,
    pub(crate) config: RepoConfig,
}

impl HttpBackend {
    /// GET a JSON resource, retrying transient failures.
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> RepoResult<T> {
        let response = self.request(url).await?;
        response
            .json()
            .await
            .map_err(|e| RepoError::InvalidResponse {
                message: format!("failed to parse {}: {}", url, e),
            })
    }

    pub(crate) async fn request(&self, url: &str) -> RepoResult<reqwest::Response> {
        use rand::Rng;

        let mut retries = 0;
        let max_retries = self.config.max_retries;

        loop {
            match self.request_once(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;

                    let backoff = match &e {
                        RepoError::RateLimited {
                            retry_after: Some(retry_after),
                        } => {
                            let capped = (*retry_after).min(Duration::from_secs(10));
                            let base_ms = capped.as_millis() as u64;
                            let jitter_factor: f64 =
                                rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
                            Duration::from_millis(jittered_ms.max(100))
                        }
                        _ => {
                            let base_backoff =
                                Duration::from_millis(250 << retries).min(Duration::from_secs(5));
                            let jittered_ms =
                                rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
                            Duration::from_millis(jittered_ms.max(10))
                        }
                    };

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying repository request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_once(&self, url: &str) -> RepoResult<reqwest::Response> {
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");

        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),

            401 => Err(RepoError::Unauthorized {
                message: "invalid or expired token".to_string(),
            }),

            403 => {
                let exhausted = response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.trim() == "0")
                    .unwrap_or(false);
                if exhausted {
                    Err(RepoError::RateLimited {
                        retry_after: retry_after(&response),
                    })
                } else {
                    Err(RepoError::Unauthorized {
                        message: "repository is private or access is forbidden".to_string(),
                    })
                }
            }

            404 => {
                let (owner, name) = parse_repo_url(url);
                Err(RepoError::NotFound { owner, name })
            }

            429 => Err(RepoError::RateLimited {
                retry_after: retry_after(&response),
            }),

            _ => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(RepoError::Network {
                    message: format!("HTTP {}: {}", status.as_u16(), truncate(&message, 200)),
                })
            }
        }
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
