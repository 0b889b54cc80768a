//! Engine configuration: YAML file, then `ASSESSOR_*` environment overrides.

use assessor_repo::RepoConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::invoker::InvokerConfig;
use crate::rate_limit::RateLimitConfig;
use crate::tier::ModelTiers;

pub use crate::providers::llm::openai::OpenAIConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rate_limit: RateLimitConfig,
    pub models: ModelTiers,
    pub invoker: InvokerConfig,
    pub repo: RepoConfig,
}

impl EngineConfig {
    /// Defaults overridden by the environment.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `ASSESSOR_RATE_LIMIT_MAX_REQUESTS` | `rate_limit.max_requests` |
    /// | `ASSESSOR_RATE_LIMIT_WINDOW_SECS` | `rate_limit.window_secs` |
    /// | `ASSESSOR_MODEL_LIGHT` / `_BALANCED` / `_HEAVY` | `models.*` |
    /// | `ASSESSOR_TIMEOUT_SECS` | `invoker.timeout_secs` |
    /// | `ASSESSOR_TEMPERATURE` | `invoker.temperature` |
    /// | `ASSESSOR_MAX_OUTPUT_TOKENS` | `invoker.max_output_tokens` |
    /// | `ASSESSOR_REPO_*` | see [`RepoConfig::from_env`] |
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Read a YAML file, then apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("ASSESSOR_RATE_LIMIT_MAX_REQUESTS") {
            self.rate_limit.max_requests = v;
        }
        if let Some(v) = env_parse("ASSESSOR_RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = v;
        }
        if let Some(v) = env_string("ASSESSOR_MODEL_LIGHT") {
            self.models.light = v;
        }
        if let Some(v) = env_string("ASSESSOR_MODEL_BALANCED") {
            self.models.balanced = v;
        }
        if let Some(v) = env_string("ASSESSOR_MODEL_HEAVY") {
            self.models.heavy = v;
        }
        if let Some(v) = env_parse("ASSESSOR_TIMEOUT_SECS") {
            self.invoker.timeout_secs = v;
        }
        if let Some(v) = env_parse("ASSESSOR_TEMPERATURE") {
            self.invoker.temperature = v;
        }
        if let Some(v) = env_parse("ASSESSOR_MAX_OUTPUT_TOKENS") {
            self.invoker.max_output_tokens = v;
        }
        self.repo.apply_env();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_requests must be at least 1".into(),
            ));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.window_secs must be at least 1".into(),
            ));
        }
        if self.invoker.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "invoker.timeout_secs must be at least 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.invoker.temperature) {
            return Err(ConfigError::Invalid(format!(
                "invoker.temperature must be within 0.0..=2.0, got {}",
                self.invoker.temperature
            )));
        }
        for (name, model) in [
            ("light", &self.models.light),
            ("balanced", &self.models.balanced),
            ("heavy", &self.models.heavy),
        ] {
            if model.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("models.{} is empty", name)));
            }
        }
        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_KEYS: [&str; 5] = [
        "ASSESSOR_RATE_LIMIT_MAX_REQUESTS",
        "ASSESSOR_MODEL_HEAVY",
        "ASSESSOR_TIMEOUT_SECS",
        "ASSESSOR_TEMPERATURE",
        "ASSESSOR_REPO_API_URL",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults() {
        clear_env();
        let config = EngineConfig::from_env();
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.invoker.timeout_secs, 30);
        assert_eq!(config.invoker.max_output_tokens, 1000);
        assert!((config.invoker.temperature - 0.3).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn yaml_then_env() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "rate_limit:\n  max_requests: 3\nmodels:\n  heavy: big-model\nrepo:\n  url: http://repo.local"
        )
        .unwrap();

        std::env::set_var("ASSESSOR_TIMEOUT_SECS", "5");
        let config = EngineConfig::load(file.path()).unwrap();
        std::env::remove_var("ASSESSOR_TIMEOUT_SECS");

        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.models.heavy, "big-model");
        assert_eq!(config.models.light, "gpt-4o-mini");
        assert_eq!(config.invoker.timeout_secs, 5);
        assert_eq!(config.repo.url, "http://repo.local");
    }

    #[test]
    #[serial]
    fn invalid_values_rejected() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "invoker:\n  temperature: 3.5").unwrap();
        let err = EngineConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load("/nonexistent/assessor.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = EngineConfig::from_yaml_str("").unwrap();
        assert_eq!(config.models, ModelTiers::default());
    }
}
