use std::path::Path;
use std::sync::Arc;

use assessor_core::config::OpenAIConfig;
use assessor_core::providers::llm::fake::FakeClient;
use assessor_core::providers::llm::openai::OpenAIClient;
use assessor_core::providers::llm::LlmClient;
use assessor_core::EngineConfig;

use super::ProviderKind;

/// Config file when given, otherwise defaults; env overrides apply either way.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => {
            let config = EngineConfig::from_env();
            config.validate()?;
            config
        }
    };
    Ok(config)
}

pub(crate) fn build_client(provider: ProviderKind) -> anyhow::Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match provider {
        ProviderKind::Openai => {
            let config = OpenAIConfig::from_env();
            if config.api_key.is_none() {
                anyhow::bail!("OPENAI_API_KEY is required for --provider openai (use --provider fake for offline runs)");
            }
            Arc::new(OpenAIClient::new(&config)?)
        }
        ProviderKind::Fake => Arc::new(FakeClient::new()),
    };
    tracing::debug!(provider = client.provider_name(), "evaluation client ready");
    Ok(client)
}
