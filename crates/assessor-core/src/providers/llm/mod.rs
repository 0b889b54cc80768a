pub mod fake;
pub mod openai;

use async_trait::async_trait;
use serde::Serialize;

/// One call to the evaluation capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub user_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Ask the provider for structured (JSON object) output.
    pub json_mode: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub meta: serde_json::Value,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<LlmResponse>;
    fn provider_name(&self) -> &'static str;
}
