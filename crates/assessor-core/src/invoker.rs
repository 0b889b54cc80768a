//! Evaluation calls with a hard timeout and a single light-tier fallback.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, warn, Instrument};

use crate::errors::InvokeError;
use crate::prompt::SYSTEM_INSTRUCTION;
use crate::providers::llm::{CompletionRequest, LlmClient};
use crate::tier::{ModelTiers, Tier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            temperature: 0.3,
            max_output_tokens: 1000,
        }
    }
}

/// Raw response plus the tier and model that actually produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub text: String,
    pub tier: Tier,
    pub model: String,
    pub fell_back: bool,
}

pub struct Invoker {
    client: Arc<dyn LlmClient>,
    tiers: ModelTiers,
    config: InvokerConfig,
}

impl Invoker {
    pub fn new(client: Arc<dyn LlmClient>, tiers: ModelTiers, config: InvokerConfig) -> Self {
        Self {
            client,
            tiers,
            config,
        }
    }

    pub fn tiers(&self) -> &ModelTiers {
        &self.tiers
    }

    pub fn provider_name(&self) -> &'static str {
        self.client.provider_name()
    }

    /// Call the selected tier; on error or timeout retry exactly once at
    /// [`Tier::Light`]. This also applies when `tier` is already Light.
    pub async fn invoke(&self, prompt: &str, tier: Tier) -> Result<Invocation, InvokeError> {
        let primary = match self.call(prompt, tier).await {
            Ok(invocation) => return Ok(invocation),
            Err(e) => e,
        };

        warn!(tier = %tier, error = %primary, "evaluation call failed, falling back to light tier");

        match self.call(prompt, Tier::Light).await {
            Ok(mut invocation) => {
                invocation.fell_back = true;
                Ok(invocation)
            }
            Err(fallback) => Err(InvokeError::Exhausted {
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            }),
        }
    }

    async fn call(&self, prompt: &str, tier: Tier) -> Result<Invocation, InvokeError> {
        let model = self.tiers.model_for(tier).to_string();
        let request = CompletionRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            user_prompt: prompt.to_string(),
            model: model.clone(),
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
            json_mode: true,
        };
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let span = info_span!(
            "assessor.invoke",
            tier = %tier,
            model = %model,
            provider = self.client.provider_name()
        );

        async move {
            let start = Instant::now();
            // A late response after the timeout is dropped with the future.
            match tokio::time::timeout(timeout, self.client.complete(&request)).await {
                Err(_) => Err(InvokeError::Timeout {
                    tier,
                    model,
                    timeout_secs: self.config.timeout_secs,
                }),
                Ok(Err(e)) => Err(InvokeError::Provider {
                    tier,
                    model,
                    message: format!("{:#}", e),
                }),
                Ok(Ok(resp)) => {
                    debug!(
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        prompt_chars = request.user_prompt.len(),
                        response_chars = resp.text.len(),
                        "evaluation call completed"
                    );
                    Ok(Invocation {
                        text: resp.text,
                        tier,
                        model,
                        fell_back: false,
                    })
                }
            }
        }
        .instrument(span)
        .await
    }
}
