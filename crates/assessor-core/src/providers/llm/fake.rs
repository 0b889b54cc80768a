use super::{CompletionRequest, LlmClient, LlmResponse};
use async_trait::async_trait;

/// Canned verdict used when no response is configured.
pub const DEFAULT_FAKE_RESPONSE: &str = r#"{
  "remark": "Good",
  "feedback": "Offline assessment: the submission addresses the assignment.",
  "detailedFeedback": {
    "summary": "Offline assessment produced without calling an evaluation service.",
    "strengths": ["Submission received", "Content is readable"],
    "weaknesses": ["Not reviewed by a model"],
    "recommendations": ["Run the assessment against a real provider"]
  },
  "scoreBreakdown": {"contentQuality": 70, "completeness": 70, "technicalAccuracy": 70, "structure": 70},
  "criteriaMet": [],
  "areasForImprovement": ["Not reviewed by a model"],
  "confidence": 0.5
}"#;

/// Offline client returning a fixed response.
#[derive(Debug, Default)]
pub struct FakeClient {
    fixed_response: Option<String>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<LlmResponse> {
        let text = self
            .fixed_response
            .clone()
            .unwrap_or_else(|| DEFAULT_FAKE_RESPONSE.to_string());

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: request.model.clone(),
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
