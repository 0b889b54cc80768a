//! The assessment pipeline.
//!
//! Admission, preprocessing, content acquisition, tier selection, prompt
//! compilation, invocation and normalization, in that order. Admission is
//! the only stage whose failure reaches the caller as an error.

use std::sync::Arc;
use std::time::Instant;
use tracing::{field, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{ConfigError, EngineConfig};
use crate::content::{HostedRepositories, RepositorySource};
use crate::dispatch::{assignment_keywords, preprocess};
use crate::errors::AssessError;
use crate::invoker::Invoker;
use crate::model::{
    criteria_completion, AssessmentResult, ReferenceExample, RubricSpec, SubmissionContext,
    SubmissionKind,
};
use crate::normalize::normalize;
use crate::prompt::compile_prompt;
use crate::providers::llm::LlmClient;
use crate::rate_limit::RateLimiter;
use crate::reference::select_reference;
use crate::tier::{select_tier, Tier};

/// Everything needed to call the evaluation capability.
#[derive(Debug, Clone)]
pub struct PreparedAssessment {
    pub context: SubmissionContext,
    pub tier: Tier,
    pub model: String,
    pub prompt: String,
    pub reference_title: Option<String>,
}

pub struct AssessmentEngine {
    limiter: Arc<RateLimiter>,
    invoker: Invoker,
    repositories: Option<Arc<dyn RepositorySource>>,
}

impl AssessmentEngine {
    /// Engine wired from config, with hosted repository access.
    pub fn new(config: &EngineConfig, client: Arc<dyn LlmClient>) -> Result<Self, ConfigError> {
        let repositories = HostedRepositories::new(config.repo.clone())
            .map_err(|e| ConfigError::Invalid(format!("repository client: {}", e)))?;
        Ok(Self::from_parts(
            Arc::new(RateLimiter::new(&config.rate_limit)),
            Invoker::new(client, config.models.clone(), config.invoker.clone()),
        )
        .with_repository_source(Arc::new(repositories)))
    }

    /// Engine without repository access; repository submissions degrade.
    pub fn from_parts(limiter: Arc<RateLimiter>, invoker: Invoker) -> Self {
        Self {
            limiter,
            invoker,
            repositories: None,
        }
    }

    pub fn with_repository_source(mut self, source: Arc<dyn RepositorySource>) -> Self {
        self.repositories = Some(source);
        self
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Assess one submission on behalf of `actor`.
    ///
    /// Returns `Err` only for [`AssessError::AdmissionDenied`]; every later
    /// failure is recovered into a degraded result.
    pub async fn assess(
        &self,
        actor: &str,
        context: &SubmissionContext,
        rubric: &RubricSpec,
        references: &[ReferenceExample],
    ) -> Result<AssessmentResult, AssessError> {
        let started = Instant::now();

        if let Err(e) = self.limiter.try_acquire(actor) {
            warn!(actor, kind = %context.kind, "assessment rejected: {}", e);
            return Err(e);
        }

        let span = info_span!(
            "assessment",
            assessment_id = %Uuid::new_v4(),
            kind = %context.kind,
            tier = field::Empty
        );

        async move {
            let prepared = match self.prepare(context, rubric, references).await {
                Ok(prepared) => prepared,
                Err(e) => return degrade(e, started),
            };
            tracing::Span::current().record("tier", prepared.tier.as_str());

            let invocation = match self.invoker.invoke(&prepared.prompt, prepared.tier).await {
                Ok(invocation) => invocation,
                Err(e) => return degrade(e.into(), started),
            };

            let result = normalize(&invocation.text, &invocation.model, elapsed_ms(started));
            info!(
                remark = %result.remark,
                model = %result.model_used,
                fell_back = invocation.fell_back,
                degraded = result.is_degraded(),
                criteria_completion = criteria_completion(result.criteria_met.len(), rubric.criteria.len()),
                elapsed_ms = result.processing_time_ms,
                "assessment finished"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Run every stage up to (not including) the evaluation call.
    ///
    /// Does not consume rate-limit budget.
    pub async fn prepare(
        &self,
        context: &SubmissionContext,
        rubric: &RubricSpec,
        references: &[ReferenceExample],
    ) -> Result<PreparedAssessment, AssessError> {
        let context = preprocess(context);
        let reference = select_reference(context.kind, references);

        let digest = match context.kind {
            SubmissionKind::Repository => {
                let keywords = assignment_keywords(&context, rubric);
                Some(self.repository_digest(&context.content, &keywords).await?)
            }
            kind if context.content.trim().is_empty() => {
                return Err(AssessError::ContentAcquisition {
                    kind,
                    message: "submission content is empty".to_string(),
                    remediation: "Resubmit with the content included".to_string(),
                });
            }
            _ => None,
        };

        let tier = select_tier(context.kind, context.content_len(), reference.is_some());
        let prompt = compile_prompt(&context, rubric, reference, digest.as_deref());

        Ok(PreparedAssessment {
            model: self.invoker.tiers().model_for(tier).to_string(),
            reference_title: reference.map(|r| r.title.clone()),
            context,
            tier,
            prompt,
        })
    }

    async fn repository_digest(&self, link: &str, keywords: &[String]) -> Result<String, AssessError> {
        let source = self
            .repositories
            .as_ref()
            .ok_or_else(|| AssessError::ContentAcquisition {
                kind: SubmissionKind::Repository,
                message: "repository access is not configured".to_string(),
                remediation: "Ask an instructor to review this repository manually".to_string(),
            })?;

        source
            .digest(link, keywords)
            .await
            .map_err(|e| AssessError::ContentAcquisition {
                kind: SubmissionKind::Repository,
                remediation: e.remediation().to_string(),
                message: e.to_string(),
            })
    }
}

fn degrade(error: AssessError, started: Instant) -> Result<AssessmentResult, AssessError> {
    warn!(error = %error, "assessment degraded");
    match error.degraded_result(elapsed_ms(started)) {
        Some(result) => Ok(result),
        None => Err(error),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
