//! Assessment orchestration engine.
//!
//! Takes a submission (text, document, repository link, website, or
//! screenshot description) plus an instructor rubric, asks an external
//! evaluation model for a verdict, and always returns a validated,
//! sanitized [`AssessmentResult`]. Only rate-limit rejection surfaces as an
//! error; content, invocation and parsing failures become degraded results
//! marked in `model_used`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use assessor_core::{
//!     AssessmentEngine, EngineConfig, RubricSpec, SubmissionContext, SubmissionKind,
//! };
//! use assessor_core::providers::llm::openai::{OpenAIClient, OpenAIConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EngineConfig::from_env();
//! let client = Arc::new(OpenAIClient::new(&OpenAIConfig::from_env())?);
//! let engine = AssessmentEngine::new(&config, client)?;
//!
//! let submission = SubmissionContext::new(
//!     SubmissionKind::Repository,
//!     "https://github.com/octo/calculator",
//!     "Build a calculator",
//!     "A CLI calculator with unit tests",
//! );
//! let result = engine
//!     .assess("student-42", &submission, &RubricSpec::default(), &[])
//!     .await?;
//! println!("{} ({})", result.remark, result.model_used);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod content;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod invoker;
pub mod model;
pub mod normalize;
pub mod prompt;
pub mod providers;
pub mod rate_limit;
pub mod reference;
pub mod sanitize;
pub mod tier;

pub use config::{ConfigError, EngineConfig};
pub use engine::{AssessmentEngine, PreparedAssessment};
pub use errors::{is_error_marker, AssessError, FailureCategory, InvokeError};
pub use invoker::{Invocation, Invoker, InvokerConfig};
pub use model::{
    criteria_completion, AssessmentResult, DetailedFeedback, ReferenceExample, Remark,
    RubricSpec, ScoreBreakdown, SubmissionContext, SubmissionKind,
};
pub use normalize::normalize;
pub use prompt::compile_prompt;
pub use rate_limit::{Clock, ManualClock, RateLimitConfig, RateLimiter, SystemClock};
pub use reference::select_reference;
pub use sanitize::sanitize;
pub use tier::{select_tier, ModelTiers, Tier};
