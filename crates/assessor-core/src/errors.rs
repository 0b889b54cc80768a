//! Failure taxonomy of the engine and the degraded results it recovers into.
//!
//! Only [`AssessError::AdmissionDenied`] reaches the caller as an error. The
//! other variants become an [`AssessmentResult`] whose `model_used` is one of
//! the markers below, so callers can persist and display something.

use std::time::Duration;

use crate::model::{AssessmentResult, DetailedFeedback, Remark, ScoreBreakdown, SubmissionKind};
use crate::sanitize::{sanitize, sanitize_error_message};
use crate::tier::Tier;

pub const MARKER_REPOSITORY: &str = "github-fallback";
pub const MARKER_CONTENT: &str = "content-fallback";
pub const MARKER_INVOCATION: &str = "error-handler";
pub const MARKER_NORMALIZATION: &str = "normalization-fallback";

pub const ERROR_MARKERS: [&str; 4] = [
    MARKER_REPOSITORY,
    MARKER_CONTENT,
    MARKER_INVOCATION,
    MARKER_NORMALIZATION,
];

/// Confidence stamped on every degraded result.
pub const DEGRADED_CONFIDENCE: f64 = 0.1;

/// Whether a stored `model_used` value marks a failed assessment.
pub fn is_error_marker(model_used: &str) -> bool {
    ERROR_MARKERS.contains(&model_used)
}

/// Failure of a single evaluation call, or of the call and its fallback.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("{tier} tier ({model}) timed out after {timeout_secs}s")]
    Timeout {
        tier: Tier,
        model: String,
        timeout_secs: u64,
    },

    #[error("{tier} tier ({model}) failed: {message}")]
    Provider {
        tier: Tier,
        model: String,
        message: String,
    },

    #[error("primary call failed ({primary}); fallback failed ({fallback})")]
    Exhausted {
        primary: Box<InvokeError>,
        fallback: Box<InvokeError>,
    },
}

impl InvokeError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Provider { .. } => false,
            Self::Exhausted { fallback, .. } => fallback.is_timeout(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssessError {
    #[error("rate limit exceeded for '{actor}': at most {limit} requests per {window_secs}s")]
    AdmissionDenied {
        actor: String,
        limit: usize,
        window_secs: u64,
        retry_after: Option<Duration>,
    },

    #[error("could not acquire {kind} content: {message}")]
    ContentAcquisition {
        kind: SubmissionKind,
        message: String,
        remediation: String,
    },

    #[error("evaluation call failed: {0}")]
    Invocation(#[from] InvokeError),

    #[error("response normalization failed: {message}")]
    Normalization { message: String },
}

/// Recoverable failure class; decides the marker and the degraded wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Repository content could not be fetched.
    RepositoryAcquisition,
    /// Any other submission content could not be read.
    ContentAcquisition,
    /// Both the selected tier and the light fallback failed.
    Invocation,
    /// The evaluation response could not be validated.
    Normalization,
}

impl FailureCategory {
    pub fn marker(&self) -> &'static str {
        match self {
            Self::RepositoryAcquisition => MARKER_REPOSITORY,
            Self::ContentAcquisition => MARKER_CONTENT,
            Self::Invocation => MARKER_INVOCATION,
            Self::Normalization => MARKER_NORMALIZATION,
        }
    }

    fn default_remediation(&self) -> &'static str {
        match self {
            Self::RepositoryAcquisition => "Verify the repository URL and visibility settings",
            Self::ContentAcquisition => "Resubmit the content in a readable format",
            Self::Invocation => "Resubmit later or ask an instructor for a manual review",
            Self::Normalization => "Request a re-assessment of this submission",
        }
    }

    fn explain(&self, detail: &str) -> String {
        match self {
            Self::RepositoryAcquisition => format!(
                "Content acquisition failure: the GitHub repository could not be accessed \
                 for automatic assessment ({}). Make sure the repository exists, is public, \
                 and the link points to it.",
                detail
            ),
            Self::ContentAcquisition => format!(
                "Content acquisition failure: the submission could not be read for automatic \
                 assessment ({}).",
                detail
            ),
            Self::Invocation => format!(
                "Invocation failure: the evaluation service did not return an assessment ({}). \
                 The submission was received and can be reviewed manually or re-assessed later.",
                detail
            ),
            Self::Normalization => format!(
                "Normalization failure: the evaluation service returned a result that could not \
                 be validated ({}). The submission was received and can be re-assessed.",
                detail
            ),
        }
    }

    /// Degraded result for this category.
    ///
    /// `detail` is sanitized and capped before it is embedded in the feedback.
    pub fn degraded_result(
        &self,
        detail: &str,
        remediation: Option<&str>,
        processing_time_ms: u64,
    ) -> AssessmentResult {
        let feedback = self.explain(&sanitize_error_message(detail));

        let mut areas = Vec::new();
        if let Some(hint) = remediation.map(sanitize).filter(|h| !h.trim().is_empty()) {
            areas.push(hint);
        }
        let fallback = self.default_remediation();
        if !areas.iter().any(|a| a == fallback) {
            areas.push(fallback.to_string());
        }

        AssessmentResult {
            remark: Remark::NeedsImprovement,
            detailed_feedback: DetailedFeedback {
                summary: feedback.clone(),
                strengths: Vec::new(),
                weaknesses: areas.clone(),
                recommendations: Vec::new(),
                comparison_to_example: None,
            },
            feedback,
            score_breakdown: ScoreBreakdown::default(),
            criteria_met: Vec::new(),
            areas_for_improvement: areas,
            confidence: DEGRADED_CONFIDENCE,
            processing_time_ms,
            model_used: self.marker().to_string(),
        }
    }
}

impl AssessError {
    pub fn normalization(message: impl Into<String>) -> Self {
        Self::Normalization {
            message: message.into(),
        }
    }

    /// Failure class, `None` for admission which is never recovered.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            Self::AdmissionDenied { .. } => None,
            Self::ContentAcquisition {
                kind: SubmissionKind::Repository,
                ..
            } => Some(FailureCategory::RepositoryAcquisition),
            Self::ContentAcquisition { .. } => Some(FailureCategory::ContentAcquisition),
            Self::Invocation(_) => Some(FailureCategory::Invocation),
            Self::Normalization { .. } => Some(FailureCategory::Normalization),
        }
    }

    /// Marker written to `model_used` for this failure.
    pub fn marker(&self) -> Option<&'static str> {
        self.category().map(|c| c.marker())
    }

    /// Build the degraded result for a recoverable failure.
    ///
    /// Returns `None` for [`AssessError::AdmissionDenied`], which is always
    /// surfaced to the caller instead.
    pub fn degraded_result(&self, processing_time_ms: u64) -> Option<AssessmentResult> {
        let category = self.category()?;
        let remediation = match self {
            Self::ContentAcquisition { remediation, .. } => Some(remediation.as_str()),
            _ => None,
        };
        Some(category.degraded_result(&self.to_string(), remediation, processing_time_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_failure_uses_github_marker() {
        let err = AssessError::ContentAcquisition {
            kind: SubmissionKind::Repository,
            message: "repository not found: octo/private".into(),
            remediation: "Make the repository public".into(),
        };
        let result = err.degraded_result(42).unwrap();
        assert_eq!(result.model_used, MARKER_REPOSITORY);
        assert_eq!(result.remark, Remark::NeedsImprovement);
        assert_eq!(result.confidence, DEGRADED_CONFIDENCE);
        assert!(result.criteria_met.is_empty());
        assert!(!result.areas_for_improvement.is_empty());
        assert!(result.feedback.contains("Content acquisition failure"));
        assert!(result.is_degraded());
        assert_eq!(result.processing_time_ms, 42);
    }

    #[test]
    fn invocation_failure_uses_error_handler_marker() {
        let err = AssessError::from(InvokeError::Timeout {
            tier: Tier::Light,
            model: "m".into(),
            timeout_secs: 30,
        });
        let result = err.degraded_result(0).unwrap();
        assert_eq!(result.model_used, MARKER_INVOCATION);
        assert!(result.feedback.contains("Invocation failure"));
        assert!(result.feedback.contains("timed out"));
    }

    #[test]
    fn admission_has_no_degraded_result() {
        let err = AssessError::AdmissionDenied {
            actor: "a".into(),
            limit: 10,
            window_secs: 60,
            retry_after: None,
        };
        assert!(err.marker().is_none());
        assert!(err.degraded_result(0).is_none());
    }

    #[test]
    fn degraded_feedback_is_sanitized() {
        let err = AssessError::normalization("bad byte \u{0000} here");
        let result = err.degraded_result(0).unwrap();
        assert!(!result.feedback.contains('\u{0000}'));
        assert_eq!(result.model_used, MARKER_NORMALIZATION);
    }

    #[test]
    fn content_failure_keeps_caller_remediation_first() {
        let err = AssessError::ContentAcquisition {
            kind: SubmissionKind::Website,
            message: "connection refused".into(),
            remediation: "Check that the site is online".into(),
        };
        let result = err.degraded_result(0).unwrap();
        assert_eq!(result.model_used, MARKER_CONTENT);
        assert_eq!(result.areas_for_improvement[0], "Check that the site is online");
        assert_eq!(result.detailed_feedback.weaknesses, result.areas_for_improvement);
    }

    #[test]
    fn marker_detection() {
        assert!(is_error_marker("github-fallback"));
        assert!(!is_error_marker("gpt-4o-mini"));
    }
}
