use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Media kind of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Text,
    Document,
    Repository,
    Website,
    Screenshot,
}

impl SubmissionKind {
    pub const ALL: [SubmissionKind; 5] = [
        SubmissionKind::Text,
        SubmissionKind::Document,
        SubmissionKind::Repository,
        SubmissionKind::Website,
        SubmissionKind::Screenshot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Document => "document",
            Self::Repository => "repository",
            Self::Website => "website",
            Self::Screenshot => "screenshot",
        }
    }

    /// Human-facing label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "Text Response",
            Self::Document => "Document",
            Self::Repository => "GitHub Repository",
            Self::Website => "Website",
            Self::Screenshot => "Screenshot",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "document" | "file" | "pdf" => Ok(Self::Document),
            "repository" | "repo" | "github" => Ok(Self::Repository),
            "website" | "url" | "site" => Ok(Self::Website),
            "screenshot" | "image" => Ok(Self::Screenshot),
            other => Err(format!("unknown submission kind '{}'", other)),
        }
    }
}

/// One incoming submission, as handed to the engine by the caller.
///
/// For [`SubmissionKind::Repository`] `content` is the repository link; for the
/// other kinds it is raw text or an already-extracted text rendition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionContext {
    pub content: String,
    pub kind: SubmissionKind,
    pub question_title: String,
    #[serde(default)]
    pub question_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

impl SubmissionContext {
    pub fn new(
        kind: SubmissionKind,
        content: impl Into<String>,
        question_title: impl Into<String>,
        question_description: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            kind,
            question_title: question_title.into(),
            question_description: question_description.into(),
            custom_instructions: None,
        }
    }

    pub fn with_custom_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.custom_instructions = if instructions.trim().is_empty() {
            None
        } else {
            Some(instructions)
        };
        self
    }

    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Instructor-authored grading specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RubricSpec {
    /// Must-have elements.
    pub criteria: Vec<String>,
    /// Automatic-deduction triggers.
    pub red_flags: Vec<String>,
    /// Conditional upgrades.
    pub bonus_checks: Vec<String>,
}

impl RubricSpec {
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty() && self.red_flags.is_empty() && self.bonus_checks.is_empty()
    }
}

/// Pre-authored exemplary submission used as a comparison anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceExample {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Four-valued categorical verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Remark {
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Can Improve")]
    CanImprove,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Remark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::CanImprove => "Can Improve",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }

    /// Map free text onto the closest remark. Total: unknown text becomes
    /// `Needs Improvement`.
    pub fn coerce(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        if lower.contains("excellent") {
            Self::Excellent
        } else if lower.contains("good") {
            Self::Good
        } else if lower.contains("can improve") || lower.contains("could improve") {
            Self::CanImprove
        } else {
            Self::NeedsImprovement
        }
    }

    /// Exact (case-insensitive) match against the four labels.
    pub fn parse_exact(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        [
            Self::Excellent,
            Self::Good,
            Self::CanImprove,
            Self::NeedsImprovement,
        ]
        .into_iter()
        .find(|r| r.as_str().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for Remark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedFeedback {
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_to_example: Option<String>,
}

/// Sub-scores, each in 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub content_quality: u8,
    pub completeness: u8,
    pub technical_accuracy: u8,
    pub structure: u8,
}

impl ScoreBreakdown {
    pub fn average(&self) -> f64 {
        (self.content_quality as f64
            + self.completeness as f64
            + self.technical_accuracy as f64
            + self.structure as f64)
            / 4.0
    }
}

/// Validated, storage-safe output of one assessment attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub remark: Remark,
    pub feedback: String,
    pub detailed_feedback: DetailedFeedback,
    pub score_breakdown: ScoreBreakdown,
    pub criteria_met: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    /// In [0.5, 1.0] for completed assessments; 0.1 for degraded ones.
    pub confidence: f64,
    pub processing_time_ms: u64,
    pub model_used: String,
}

impl AssessmentResult {
    /// Whether this result records a failed assessment rather than a verdict.
    pub fn is_degraded(&self) -> bool {
        crate::errors::is_error_marker(&self.model_used)
    }
}

/// Share of rubric criteria met, as a whole percentage.
///
/// Returns 0 when the rubric has no criteria; never exceeds 100.
pub fn criteria_completion(met: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (met.min(total) as f64 * 100.0 / total as f64).round();
    pct as u8
}
