use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::SubmissionKind;

/// Quality/cost level of the evaluation capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Light,
    Balanced,
    Heavy,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Balanced => "balanced",
            Self::Heavy => "heavy",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick a tier. Rules are checked in order and the first match wins:
///
/// 1. short text (< 500 chars) -> Light
/// 2. repository, website, long content (> 5000) or a reference example -> Heavy
/// 3. document, screenshot or content > 1000 -> Balanced
/// 4. otherwise Light
pub fn select_tier(kind: SubmissionKind, content_length: usize, has_reference_example: bool) -> Tier {
    use SubmissionKind::*;

    if kind == Text && content_length < 500 {
        return Tier::Light;
    }
    if matches!(kind, Repository | Website) || content_length > 5000 || has_reference_example {
        return Tier::Heavy;
    }
    if matches!(kind, Document | Screenshot) || content_length > 1000 {
        return Tier::Balanced;
    }
    Tier::Light
}

/// Model identifier per tier.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelTiers {
    pub light: String,
    pub balanced: String,
    pub heavy: String,
}

impl Default for ModelTiers {
    fn default() -> Self {
        Self {
            light: "gpt-4o-mini".to_string(),
            balanced: "gpt-4o".to_string(),
            heavy: "gpt-4.1".to_string(),
        }
    }
}

impl ModelTiers {
    pub fn model_for(&self, tier: Tier) -> &str {
        match tier {
            Tier::Light => &self.light,
            Tier::Balanced => &self.balanced,
            Tier::Heavy => &self.heavy,
        }
    }
}
