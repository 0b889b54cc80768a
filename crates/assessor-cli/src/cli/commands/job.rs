//! Job files: one submission with its rubric and reference examples.

use anyhow::Context;
use assessor_core::{ReferenceExample, RubricSpec, SubmissionContext};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub submission: SubmissionContext,
    #[serde(default)]
    pub rubric: RubricSpec,
    #[serde(default)]
    pub references: Vec<ReferenceExample>,
}

impl Job {
    /// Read a job file. JSON is valid YAML, so one parser covers both.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid job file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}
