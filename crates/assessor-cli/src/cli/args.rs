use assessor_core::SubmissionKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "assessor",
    version,
    about = "Rubric-driven assessment of student submissions"
)]
pub struct Cli {
    /// Log output format (logs go to stderr)
    #[arg(
        long,
        global = true,
        value_enum,
        default_value = "text",
        env = "ASSESSOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Assess the submission described by a job file
    Assess(AssessArgs),
    /// Print the compiled prompt without calling the model
    Prompt(PromptArgs),
    /// Show which tier and model a submission would use
    Tier(TierArgs),
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

/// Evaluation provider
/// - openai: live calls to an OpenAI-compatible API (OPENAI_API_KEY)
/// - fake: deterministic offline verdict (tests/dev)
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    Openai,
    Fake,
}

#[derive(Parser, Debug, Clone)]
pub struct AssessArgs {
    /// Job file (YAML or JSON) with `submission`, `rubric` and `references`
    #[arg(long)]
    pub job: PathBuf,

    /// Actor the request is admitted for
    #[arg(long, default_value = "cli")]
    pub actor: String,

    #[arg(long, value_enum, default_value = "openai", env = "ASSESSOR_PROVIDER")]
    pub provider: ProviderKind,

    /// Engine config file; environment overrides still apply
    #[arg(long, env = "ASSESSOR_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug, Clone)]
pub struct PromptArgs {
    #[arg(long)]
    pub job: PathBuf,

    #[arg(long, env = "ASSESSOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not fetch repository content; the link is used as-is
    #[arg(long)]
    pub offline: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TierArgs {
    /// text, document, repository, website or screenshot
    #[arg(long)]
    pub kind: SubmissionKind,

    /// Content length in characters
    #[arg(long, default_value_t = 0)]
    pub length: usize,

    /// A reference example will be compared against
    #[arg(long)]
    pub with_reference: bool,

    #[arg(long, env = "ASSESSOR_CONFIG")]
    pub config: Option<PathBuf>,
}
