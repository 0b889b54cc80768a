use std::sync::Arc;

use assessor_core::dispatch::preprocess;
use assessor_core::providers::llm::fake::FakeClient;
use assessor_core::{compile_prompt, select_reference, select_tier, AssessmentEngine};

use super::job::Job;
use super::runner_builder::load_config;
use super::PromptArgs;
use crate::exit_codes::COMPLETED;

pub async fn run(args: PromptArgs) -> anyhow::Result<i32> {
    let config = load_config(args.config.as_deref())?;
    let job = Job::load(&args.job)?;

    let (tier, model, prompt) = if args.offline {
        let context = preprocess(&job.submission);
        let reference = select_reference(context.kind, &job.references);
        let tier = select_tier(context.kind, context.content_len(), reference.is_some());
        let prompt = compile_prompt(&context, &job.rubric, reference, None);
        (tier, config.models.model_for(tier).to_string(), prompt)
    } else {
        // The model is never called here; the fake client only satisfies the engine.
        let engine = AssessmentEngine::new(&config, Arc::new(FakeClient::new()))?;
        let prepared = engine
            .prepare(&job.submission, &job.rubric, &job.references)
            .await?;
        (prepared.tier, prepared.model, prepared.prompt)
    };

    eprintln!("tier: {} ({})", tier, model);
    println!("{}", prompt);
    Ok(COMPLETED)
}
