use assessor_core::{criteria_completion, AssessError, AssessmentEngine, AssessmentResult, RubricSpec};

use super::job::Job;
use super::runner_builder::{build_client, load_config};
use super::{AssessArgs, OutputFormat};
use crate::exit_codes::{COMPLETED, CONFIG_ERROR, DEGRADED};

pub async fn run(args: AssessArgs) -> anyhow::Result<i32> {
    let config = load_config(args.config.as_deref())?;
    let job = Job::load(&args.job)?;
    let client = build_client(args.provider)?;
    let engine = AssessmentEngine::new(&config, client)?;

    let result = match engine
        .assess(&args.actor, &job.submission, &job.rubric, &job.references)
        .await
    {
        Ok(result) => result,
        Err(e @ AssessError::AdmissionDenied { .. }) => {
            eprintln!("rejected: {}", e);
            return Ok(CONFIG_ERROR);
        }
        Err(e) => return Err(e.into()),
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print!("{}", render_text(&result, &job.rubric)),
    }

    Ok(if result.is_degraded() { DEGRADED } else { COMPLETED })
}

fn render_text(result: &AssessmentResult, rubric: &RubricSpec) -> String {
    let mut out = String::new();
    let met = result.criteria_met.len();
    let total = rubric.criteria.len();

    out.push_str(&format!("Remark:     {}\n", result.remark));
    out.push_str(&format!("Model:      {}\n", result.model_used));
    out.push_str(&format!("Confidence: {:.2}\n", result.confidence));
    if total > 0 {
        out.push_str(&format!(
            "Criteria:   {}/{} met ({}%)\n",
            met.min(total),
            total,
            criteria_completion(met, total)
        ));
    }
    let s = &result.score_breakdown;
    out.push_str(&format!(
        "Scores:     content {} | completeness {} | accuracy {} | structure {}\n",
        s.content_quality, s.completeness, s.technical_accuracy, s.structure
    ));
    out.push_str(&format!("\n{}\n", result.feedback));

    let lists = [
        ("Strengths", &result.detailed_feedback.strengths),
        ("Areas for improvement", &result.areas_for_improvement),
        ("Recommendations", &result.detailed_feedback.recommendations),
    ];
    for (title, items) in lists {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{}:\n", title));
        for item in items {
            out.push_str(&format!("  - {}\n", item));
        }
    }
    out
}
