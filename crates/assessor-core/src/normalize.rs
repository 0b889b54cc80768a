//! Turns raw evaluation output into a storage-safe [`AssessmentResult`].

use serde_json::{Map, Value};

use crate::errors::{AssessError, FailureCategory};
use crate::model::{AssessmentResult, DetailedFeedback, Remark, ScoreBreakdown};
use crate::sanitize::sanitize;

const REQUIRED_FIELDS: [&str; 4] = ["remark", "feedback", "criteriaMet", "areasForImprovement"];

pub const DEFAULT_CONFIDENCE: f64 = 0.75;
pub const MIN_CONFIDENCE: f64 = 0.5;
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Normalize `raw`. Never fails: an unusable response becomes a degraded
/// result marked `normalization-fallback`.
pub fn normalize(raw: &str, model_used: &str, processing_time_ms: u64) -> AssessmentResult {
    match try_normalize(raw, model_used, processing_time_ms) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "evaluation response rejected");
            FailureCategory::Normalization.degraded_result(&e.to_string(), None, processing_time_ms)
        }
    }
}

/// Strict variant of [`normalize`] that reports why a response was rejected.
pub fn try_normalize(
    raw: &str,
    model_used: &str,
    processing_time_ms: u64,
) -> Result<AssessmentResult, AssessError> {
    let clean = sanitize(raw);
    let value = extract_json(&clean)?;
    let obj = value
        .as_object()
        .ok_or_else(|| AssessError::normalization("response is not a JSON object"))?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !obj.contains_key(**f)) {
        return Err(AssessError::normalization(format!(
            "missing required field '{}'",
            missing
        )));
    }

    let remark = coerce_remark(&obj["remark"]);
    let feedback = text_of(&obj["feedback"]);
    let criteria_met = string_list(&obj["criteriaMet"]);
    let areas_for_improvement = string_list(&obj["areasForImprovement"]);
    let detailed_feedback = detailed_feedback(obj.get("detailedFeedback"), &feedback, &areas_for_improvement);
    let score_breakdown = scores(obj.get("scoreBreakdown"));
    let confidence = obj
        .get("confidence")
        .and_then(number_of)
        .map(|c| c.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let result = AssessmentResult {
        remark,
        feedback,
        detailed_feedback,
        score_breakdown,
        criteria_met,
        areas_for_improvement,
        confidence,
        processing_time_ms,
        model_used: model_used.to_string(),
    };
    Ok(sanitize_result(result))
}

/// First JSON value starting at the first `{`; surrounding prose is ignored.
fn extract_json(text: &str) -> Result<Value, AssessError> {
    let start = text
        .find('{')
        .ok_or_else(|| AssessError::normalization("no JSON object found in response"))?;

    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| AssessError::normalization("no JSON object found in response"))?
        .map_err(|e| AssessError::normalization(format!("invalid JSON: {}", e)))
}

fn coerce_remark(value: &Value) -> Remark {
    match value.as_str() {
        Some(s) => Remark::parse_exact(s).unwrap_or_else(|| Remark::coerce(s)),
        None => Remark::NeedsImprovement,
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Strings of an array; anything else becomes empty.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|i| i.as_str())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn detailed_feedback(value: Option<&Value>, feedback: &str, areas: &[String]) -> DetailedFeedback {
    let Some(obj) = value.and_then(Value::as_object) else {
        return DetailedFeedback {
            summary: feedback.to_string(),
            strengths: Vec::new(),
            weaknesses: areas.to_vec(),
            recommendations: Vec::new(),
            comparison_to_example: None,
        };
    };

    let summary = obj
        .get("summary")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(feedback)
        .to_string();
    let weaknesses = match obj.get("weaknesses") {
        Some(v) => string_list(v),
        None => areas.to_vec(),
    };

    DetailedFeedback {
        summary,
        strengths: list_field(obj, "strengths"),
        weaknesses,
        recommendations: list_field(obj, "recommendations"),
        comparison_to_example: obj
            .get("comparisonToExample")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string),
    }
}

fn list_field(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key).map(string_list).unwrap_or_default()
}

fn scores(value: Option<&Value>) -> ScoreBreakdown {
    let Some(obj) = value.and_then(Value::as_object) else {
        return ScoreBreakdown::default();
    };
    let score = |key: &str| -> u8 {
        obj.get(key)
            .and_then(number_of)
            .map(|n| n.clamp(0.0, 100.0).round() as u8)
            .unwrap_or(0)
    };
    ScoreBreakdown {
        content_quality: score("contentQuality"),
        completeness: score("completeness"),
        technical_accuracy: score("technicalAccuracy"),
        structure: score("structure"),
    }
}

/// Numbers, or strings holding a number.
fn number_of(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn sanitize_result(mut result: AssessmentResult) -> AssessmentResult {
    let clean_all = |items: &mut Vec<String>| {
        for item in items.iter_mut() {
            *item = sanitize(item);
        }
    };

    result.feedback = sanitize(&result.feedback);
    result.detailed_feedback.summary = sanitize(&result.detailed_feedback.summary);
    clean_all(&mut result.detailed_feedback.strengths);
    clean_all(&mut result.detailed_feedback.weaknesses);
    clean_all(&mut result.detailed_feedback.recommendations);
    result.detailed_feedback.comparison_to_example = result
        .detailed_feedback
        .comparison_to_example
        .as_deref()
        .map(sanitize);
    clean_all(&mut result.criteria_met);
    clean_all(&mut result.areas_for_improvement);
    result.model_used = sanitize(&result.model_used);
    result
}
