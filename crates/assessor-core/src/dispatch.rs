//! Per-kind preprocessing, kept in one lookup table.

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{RubricSpec, SubmissionContext, SubmissionKind};
use crate::sanitize::sanitize;

type Preprocessor = fn(&str) -> String;

const PREPROCESSORS: [(SubmissionKind, Preprocessor); 5] = [
    (SubmissionKind::Text, clean_text),
    (SubmissionKind::Document, clean_document),
    (SubmissionKind::Repository, clean_repository_link),
    (SubmissionKind::Website, clean_website_link),
    (SubmissionKind::Screenshot, clean_text),
];

lazy_static! {
    static ref BLANK_RUN: Regex = Regex::new(r"\n[ \t]*(?:\n[ \t]*)+\n").unwrap();
}

fn preprocessor_for(kind: SubmissionKind) -> Preprocessor {
    PREPROCESSORS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, f)| *f)
        .unwrap_or(clean_text)
}

/// Normalize a submission before any other stage sees it.
///
/// Content goes through the kind's preprocessor; title, description and
/// custom instructions are sanitized.
pub fn preprocess(context: &SubmissionContext) -> SubmissionContext {
    let content = preprocessor_for(context.kind)(&context.content);
    SubmissionContext {
        content,
        kind: context.kind,
        question_title: sanitize(context.question_title.trim()),
        question_description: sanitize(context.question_description.trim()),
        custom_instructions: context
            .custom_instructions
            .as_deref()
            .map(sanitize)
            .filter(|s| !s.trim().is_empty()),
    }
}

fn clean_text(raw: &str) -> String {
    sanitize(raw.trim())
}

fn clean_document(raw: &str) -> String {
    let text = clean_text(raw).replace("\r\n", "\n");
    BLANK_RUN.replace_all(&text, "\n\n").into_owned()
}

fn clean_repository_link(raw: &str) -> String {
    let link = sanitize(raw.trim());
    let link = link.trim_end_matches('/');
    let link = link.strip_suffix(".git").unwrap_or(link);
    link.trim_end_matches('/').to_string()
}

fn clean_website_link(raw: &str) -> String {
    let link = sanitize(raw.trim());
    if link.is_empty() || link.contains("://") {
        link
    } else {
        format!("https://{}", link)
    }
}

/// Words that hint at what the assignment is about.
///
/// Lower-cased alphanumeric words longer than three characters, taken from
/// the title, description and rubric criteria, de-duplicated in first-seen
/// order.
pub fn assignment_keywords(context: &SubmissionContext, rubric: &RubricSpec) -> Vec<String> {
    let sources = [context.question_title.as_str(), context.question_description.as_str()]
        .into_iter()
        .chain(rubric.criteria.iter().map(String::as_str));

    let mut keywords: Vec<String> = Vec::new();
    for source in sources {
        for word in source.split(|c: char| !c.is_alphanumeric()) {
            if word.chars().count() <= 3 {
                continue;
            }
            let word = word.to_lowercase();
            if !keywords.contains(&word) {
                keywords.push(word);
            }
        }
    }
    keywords
}
