use crate::model::{ReferenceExample, SubmissionKind};

/// Metadata keys that mark a reference example as describing `kind`.
pub fn kind_metadata_keys(kind: SubmissionKind) -> &'static [&'static str] {
    match kind {
        SubmissionKind::Repository => &["structure", "features", "languages", "files", "tech_stack"],
        SubmissionKind::Document => &["length", "word_count", "topics", "sections"],
        SubmissionKind::Website => &["pages", "features", "tech_stack", "url"],
        SubmissionKind::Screenshot => &["elements", "layout", "visual"],
        SubmissionKind::Text => &["length", "topics", "key_points"],
    }
}

/// Pick the reference example to compare a submission of `kind` against.
///
/// Fallback chain, first hit wins:
/// 1. first example carrying any metadata key specific to `kind`
/// 2. first example with any metadata at all
/// 3. earliest `created_at` (undated examples last, ties keep input order)
pub fn select_reference(
    kind: SubmissionKind,
    candidates: &[ReferenceExample],
) -> Option<&ReferenceExample> {
    let keys = kind_metadata_keys(kind);

    candidates
        .iter()
        .find(|r| keys.iter().any(|k| has_value(r, k)))
        .or_else(|| candidates.iter().find(|r| !r.metadata.is_empty()))
        .or_else(|| {
            candidates
                .iter()
                .min_by_key(|r| (r.created_at.is_none(), r.created_at))
        })
}

fn has_value(reference: &ReferenceExample, key: &str) -> bool {
    reference
        .metadata
        .get(key)
        .is_some_and(|v| !v.is_null())
}
