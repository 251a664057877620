use std::collections::BTreeSet;

use crate::models::{parse_quoted_list, Sentiment};

/// Collapse a row's raw sentiment tags into one overall label.
///
/// Fixed precedence, not a vote: a single distinct recognized value returns
/// itself; any disagreement containing "negative" is negative; otherwise any
/// "positive" is positive; everything else (empty, unknown-only, all-neutral)
/// is neutral.
pub fn resolve_from_tags(tags: &[String]) -> Sentiment {
    let distinct: BTreeSet<String> = tags.iter().map(|t| t.trim().to_lowercase()).collect();

    if distinct.len() == 1 {
        if let Some(only) = distinct.iter().next() {
            if let Some(s) = Sentiment::parse(only) {
                return s;
            }
        }
    }
    if distinct.contains("negative") {
        return Sentiment::Negative;
    }
    if distinct.contains("positive") {
        return Sentiment::Positive;
    }
    Sentiment::Neutral
}

/// Same resolution straight from the string-encoded list field.
pub fn resolve_overall(raw_list_text: &str) -> Sentiment {
    resolve_from_tags(&parse_quoted_list(raw_list_text))
}
