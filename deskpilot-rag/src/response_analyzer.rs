//! Response analysis: citation extraction and the confidence heuristic

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// `Article #<id>` or `Article ID: <id>`
static CITATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Article (?:#|ID: )([A-Za-z0-9_-]+)").expect("citation pattern is valid")
});

/// The exact citation form requested in the prompt
static WELL_FORMED_CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(Article ID: [A-Za-z0-9_-]+\)").expect("citation pattern is valid")
});

static EMPATHY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)empathy|understanding|patience").expect("empathy pattern is valid")
});

/// Result of analyzing a completion
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseAnalysis {
    pub used_articles: BTreeSet<String>,
    pub confidence: f32,
}

/// Ids cited in `text`, deduplicated
pub fn extract_cited_articles(text: &str) -> BTreeSet<String> {
    CITATION_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Additive score over length and content, in tenths, clamped to [0, 1].
/// Not a calibrated probability.
///
/// Length is counted in Unicode scalar values (`char`s), not bytes, so a
/// reply in a non-Latin script is measured the same way as an English one.
pub fn confidence_score(text: &str) -> f32 {
    let length = text.chars().count();
    let mut tenths: u32 = 7;

    if length > 50 {
        tenths += 1;
    }
    if length > 500 {
        tenths += 1;
    }
    if EMPATHY_PATTERN.is_match(text) {
        tenths += 1;
    }
    if WELL_FORMED_CITATION.is_match(text) {
        tenths += 1;
    }

    (tenths as f32 / 10.0).clamp(0.0, 1.0)
}

/// Analyze a raw completion. `force_empty_results` discards all citations.
pub fn analyze_response(text: &str, force_empty_results: bool) -> ResponseAnalysis {
    let used_articles = if force_empty_results {
        BTreeSet::new()
    } else {
        extract_cited_articles(text)
    };

    ResponseAnalysis {
        used_articles,
        confidence: confidence_score(text),
    }
}
