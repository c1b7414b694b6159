use std::collections::{BTreeSet, HashSet};
use whatlang::detect;

use crate::classifier::{
    config::LanguageConfig,
    tokens::{sample, words},
    verdict::{LanguageDiagnostics, StageResult},
};

const MIN_CONFIDENCE: f64 = 0.25;
const MIN_GUESS_CHARS: usize = 50;
const MAX_REPORTED_MATCHES: usize = 50;

/// Require enough distinct reference words in the combined channel text.
pub fn check(text: &str, config: &LanguageConfig, sample_chars: usize) -> StageResult<LanguageDiagnostics> {
    let tokens = words(text);
    let reference: HashSet<String> = config
        .reference_words
        .iter()
        .flat_map(|w| words(w))
        .collect();

    let matched: BTreeSet<&str> = tokens
        .iter()
        .filter(|t| reference.contains(t.as_str()))
        .map(String::as_str)
        .collect();

    let min_required = config.min_distinct.required(tokens.len());
    let failure = (matched.len() < min_required).then(|| {
        format!(
            "{} distinct reference words found, {} required for {} tokens",
            matched.len(),
            min_required,
            tokens.len()
        )
    });

    StageResult {
        diagnostics: LanguageDiagnostics {
            passed: failure.is_none(),
            total_tokens: tokens.len(),
            hits_distinct: matched.len(),
            min_required,
            matched: matched
                .iter()
                .take(MAX_REPORTED_MATCHES)
                .map(|w| w.to_string())
                .collect(),
            detected_language: guess_language(text),
            sample: sample(text, sample_chars),
        },
        failure,
    }
}

/// ISO 639-3 code of the dominant language when whatlang is confident
/// enough. Reported only; never part of the verdict.
fn guess_language(text: &str) -> Option<String> {
    if text.trim().chars().count() < MIN_GUESS_CHARS {
        return None;
    }
    detect(text)
        .filter(|info| info.confidence() >= MIN_CONFIDENCE)
        .map(|info| info.lang().code().to_string())
}
