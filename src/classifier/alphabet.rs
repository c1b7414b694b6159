use std::collections::BTreeSet;

use crate::classifier::{
    config::AlphabetConfig,
    tokens::sample,
    verdict::{AlphabetDiagnostics, FieldCharHits, StageResult},
};

/// Count distinct disallowed characters per field. Fields are never
/// concatenated: one foreign video title must not be diluted by, or
/// add up with, the rest of the channel.
pub fn check(
    fields: &[(String, &str)],
    config: &AlphabetConfig,
    sample_chars: usize,
) -> StageResult<AlphabetDiagnostics> {
    let hits: Vec<FieldCharHits> = fields
        .iter()
        .filter_map(|(name, text)| {
            let chars: BTreeSet<char> = text.chars().filter(|c| config.is_bad(*c)).collect();
            (!chars.is_empty()).then(|| FieldCharHits {
                field: name.clone(),
                distinct_count: chars.len(),
                chars: chars.into_iter().collect(),
                sample: sample(text, sample_chars),
            })
        })
        .collect();

    let failure = hits
        .iter()
        .find(|h| h.distinct_count > config.max_distinct_per_field)
        .map(|h| {
            format!(
                "field '{}' has {} distinct disallowed characters (max {})",
                h.field, h.distinct_count, config.max_distinct_per_field
            )
        });

    StageResult {
        diagnostics: AlphabetDiagnostics {
            passed: failure.is_none(),
            max_distinct_per_field: config.max_distinct_per_field,
            fields: hits,
        },
        failure,
    }
}
