use std::collections::BTreeSet;

use crate::classifier::{
    config::TopicRule,
    tokens::{contains_phrase, words},
    verdict::{StageResult, TopicDiagnostics, TopicRuleHits},
};

/// Every rule is evaluated so the diagnostics show all near-misses; the
/// first rule in configuration order that triggers names the failure.
pub fn check(text: &str, rules: &[TopicRule]) -> StageResult<TopicDiagnostics> {
    let tokens = words(text);

    let hits: Vec<TopicRuleHits> = rules
        .iter()
        .map(|rule| {
            let matched: BTreeSet<String> = rule
                .keywords
                .iter()
                .filter(|keyword| contains_phrase(&tokens, &words(keyword)))
                .map(|keyword| keyword.trim().to_lowercase())
                .collect();
            TopicRuleHits {
                name: rule.name.clone(),
                threshold: rule.threshold,
                hits_distinct: matched.len(),
                triggered: matched.len() >= rule.threshold,
                matched: matched.into_iter().collect(),
            }
        })
        .collect();

    let failure = hits.iter().find(|h| h.triggered).map(|h| {
        format!(
            "topic '{}' matched {} distinct keywords (threshold {}): {}",
            h.name,
            h.hits_distinct,
            h.threshold,
            h.matched.join(", ")
        )
    });

    StageResult {
        diagnostics: TopicDiagnostics {
            passed: failure.is_none(),
            rules: hits,
        },
        failure,
    }
}
