use serde::{Deserialize, Serialize};

use crate::classifier::config::Stage;

/// Outcome of one classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterVerdict {
    pub passed: bool,
    /// `None` when every stage passed.
    pub failed_stage: Option<Stage>,
    pub reason: String,
    pub diagnostics: StageDiagnostics,
}

/// Diagnostics of the stages that ran; stages after a failure stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    pub location: Option<LocationDiagnostics>,
    pub alphabet: Option<AlphabetDiagnostics>,
    pub language: Option<LanguageDiagnostics>,
    pub topic: Option<TopicDiagnostics>,
}

impl StageDiagnostics {
    pub fn has_run(&self, stage: Stage) -> bool {
        match stage {
            Stage::Location => self.location.is_some(),
            Stage::Alphabet => self.alphabet.is_some(),
            Stage::Language => self.language.is_some(),
            Stage::Topic => self.topic.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDiagnostics {
    pub passed: bool,
    pub country: Option<String>,
    pub normalized: Option<String>,
    /// Allow-list entry that matched.
    pub matched: Option<String>,
    pub missing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphabetDiagnostics {
    pub passed: bool,
    pub max_distinct_per_field: usize,
    /// Fields with at least one disallowed character.
    pub fields: Vec<FieldCharHits>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCharHits {
    pub field: String,
    pub distinct_count: usize,
    /// Distinct disallowed characters, sorted.
    pub chars: Vec<char>,
    pub sample: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDiagnostics {
    pub passed: bool,
    pub total_tokens: usize,
    pub hits_distinct: usize,
    pub min_required: usize,
    /// Matched reference words, sorted.
    pub matched: Vec<String>,
    /// Informational guess; never part of the decision.
    pub detected_language: Option<String>,
    pub sample: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDiagnostics {
    pub passed: bool,
    pub rules: Vec<TopicRuleHits>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRuleHits {
    pub name: String,
    pub threshold: usize,
    pub hits_distinct: usize,
    pub matched: Vec<String>,
    pub triggered: bool,
}

/// A stage's diagnostics plus the failure reason, if it failed.
#[derive(Debug, Clone)]
pub struct StageResult<D> {
    pub diagnostics: D,
    pub failure: Option<String>,
}
