//! Rule-set configuration for the classifier.
//!
//! Every list here is edited over time by operators, so all of it
//! deserializes from the settings file with defaults for anything omitted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The classifier stages, in their default order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Location,
    Alphabet,
    Language,
    Topic,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Location, Stage::Alphabet, Stage::Language, Stage::Topic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Location => "location",
            Stage::Alphabet => "alphabet",
            Stage::Language => "language",
            Stage::Topic => "topic",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct InvalidRule {
    pub field: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub stage_order: Vec<Stage>,
    pub location: LocationConfig,
    pub alphabet: AlphabetConfig,
    pub language: LanguageConfig,
    pub topics: Vec<TopicRule>,
    /// Length cap, in characters, of text samples in diagnostics.
    pub sample_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            stage_order: Stage::ALL.to_vec(),
            location: LocationConfig::default(),
            alphabet: AlphabetConfig::default(),
            language: LanguageConfig::default(),
            topics: TopicRule::defaults(),
            sample_chars: 120,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), InvalidRule> {
        for (i, stage) in self.stage_order.iter().enumerate() {
            if self.stage_order[..i].contains(stage) {
                return Err(InvalidRule {
                    field: "stage_order",
                    reason: format!("stage '{}' listed twice", stage.as_str()),
                });
            }
        }
        if let MinDistinct::Dynamic {
            base,
            cap,
            words_per_match,
        } = self.language.min_distinct
        {
            if base > cap {
                return Err(InvalidRule {
                    field: "language.min_distinct",
                    reason: format!("base {base} exceeds cap {cap}"),
                });
            }
            if words_per_match == 0 {
                return Err(InvalidRule {
                    field: "language.min_distinct.words_per_match",
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        for range in &self.alphabet.bad_ranges {
            if range.start > range.end {
                return Err(InvalidRule {
                    field: "alphabet.bad_ranges",
                    reason: format!("range {:?}..{:?} is reversed", range.start, range.end),
                });
            }
        }
        for rule in &self.topics {
            if rule.threshold == 0 {
                return Err(InvalidRule {
                    field: "topics.threshold",
                    reason: format!("rule '{}' would reject every channel", rule.name),
                });
            }
        }
        Ok(())
    }
}

/// What to do when a channel states no country at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCountryPolicy {
    /// Fail the location stage.
    Reject,
    /// Pass the location stage and let the content stages decide.
    #[default]
    Defer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub allowed_countries: Vec<String>,
    pub missing_country: MissingCountryPolicy,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            allowed_countries: [
                "germany",
                "deutschland",
                "de",
                "deu",
                "austria",
                "österreich",
                "oesterreich",
                "at",
                "aut",
                "switzerland",
                "schweiz",
                "suisse",
                "svizzera",
                "ch",
                "che",
            ]
            .map(String::from)
            .to_vec(),
            missing_country: MissingCountryPolicy::default(),
        }
    }
}

/// Inclusive range of characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharRange {
    pub start: char,
    pub end: char,
}

impl CharRange {
    const fn new(start: char, end: char) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, c: char) -> bool {
        (self.start..=self.end).contains(&c)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphabetConfig {
    /// Individual disallowed characters.
    pub bad_chars: String,
    pub bad_ranges: Vec<CharRange>,
    /// A field fails when its distinct disallowed characters exceed this.
    pub max_distinct_per_field: usize,
}

impl AlphabetConfig {
    pub fn is_bad(&self, c: char) -> bool {
        self.bad_chars.contains(c) || self.bad_ranges.iter().any(|r| r.contains(c))
    }
}

impl Default for AlphabetConfig {
    fn default() -> Self {
        Self {
            bad_chars: String::new(),
            bad_ranges: vec![
                CharRange::new('\u{0370}', '\u{03FF}'), // Greek
                CharRange::new('\u{0400}', '\u{04FF}'), // Cyrillic
                CharRange::new('\u{0590}', '\u{05FF}'), // Hebrew
                CharRange::new('\u{0600}', '\u{06FF}'), // Arabic
                CharRange::new('\u{0900}', '\u{097F}'), // Devanagari
                CharRange::new('\u{0980}', '\u{09FF}'), // Bengali
                CharRange::new('\u{0E00}', '\u{0E7F}'), // Thai
                CharRange::new('\u{1100}', '\u{11FF}'), // Hangul Jamo
                CharRange::new('\u{3040}', '\u{30FF}'), // Hiragana, Katakana
                CharRange::new('\u{4E00}', '\u{9FFF}'), // CJK
                CharRange::new('\u{AC00}', '\u{D7AF}'), // Hangul syllables
            ],
            max_distinct_per_field: 3,
        }
    }
}

/// Minimum number of distinct reference words the channel text must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MinDistinct {
    Fixed {
        min: usize,
    },
    /// `ceil(tokens / words_per_match)` bounded to `base..=cap`.
    Dynamic {
        base: usize,
        cap: usize,
        words_per_match: usize,
    },
}

impl MinDistinct {
    pub fn required(&self, total_tokens: usize) -> usize {
        match *self {
            MinDistinct::Fixed { min } => min,
            MinDistinct::Dynamic {
                base,
                cap,
                words_per_match,
            } => total_tokens
                .div_ceil(words_per_match.max(1))
                .min(cap)
                .max(base),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub reference_words: Vec<String>,
    pub min_distinct: MinDistinct,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            reference_words: DEFAULT_GERMAN_WORDS.iter().map(|w| w.to_string()).collect(),
            min_distinct: MinDistinct::Dynamic {
                base: 3,
                cap: 12,
                words_per_match: 40,
            },
        }
    }
}

const DEFAULT_GERMAN_WORDS: &[&str] = &[
    "und", "der", "die", "das", "ist", "nicht", "ich", "wir", "ihr", "sie", "du", "es", "ein",
    "eine", "einen", "einem", "einer", "mit", "für", "auf", "aus", "bei", "von", "zum", "zur",
    "auch", "noch", "nur", "schon", "oder", "aber", "wenn", "weil", "dass", "sind", "bin", "hat",
    "haben", "wird", "werden", "kann", "können", "mehr", "sehr", "heute", "hier", "jetzt", "immer",
    "alle", "unser", "unsere", "euch", "mein", "meine", "dein", "deine", "über", "unter", "nach",
    "vor", "wie", "was", "wer", "warum", "neue", "neuen", "kanal", "danke", "bitte", "folge",
    "teil", "mal", "viel", "ganz", "gibt", "geht", "machen", "zeigen", "willkommen", "abonnieren",
];

/// A negative topic: reaching `threshold` distinct keywords rejects the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub threshold: usize,
}

impl TopicRule {
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                name: "kids".to_string(),
                keywords: [
                    "kinder", "kinderlieder", "kids", "kinderfilme", "spielzeug", "toys", "baby",
                    "nursery rhymes", "cartoon", "zeichentrick", "kita", "kindergarten",
                    "für kinder", "surprise eggs", "überraschungseier",
                ]
                .map(String::from)
                .to_vec(),
                threshold: 2,
            },
            Self {
                name: "gaming".to_string(),
                keywords: [
                    "gaming", "gameplay", "let's play", "lets play", "minecraft", "fortnite",
                    "roblox", "gta", "twitch", "zocken", "walkthrough", "speedrun", "esports",
                    "playthrough",
                ]
                .map(String::from)
                .to_vec(),
                threshold: 2,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_threshold_is_bounded() {
        let min = MinDistinct::Dynamic {
            base: 3,
            cap: 10,
            words_per_match: 20,
        };
        assert_eq!(min.required(0), 3);
        assert_eq!(min.required(41), 3);
        assert_eq!(min.required(120), 6);
        assert_eq!(min.required(121), 7);
        assert_eq!(min.required(100_000), 10);
        assert_eq!(MinDistinct::Fixed { min: 4 }.required(100_000), 4);
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ClassifierConfig::default().validate(), Ok(()));
    }

    #[test]
    fn duplicate_stage_is_rejected() {
        let config = ClassifierConfig {
            stage_order: vec![Stage::Topic, Stage::Location, Stage::Topic],
            ..ClassifierConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "stage_order");
    }

    #[test]
    fn inverted_dynamic_bounds_are_rejected() {
        let mut config = ClassifierConfig::default();
        config.language.min_distinct = MinDistinct::Dynamic {
            base: 9,
            cap: 2,
            words_per_match: 10,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_from_settings_document() {
        let config: ClassifierConfig = serde_json::from_str(
            r#"{
                "stage_order": ["language", "location"],
                "location": {"missing_country": "reject"},
                "alphabet": {"bad_chars": "ж", "bad_ranges": [], "max_distinct_per_field": 1},
                "language": {"reference_words": ["und"], "min_distinct": {"mode": "fixed", "min": 1}},
                "topics": [{"name": "sport", "keywords": ["fußball"], "threshold": 1}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.stage_order, vec![Stage::Language, Stage::Location]);
        assert_eq!(config.location.missing_country, MissingCountryPolicy::Reject);
        assert!(!config.location.allowed_countries.is_empty());
        assert!(config.alphabet.is_bad('ж'));
        assert!(!config.alphabet.is_bad('я'));
        assert_eq!(config.language.min_distinct, MinDistinct::Fixed { min: 1 });
        assert_eq!(config.topics[0].name, "sport");
        assert_eq!(config.sample_chars, 120);
    }
}
