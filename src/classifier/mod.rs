//! Rule-based channel classification.
//!
//! Stages run in the configured order and the first failing stage ends the
//! run. The verdict is a pure function of its inputs.

pub mod alphabet;
pub mod config;
pub mod language;
pub mod location;
pub mod tokens;
pub mod topic;
pub mod verdict;

pub use config::{
    AlphabetConfig, CharRange, ClassifierConfig, LanguageConfig, LocationConfig, MinDistinct,
    MissingCountryPolicy, Stage, TopicRule,
};
pub use verdict::{FilterVerdict, StageDiagnostics};

use crate::extractor::{ChannelInfo, VideoInfo};

pub fn classify(
    channel: &ChannelInfo,
    videos: &[VideoInfo],
    config: &ClassifierConfig,
) -> FilterVerdict {
    let mut diagnostics = StageDiagnostics::default();

    for &stage in &config.stage_order {
        if diagnostics.has_run(stage) {
            continue;
        }
        let failure = match stage {
            Stage::Location => {
                let result = location::check(channel.country.as_deref(), &config.location);
                diagnostics.location = Some(result.diagnostics);
                result.failure
            }
            Stage::Alphabet => {
                let result = alphabet::check(
                    &alphabet_fields(channel, videos),
                    &config.alphabet,
                    config.sample_chars,
                );
                diagnostics.alphabet = Some(result.diagnostics);
                result.failure
            }
            Stage::Language => {
                let result = language::check(
                    &combined_text(channel, videos),
                    &config.language,
                    config.sample_chars,
                );
                diagnostics.language = Some(result.diagnostics);
                result.failure
            }
            Stage::Topic => {
                let mut text = combined_text(channel, videos);
                for keyword in &channel.keywords {
                    text.push('\n');
                    text.push_str(keyword);
                }
                let result = topic::check(&text, &config.topics);
                diagnostics.topic = Some(result.diagnostics);
                result.failure
            }
        };

        if let Some(reason) = failure {
            return FilterVerdict {
                passed: false,
                failed_stage: Some(stage),
                reason: format!("{}: {}", stage.as_str(), reason),
                diagnostics,
            };
        }
    }

    FilterVerdict {
        passed: true,
        failed_stage: None,
        reason: "all stages passed".to_string(),
        diagnostics,
    }
}

fn alphabet_fields<'a>(channel: &'a ChannelInfo, videos: &'a [VideoInfo]) -> Vec<(String, &'a str)> {
    let mut fields = Vec::with_capacity(videos.len() + 2);
    if let Some(title) = channel.title.as_deref() {
        fields.push(("title".to_string(), title));
    }
    if let Some(description) = channel.description.as_deref() {
        fields.push(("description".to_string(), description));
    }
    for (i, video) in videos.iter().enumerate() {
        if let Some(title) = video.title.as_deref() {
            fields.push((format!("video[{i}]"), title));
        }
    }
    fields
}

/// Title, description and video titles, one per line.
fn combined_text(channel: &ChannelInfo, videos: &[VideoInfo]) -> String {
    channel
        .title
        .iter()
        .chain(channel.description.iter())
        .chain(videos.iter().filter_map(|v| v.title.as_ref()))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}
