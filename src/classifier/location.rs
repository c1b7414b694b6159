use crate::classifier::{
    config::{LocationConfig, MissingCountryPolicy},
    tokens::{contains_phrase, words},
    verdict::{LocationDiagnostics, StageResult},
};

/// Pass when the country equals an allow-list entry or contains one as a
/// whole token sequence ("Berlin, Germany" matches "germany"). Two- and
/// three-letter codes only match the whole value.
pub fn check(country: Option<&str>, config: &LocationConfig) -> StageResult<LocationDiagnostics> {
    let normalized = country
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty());

    let Some(normalized) = normalized else {
        let failure = match config.missing_country {
            MissingCountryPolicy::Reject => Some("no country given".to_string()),
            MissingCountryPolicy::Defer => None,
        };
        return StageResult {
            diagnostics: LocationDiagnostics {
                passed: failure.is_none(),
                country: country.map(str::to_string),
                normalized: None,
                matched: None,
                missing: true,
            },
            failure,
        };
    };

    let tokens = words(&normalized);
    let matched = config
        .allowed_countries
        .iter()
        .map(|entry| entry.trim().to_lowercase())
        .find(|entry| {
            *entry == normalized || (!is_code(entry) && contains_phrase(&tokens, &words(entry)))
        });

    let failure = matched.is_none().then(|| {
        format!(
            "country '{}' is not in the allow-list",
            country.unwrap_or_default().trim()
        )
    });

    StageResult {
        diagnostics: LocationDiagnostics {
            passed: failure.is_none(),
            country: country.map(str::to_string),
            normalized: Some(normalized),
            matched,
            missing: false,
        },
        failure,
    }
}

fn is_code(entry: &str) -> bool {
    entry.len() <= 3 && entry.bytes().all(|b| b.is_ascii_alphabetic())
}
