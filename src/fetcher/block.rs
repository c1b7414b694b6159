//! Detection of interstitial block and verification pages.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

const SNIPPET_RADIUS: usize = 80;

/// A named set of substrings that identify a block page on some hosts.
///
/// Patterns are compared case-insensitively. An empty `hosts` list applies the
/// marker to every host; otherwise the request host must equal an entry or be a
/// subdomain of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMarker {
    pub key: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub url_patterns: Vec<String>,
    #[serde(default)]
    pub body_patterns: Vec<String>,
}

impl BlockMarker {
    pub fn defaults() -> Vec<Self> {
        let hosts = vec!["youtube.com".to_string(), "google.com".to_string()];
        vec![
            Self {
                key: "sorry_redirect".to_string(),
                hosts: hosts.clone(),
                url_patterns: vec!["/sorry/index".to_string(), "/sorry?".to_string()],
                body_patterns: vec!["google.com/sorry/index".to_string()],
            },
            Self {
                key: "unusual_traffic".to_string(),
                hosts: hosts.clone(),
                url_patterns: Vec::new(),
                body_patterns: vec![
                    "our systems have detected unusual traffic".to_string(),
                    "unusual traffic from your computer network".to_string(),
                ],
            },
            Self {
                key: "captcha".to_string(),
                hosts: hosts.clone(),
                url_patterns: Vec::new(),
                body_patterns: vec![
                    "<script src=\"https://www.google.com/recaptcha/api.js".to_string(),
                    "id=\"captcha-form\"".to_string(),
                ],
            },
            Self {
                key: "not_a_bot".to_string(),
                hosts,
                url_patterns: Vec::new(),
                body_patterns: vec![
                    "confirm you're not a bot".to_string(),
                    "confirm you\u{2019}re not a bot".to_string(),
                    "sign in to confirm you're not a bot".to_string(),
                    "sign in to confirm you\u{2019}re not a bot".to_string(),
                ],
            },
        ]
    }

    fn applies_to(&self, host: &str) -> bool {
        self.hosts.is_empty()
            || self.hosts.iter().any(|h| {
                host.eq_ignore_ascii_case(h)
                    || host
                        .to_ascii_lowercase()
                        .ends_with(&format!(".{}", h.to_ascii_lowercase()))
            })
    }
}

/// A marker hit, with surrounding text for operator diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMatch {
    pub marker: String,
    pub snippet: String,
}

/// Scan the URL and the first `scan_bytes` of `body` for any applicable marker.
pub fn detect(
    markers: &[BlockMarker],
    host: &str,
    url: &str,
    body: &str,
    scan_bytes: usize,
) -> Option<BlockMatch> {
    let prefix = prefix_at_char_boundary(body, scan_bytes);

    for marker in markers.iter().filter(|m| m.applies_to(host)) {
        if marker.url_patterns.iter().any(|p| find_ignore_case(url, p).is_some()) {
            return Some(BlockMatch {
                marker: marker.key.clone(),
                snippet: url.to_string(),
            });
        }
        for pattern in &marker.body_patterns {
            if let Some((start, end)) = find_ignore_case(prefix, pattern) {
                return Some(BlockMatch {
                    marker: marker.key.clone(),
                    snippet: snippet_around(prefix, start, end),
                });
            }
        }
    }
    None
}

/// Byte span of the first case-insensitive occurrence of `pattern`.
fn find_ignore_case(haystack: &str, pattern: &str) -> Option<(usize, usize)> {
    if pattern.is_empty() {
        return None;
    }
    let re = RegexBuilder::new(&regex::escape(pattern))
        .case_insensitive(true)
        .build()
        .ok()?;
    re.find(haystack).map(|m| (m.start(), m.end()))
}

fn prefix_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn snippet_around(text: &str, start: usize, end: usize) -> String {
    let mut from = start.saturating_sub(SNIPPET_RADIUS);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + SNIPPET_RADIUS).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}
