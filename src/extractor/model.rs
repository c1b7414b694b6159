use serde::{Deserialize, Serialize};

/// Channel metadata pulled from a channel page.
///
/// Only `id` makes a record stable: downstream storage dedupes on it, so a
/// record without one must be treated as unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub handle: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub keywords: Vec<String>,
    pub subscriber_count_text: Option<String>,
    pub avatar_url: Option<String>,
    pub is_family_safe: Option<bool>,
    /// Built from `<meta>` tags because the page carried no embedded state.
    #[serde(default)]
    pub from_meta_fallback: bool,
}

impl ChannelInfo {
    pub fn is_stable(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// One entry of a channel's video listing, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: Option<String>,
    pub url: String,
    pub published_text: Option<String>,
    pub views_text: Option<String>,
    pub duration_text: Option<String>,
    pub description: Option<String>,
}

static SPACE_REGEX: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"[ \t]+").unwrap());

static NEWLINE_REGEX: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"\n\s*\n+").unwrap());

/// Collapse runs of spaces and blank lines, keeping paragraph breaks.
pub fn normalize_whitespace(text: &str) -> String {
    let spaced = SPACE_REGEX.replace_all(text.trim(), " ");
    NEWLINE_REGEX.replace_all(&spaced, "\n\n").to_string()
}
