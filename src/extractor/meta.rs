//! Fallback channel metadata from `<meta>` tags, for pages served without
//! embedded state.

use scraper::{Html, Selector};

use crate::extractor::model::ChannelInfo;

pub fn extract_meta_fallback(html: &str) -> Option<ChannelInfo> {
    let document = Html::parse_document(html);

    let info = ChannelInfo {
        id: meta_content(&document, "meta[itemprop='identifier']")
            .or_else(|| meta_content(&document, "meta[itemprop='channelId']")),
        title: meta_content(&document, "meta[property='og:title']")
            .or_else(|| title_text(&document)),
        url: meta_content(&document, "meta[property='og:url']")
            .or_else(|| link_href(&document, "link[rel='canonical']")),
        description: meta_content(&document, "meta[property='og:description']")
            .or_else(|| meta_content(&document, "meta[name='description']")),
        avatar_url: meta_content(&document, "meta[property='og:image']"),
        is_family_safe: meta_content(&document, "meta[itemprop='isFamilyFriendly']")
            .map(|v| v.eq_ignore_ascii_case("true")),
        from_meta_fallback: true,
        ..ChannelInfo::default()
    };

    (info.id.is_some() || info.title.is_some()).then_some(info)
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    attr(document, selector, "content")
}

fn link_href(document: &Html, selector: &str) -> Option<String> {
    attr(document, selector, "href")
}

fn attr(document: &Html, selector: &str, name: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn title_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?.text().collect::<String>();
    let title = title.trim();
    let title = title.strip_suffix(" - YouTube").unwrap_or(title).trim();
    (!title.is_empty()).then(|| title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_open_graph_tags() {
        let html = r#"<html><head>
            <title>Kanal - YouTube</title>
            <meta property="og:title" content="Mein Kanal">
            <meta property="og:url" content="https://www.youtube.com/channel/UC1">
            <meta property="og:description" content="Videos über Gartenarbeit">
            <meta property="og:image" content="https://yt3.example/avatar.jpg">
            <meta itemprop="identifier" content="UC1">
            <meta itemprop="isFamilyFriendly" content="True">
        </head></html>"#;

        let info = extract_meta_fallback(html).unwrap();
        assert_eq!(info.id.as_deref(), Some("UC1"));
        assert_eq!(info.title.as_deref(), Some("Mein Kanal"));
        assert_eq!(info.description.as_deref(), Some("Videos über Gartenarbeit"));
        assert_eq!(info.is_family_safe, Some(true));
        assert!(info.from_meta_fallback);
        assert_eq!(info.country, None);
    }

    #[test]
    fn title_tag_used_when_og_missing() {
        let html = "<html><head><title>Nur Titel - YouTube</title></head></html>";
        let info = extract_meta_fallback(html).unwrap();
        assert_eq!(info.title.as_deref(), Some("Nur Titel"));
        assert_eq!(info.id, None);
    }

    #[test]
    fn nothing_usable_is_none() {
        assert!(extract_meta_fallback("<html><body>leer</body></html>").is_none());
    }
}
