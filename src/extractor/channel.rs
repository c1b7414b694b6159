use serde_json::Value;
use std::collections::HashSet;

use crate::extractor::{
    errors::ExtractError,
    model::{ChannelInfo, normalize_whitespace},
    text::{str_at, text_at, text_of},
};

const METADATA: &str = "/metadata/channelMetadataRenderer";
const C4_HEADER: &str = "/header/c4TabbedHeaderRenderer";
const MICROFORMAT: &str = "/microformat/microformatDataRenderer";

/// Containers whose `country` field holds the channel location in the
/// various about-page layouts.
const COUNTRY_CONTAINERS: &[&str] = &["aboutChannelViewModel", "channelAboutFullMetadataRenderer"];

/// Build a [`ChannelInfo`] from a parsed embedded state object.
///
/// Only a missing metadata container is fatal; every field is optional.
pub fn extract_channel_info(root: &Value) -> Result<ChannelInfo, ExtractError> {
    let metadata = root
        .pointer(METADATA)
        .filter(|m| m.is_object())
        .ok_or(ExtractError::MetadataMissing)?;

    let url = str_at(metadata, "/channelUrl")
        .or_else(|| str_at(metadata, "/vanityChannelUrl"))
        .map(str::to_string);

    let id = str_at(metadata, "/externalId")
        .or_else(|| str_at(root, &format!("{C4_HEADER}/channelId")))
        .map(str::to_string)
        .or_else(|| url.as_deref().and_then(channel_id_from_url));

    let about = find_container(root, COUNTRY_CONTAINERS);

    Ok(ChannelInfo {
        id,
        title: text_at(metadata, "/title").or_else(|| text_at(root, &format!("{MICROFORMAT}/title"))),
        handle: extract_handle(root, metadata),
        url,
        description: text_at(metadata, "/description").map(|d| normalize_whitespace(&d)),
        country: extract_country(root),
        keywords: metadata
            .get("keywords")
            .map(parse_keywords)
            .unwrap_or_default(),
        subscriber_count_text: text_at(root, &format!("{C4_HEADER}/subscriberCountText"))
            .or_else(|| about.and_then(|a| a.get("subscriberCountText")).and_then(text_of)),
        avatar_url: metadata
            .pointer("/avatar/thumbnails")
            .and_then(Value::as_array)
            .and_then(|thumbs| thumbs.last())
            .and_then(|t| t.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string),
        is_family_safe: metadata
            .get("isFamilySafe")
            .and_then(Value::as_bool)
            .or_else(|| root.pointer(&format!("{MICROFORMAT}/familySafe")).and_then(Value::as_bool)),
        from_meta_fallback: false,
    })
}

/// Country from the direct metadata path, else from the first location
/// container found anywhere in the tree.
pub fn extract_country(root: &Value) -> Option<String> {
    if let Some(country) = text_at(root, &format!("{METADATA}/country")) {
        return Some(country);
    }

    let mut stack: Vec<&Value> = vec![root];
    let mut visited: HashSet<*const Value> = HashSet::new();

    while let Some(node) = stack.pop() {
        if !visited.insert(node as *const Value) {
            continue;
        }
        match node {
            Value::Object(map) => {
                for key in COUNTRY_CONTAINERS {
                    if let Some(country) = map.get(*key).and_then(|c| c.get("country")).and_then(text_of) {
                        return Some(country);
                    }
                }
                // reversed so the traversal visits children in document order
                stack.extend(map.values().rev());
            }
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }
    None
}

/// First object stored under any of `keys`, searched depth-first.
fn find_container<'a>(root: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut stack: Vec<&Value> = vec![root];
    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                if let Some(found) = keys.iter().find_map(|k| map.get(*k).filter(|v| v.is_object())) {
                    return Some(found);
                }
                stack.extend(map.values().rev());
            }
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }
    None
}

fn extract_handle(root: &Value, metadata: &Value) -> Option<String> {
    if let Some(handle) = str_at(metadata, "/vanityChannelUrl").and_then(handle_from_url) {
        return Some(handle);
    }
    text_at(root, &format!("{C4_HEADER}/channelHandleText"))
        .filter(|h| h.starts_with('@'))
        .or_else(|| {
            str_at(root, &format!("{C4_HEADER}/navigationEndpoint/browseEndpoint/canonicalBaseUrl"))
                .and_then(handle_from_url)
        })
}

fn handle_from_url(url: &str) -> Option<String> {
    url.split('/')
        .find(|segment| segment.starts_with('@') && segment.len() > 1)
        .map(str::to_string)
}

fn channel_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/channel/")?;
    let id = rest.split(['/', '?', '#']).next()?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Keywords arrive either as an array or as one space-separated string in
/// which multi-word keywords are double-quoted.
pub fn parse_keywords(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text_of).collect(),
        Value::String(s) => split_quoted(s),
        _ => Vec::new(),
    }
}

fn split_quoted(s: &str) -> Vec<String> {
    let mut keywords = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in s.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                if !quoted {
                    push_keyword(&mut keywords, &mut current);
                }
            }
            c if c.is_whitespace() && !quoted => push_keyword(&mut keywords, &mut current),
            c => current.push(c),
        }
    }
    push_keyword(&mut keywords, &mut current);
    keywords
}

fn push_keyword(keywords: &mut Vec<String>, current: &mut String) {
    let keyword = current.trim();
    if !keyword.is_empty() {
        keywords.push(keyword.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keywords_from_quoted_string() {
        let value = json!("kochen \"deutsche küche\" rezepte  \"\" backen");
        assert_eq!(
            parse_keywords(&value),
            vec!["kochen", "deutsche küche", "rezepte", "backen"]
        );
    }

    #[test]
    fn keywords_from_array() {
        let value = json!(["a", {"simpleText": "b"}, 3]);
        assert_eq!(parse_keywords(&value), vec!["a", "b"]);
    }

    #[test]
    fn handle_and_id_from_urls() {
        assert_eq!(handle_from_url("http://www.youtube.com/@kanal"), Some("@kanal".to_string()));
        assert_eq!(handle_from_url("https://www.youtube.com/c/legacy"), None);
        assert_eq!(
            channel_id_from_url("https://www.youtube.com/channel/UCabc?x=1"),
            Some("UCabc".to_string())
        );
    }

    #[test]
    fn country_traversal_prefers_document_order() {
        let root = json!({
            "contents": [
                {"aboutChannelViewModel": {"country": "Österreich"}},
                {"channelAboutFullMetadataRenderer": {"country": {"simpleText": "Japan"}}}
            ]
        });
        assert_eq!(extract_country(&root), Some("Österreich".to_string()));
    }

    #[test]
    fn country_traversal_skips_blank_values() {
        let root = json!({
            "a": {"aboutChannelViewModel": {"country": "  "}},
            "b": {"x": [{"channelAboutFullMetadataRenderer": {"country": {"runs": [{"text": "Schweiz"}]}}}]}
        });
        assert_eq!(extract_country(&root), Some("Schweiz".to_string()));
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let mut root = json!({"aboutChannelViewModel": {"country": "Deutschland"}});
        for _ in 0..20_000 {
            root = json!({ "n": [root] });
        }
        assert_eq!(extract_country(&root), Some("Deutschland".to_string()));
        // serde_json drops nested values recursively; leak instead of risking the stack
        std::mem::forget(root);
    }
}
