use serde_json::{Value, json};

use crate::extractor::{
    ExtractError, extract_channel_info, extract_channel_page, extract_embedded_object,
    extract_video_page, extract_videos,
};

fn wrap(state: &Value) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Kanal - YouTube</title></head><body><script nonce="abc">var ytInitialData = {state};</script><script>var ytcfg = {{"x": 1}};</script></body></html>"#
    )
}

fn video(id: &str, title: &str) -> Value {
    json!({
        "richItemRenderer": {"content": {"videoRenderer": {
            "videoId": id,
            "title": {"runs": [{"text": title}]},
            "publishedTimeText": {"simpleText": "vor 2 Tagen"},
            "viewCountText": {"simpleText": "1.234 Aufrufe"},
            "lengthText": {"simpleText": "12:34"},
            "descriptionSnippet": {"runs": [{"text": "Heute "}, {"text": "backen wir"}]}
        }}}
    })
}

fn about_state() -> Value {
    json!({
        "metadata": {"channelMetadataRenderer": {
            "title": "Backstube Müller",
            "description": "Wir backen   jeden Tag.\n\n\n\nRezepte aus Bayern.",
            "externalId": "UCbackstube",
            "channelUrl": "https://www.youtube.com/channel/UCbackstube",
            "vanityChannelUrl": "http://www.youtube.com/@backstube",
            "keywords": "backen \"bayerische küche\" rezepte",
            "avatar": {"thumbnails": [
                {"url": "https://yt3.example/s48.jpg"},
                {"url": "https://yt3.example/s900.jpg"}
            ]},
            "isFamilySafe": true
        }},
        "header": {"c4TabbedHeaderRenderer": {
            "channelId": "UCbackstube",
            "subscriberCountText": {"simpleText": "12.300 Abonnenten"}
        }},
        "onResponseReceivedEndpoints": [{
            "showEngagementPanelEndpoint": {"engagementPanel": {"content": {
                "sectionListRenderer": {"contents": [{"itemSectionRenderer": {"contents": [{
                    "aboutChannelRenderer": {"metadata": {"aboutChannelViewModel": {
                        "country": "Deutschland",
                        "subscriberCountText": "12.300 Abonnenten"
                    }}}
                }]}}]}
            }}}
        }]
    })
}

#[test]
fn test_extract_about_page() {
    let html = wrap(&about_state());
    let info = extract_channel_page(&html).unwrap().unwrap();

    assert_eq!(info.id.as_deref(), Some("UCbackstube"));
    assert_eq!(info.title.as_deref(), Some("Backstube Müller"));
    assert_eq!(info.handle.as_deref(), Some("@backstube"));
    assert_eq!(info.url.as_deref(), Some("https://www.youtube.com/channel/UCbackstube"));
    assert_eq!(
        info.description.as_deref(),
        Some("Wir backen jeden Tag.\n\nRezepte aus Bayern.")
    );
    assert_eq!(info.country.as_deref(), Some("Deutschland"));
    assert_eq!(info.keywords, vec!["backen", "bayerische küche", "rezepte"]);
    assert_eq!(info.subscriber_count_text.as_deref(), Some("12.300 Abonnenten"));
    assert_eq!(info.avatar_url.as_deref(), Some("https://yt3.example/s900.jpg"));
    assert_eq!(info.is_family_safe, Some(true));
    assert!(!info.from_meta_fallback);
    assert!(info.is_stable());
}

#[test]
fn test_direct_country_path_wins() {
    let mut state = about_state();
    state["metadata"]["channelMetadataRenderer"]["country"] = json!("Austria");
    let info = extract_channel_info(&state).unwrap();
    assert_eq!(info.country.as_deref(), Some("Austria"));
}

#[test]
fn test_missing_metadata_is_fatal() {
    let state = json!({"header": {"c4TabbedHeaderRenderer": {"channelId": "UC1"}}});
    assert_eq!(extract_channel_info(&state), Err(ExtractError::MetadataMissing));

    let html = wrap(&state);
    assert_eq!(extract_channel_page(&html), Err(ExtractError::MetadataMissing));
}

#[test]
fn test_metadata_without_country() {
    let state = json!({"metadata": {"channelMetadataRenderer": {"title": "Ohne Land"}}});
    let info = extract_channel_info(&state).unwrap();
    assert_eq!(info.country, None);
    assert_eq!(info.id, None);
    assert!(!info.is_stable());
    assert!(info.keywords.is_empty());
}

#[test]
fn test_id_falls_back_to_header_then_url() {
    let state = json!({
        "metadata": {"channelMetadataRenderer": {"title": "x"}},
        "header": {"c4TabbedHeaderRenderer": {"channelId": "UCheader"}}
    });
    assert_eq!(extract_channel_info(&state).unwrap().id.as_deref(), Some("UCheader"));

    let state = json!({
        "metadata": {"channelMetadataRenderer": {"channelUrl": "https://www.youtube.com/channel/UCurl"}}
    });
    assert_eq!(extract_channel_info(&state).unwrap().id.as_deref(), Some("UCurl"));
}

#[test]
fn test_page_without_state_uses_meta_tags() {
    let html = r#"<html><head><meta property="og:title" content="Nur Meta"><meta itemprop="identifier" content="UCmeta"></head></html>"#;
    let info = extract_channel_page(html).unwrap().unwrap();
    assert!(info.from_meta_fallback);
    assert_eq!(info.id.as_deref(), Some("UCmeta"));

    assert_eq!(extract_channel_page("<html></html>"), Ok(None));
}

fn videos_state(tabs: Value) -> Value {
    json!({"contents": {"twoColumnBrowseResultsRenderer": {"tabs": tabs}}})
}

#[test]
fn test_extract_videos_from_selected_tab() {
    let state = videos_state(json!([
        {"tabRenderer": {"title": "Home", "content": {"richGridRenderer": {"contents": [video("home1", "Falsch")]}}}},
        {"tabRenderer": {"title": "Videos", "selected": true, "content": {"richGridRenderer": {"contents": [
            video("v1", "Brot backen"),
            video("v2", "Brezeln"),
            {"continuationItemRenderer": {"trigger": "CONTINUATION_TRIGGER_ON_ITEM_SHOWN"}}
        ]}}}}
    ]));

    let videos = extract_videos(&state, 10);
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].id, "v1");
    assert_eq!(videos[0].title.as_deref(), Some("Brot backen"));
    assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=v1");
    assert_eq!(videos[0].published_text.as_deref(), Some("vor 2 Tagen"));
    assert_eq!(videos[0].views_text.as_deref(), Some("1.234 Aufrufe"));
    assert_eq!(videos[0].duration_text.as_deref(), Some("12:34"));
    assert_eq!(videos[0].description.as_deref(), Some("Heute backen wir"));
    assert_eq!(videos[1].id, "v2");
}

#[test]
fn test_videos_tab_found_by_title() {
    let state = videos_state(json!([
        {"tabRenderer": {"title": "Übersicht", "content": {}}},
        {"tabRenderer": {"title": "Videos", "content": {"richGridRenderer": {"contents": [video("v9", "T")]}}}}
    ]));
    let videos = extract_videos(&state, 5);
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "v9");
}

#[test]
fn test_limit_caps_results() {
    let items: Vec<Value> = (0..30).map(|i| video(&format!("v{i}"), "x")).collect();
    let state = videos_state(json!([
        {"tabRenderer": {"selected": true, "content": {"richGridRenderer": {"contents": items}}}}
    ]));
    let videos = extract_videos(&state, 7);
    assert_eq!(videos.len(), 7);
    assert_eq!(videos[6].id, "v6");
    assert!(extract_videos(&state, 0).is_empty());
}

#[test]
fn test_section_list_fallback() {
    let state = videos_state(json!([
        {"tabRenderer": {"selected": true, "content": {
            "richGridRenderer": {"contents": []},
            "sectionListRenderer": {"contents": [
                {"itemSectionRenderer": {"contents": [{"messageRenderer": {}}]}},
                {"itemSectionRenderer": {"contents": [{"gridRenderer": {"items": [
                    {"gridVideoRenderer": {"videoId": "g1", "title": {"simpleText": "Grid eins"}}},
                    {"gridVideoRenderer": {"videoId": "g2", "title": {"simpleText": "Grid zwei"}}}
                ]}}]}}
            ]}
        }}}
    ]));
    let videos = extract_videos(&state, 10);
    assert_eq!(videos.iter().map(|v| v.id.as_str()).collect::<Vec<_>>(), vec!["g1", "g2"]);
    assert_eq!(videos[1].title.as_deref(), Some("Grid zwei"));
    assert_eq!(videos[0].duration_text, None);
}

#[test]
fn test_unreadable_videos_are_empty() {
    assert!(extract_videos(&json!({}), 10).is_empty());
    assert!(extract_videos(&videos_state(json!("nope")), 10).is_empty());
    assert!(extract_video_page("<html>kein state</html>", 10).is_empty());
}

#[test]
fn test_video_page_round_trip() {
    let state = videos_state(json!([
        {"tabRenderer": {"selected": true, "content": {"richGridRenderer": {"contents": [video("rt", "Titel {mit} \"Klammern\"")]}}}}
    ]));
    let html = wrap(&state);
    assert_eq!(extract_embedded_object(&html), Some(state));

    let videos = extract_video_page(&html, 3);
    assert_eq!(videos[0].title.as_deref(), Some("Titel {mit} \"Klammern\""));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(html in ".*") {
            let _ = extract_embedded_object(&html);
            let _ = extract_channel_page(&html);
            let _ = extract_video_page(&html, 10);
        }

        #[test]
        fn test_marker_prefix_never_panics(tail in ".*") {
            let html = format!("<script>var ytInitialData = {tail}");
            let _ = extract_embedded_object(&html);
        }
    }
}
