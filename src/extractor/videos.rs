use serde_json::Value;

use crate::extractor::{
    model::VideoInfo,
    text::{str_at, text_of},
};

const TABS: &str = "/contents/twoColumnBrowseResultsRenderer/tabs";
const VIDEO_TAB_TITLES: &[&str] = &["videos", "uploads", "video", "hochgeladen"];
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Collect up to `limit` videos from the channel's videos tab.
///
/// Any layout that cannot be read yields an empty list.
pub fn extract_videos(root: &Value, limit: usize) -> Vec<VideoInfo> {
    if limit == 0 {
        return Vec::new();
    }
    let Some(content) = select_tab(root).and_then(|tab| tab.get("content")) else {
        return Vec::new();
    };

    let rich_grid = content
        .pointer("/richGridRenderer/contents")
        .and_then(Value::as_array)
        .map(|items| collect(items, limit))
        .unwrap_or_default();
    if !rich_grid.is_empty() {
        return rich_grid;
    }

    let sections = content
        .pointer("/sectionListRenderer/contents")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for section in sections {
        for grid in section_grids(section) {
            let videos = collect(grid, limit);
            if !videos.is_empty() {
                return videos;
            }
        }
    }
    Vec::new()
}

/// The selected tab, else one titled like a videos tab, else the first.
fn select_tab(root: &Value) -> Option<&Value> {
    let tabs: Vec<&Value> = root
        .pointer(TABS)
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|tab| tab.get("tabRenderer"))
        .collect();

    tabs.iter()
        .find(|tab| tab.get("selected").and_then(Value::as_bool) == Some(true))
        .or_else(|| {
            tabs.iter().find(|tab| {
                tab.get("title")
                    .and_then(text_of)
                    .is_some_and(|t| VIDEO_TAB_TITLES.contains(&t.to_lowercase().as_str()))
            })
        })
        .or_else(|| tabs.first())
        .copied()
}

/// Grids nested in one entry of a section list.
fn section_grids(section: &Value) -> Vec<&[Value]> {
    let contents = section
        .pointer("/itemSectionRenderer/contents")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    contents
        .iter()
        .filter_map(|item| {
            item.pointer("/gridRenderer/items")
                .or_else(|| item.pointer("/shelfRenderer/content/gridRenderer/items"))
                .or_else(|| item.pointer("/shelfRenderer/content/horizontalListRenderer/items"))
                .and_then(Value::as_array)
                .map(Vec::as_slice)
        })
        .collect()
}

fn collect(items: &[Value], limit: usize) -> Vec<VideoInfo> {
    items.iter().filter_map(video_from_item).take(limit).collect()
}

fn video_from_item(item: &Value) -> Option<VideoInfo> {
    let renderer = item
        .pointer("/richItemRenderer/content/videoRenderer")
        .or_else(|| item.get("gridVideoRenderer"))
        .or_else(|| item.get("videoRenderer"))?;

    let id = str_at(renderer, "/videoId")?.to_string();
    Some(VideoInfo {
        url: format!("{WATCH_URL}{id}"),
        title: renderer.get("title").and_then(text_of),
        published_text: renderer.get("publishedTimeText").and_then(text_of),
        views_text: renderer.get("viewCountText").and_then(text_of),
        duration_text: renderer.get("lengthText").and_then(text_of).or_else(|| {
            renderer
                .pointer("/thumbnailOverlays/0/thumbnailOverlayTimeStatusRenderer/text")
                .and_then(text_of)
        }),
        description: renderer.get("descriptionSnippet").and_then(text_of),
        id,
    })
}
