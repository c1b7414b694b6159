//! Locating the inlined page-state object in channel HTML.

use serde_json::Value;

/// Assignment forms the platform has used for its initial page state.
pub const DEFAULT_MARKERS: &[&str] = &[
    "var ytInitialData =",
    "window[\"ytInitialData\"] =",
    "window['ytInitialData'] =",
    "var ytInitialData=",
    "window[\"ytInitialData\"]=",
];

/// Parse the embedded state object using [`DEFAULT_MARKERS`].
pub fn extract_embedded_object(html: &str) -> Option<Value> {
    extract_embedded_object_with(html, DEFAULT_MARKERS)
}

/// Parse the JSON object following the earliest of `markers` in `html`.
///
/// Absence is a normal result: no marker, an unterminated object or invalid
/// JSON all yield `None`.
pub fn extract_embedded_object_with(html: &str, markers: &[&str]) -> Option<Value> {
    let marker_end = markers
        .iter()
        .filter_map(|marker| html.find(marker).map(|pos| (pos, pos + marker.len())))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, end)| end)?;

    let open = marker_end + html[marker_end..].find('{')?;
    let close = matching_brace(&html.as_bytes()[open..])?;
    serde_json::from_str(&html[open..=open + close]).ok()
}

/// Offset of the brace closing the object that starts at `bytes[0]`.
///
/// Quotes, backslashes and braces are ASCII, so scanning bytes is safe inside
/// UTF-8 text: continuation bytes never collide with them.
fn matching_brace(bytes: &[u8]) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
