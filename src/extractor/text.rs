//! Normalization of the platform's text shapes.

use serde_json::Value;

/// Read a text field that may be a plain string, `{"simpleText": ..}`,
/// `{"runs": [{"text": ..}, ..]}` or `{"content": ..}`.
///
/// Returns `None` for any other shape or when the text is blank.
pub fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get("simpleText") {
                s.clone()
            } else if let Some(Value::Array(runs)) = map.get("runs") {
                runs.iter()
                    .filter_map(|run| run.get("text").and_then(Value::as_str))
                    .collect()
            } else if let Some(Value::String(s)) = map.get("content") {
                s.clone()
            } else {
                return None;
            }
        }
        _ => return None,
    };

    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// [`text_of`] applied at a JSON pointer.
pub fn text_at(root: &Value, pointer: &str) -> Option<String> {
    root.pointer(pointer).and_then(text_of)
}

/// Non-empty string at a JSON pointer.
pub fn str_at<'a>(root: &'a Value, pointer: &str) -> Option<&'a str> {
    root.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
