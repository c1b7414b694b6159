//! Decoding of raw response bodies to UTF-8 text.

use crate::fetcher::types::Charset;
use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBody {
    pub text: String,
    pub charset: Charset,
    /// Malformed sequences were replaced with U+FFFD.
    pub lossy: bool,
}

pub fn decode_body(content_type: Option<&str>, body_bytes: &[u8]) -> DecodedBody {
    let charset = detect_charset(content_type.unwrap_or(""), body_bytes);
    let (decoded, _encoding, had_errors) = charset.encoding().decode(body_bytes);

    DecodedBody {
        text: decoded.into_owned(),
        charset,
        lossy: had_errors,
    }
}

fn label_to_charset(label: &str) -> Option<Charset> {
    Encoding::for_label(label.to_lowercase().as_bytes()).map(Charset::from_encoding)
}

fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Charset {
    // 1. Content-Type header
    if let Some(charset) = CHARSET_REGEX
        .captures(content_type)
        .and_then(|c| c.get(1))
        .and_then(|m| label_to_charset(m.as_str()))
    {
        return charset;
    }

    // 2. <meta> declarations in the first 4KB
    let search_bytes = &body_bytes[..body_bytes.len().min(4096)];
    let search_str = String::from_utf8_lossy(search_bytes);

    for regex in [&*META_CHARSET_REGEX, &*META_HTTP_EQUIV_REGEX] {
        if let Some(charset) = regex
            .captures(&search_str)
            .and_then(|c| c.get(1))
            .and_then(|m| label_to_charset(m.as_str()))
        {
            return charset;
        }
    }

    // 3. Heuristic
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(search_bytes, false);
    Charset::from_encoding(detector.guess(None, true))
}
