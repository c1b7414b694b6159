use url::Url;

const CHANNEL_ID_LEN: usize = 24;
const SUBPAGES: &[&str] = &["about", "videos", "featured", "streams", "shorts", "playlists", "community"];

/// A candidate resolved to its channel root URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget {
    pub input: String,
    pub root: Url,
}

impl ChannelTarget {
    pub fn about_url(&self) -> String {
        format!("{}/about", self.root.as_str().trim_end_matches('/'))
    }

    pub fn videos_url(&self) -> String {
        format!("{}/videos", self.root.as_str().trim_end_matches('/'))
    }
}

/// Resolve `@handle`, a bare `UC…` channel id or a full channel URL.
pub fn resolve(base: &Url, input: &str) -> Option<ChannelTarget> {
    let trimmed = input.trim();
    let root = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        channel_root(&Url::parse(trimmed).ok()?)?
    } else if trimmed.starts_with('@') && trimmed.len() > 1 && !trimmed.contains('/') {
        base.join(&format!("/{trimmed}")).ok()?
    } else if is_channel_id(trimmed) {
        base.join(&format!("/channel/{trimmed}")).ok()?
    } else {
        return None;
    };

    Some(ChannelTarget {
        input: trimmed.to_string(),
        root,
    })
}

fn is_channel_id(s: &str) -> bool {
    s.len() == CHANNEL_ID_LEN
        && s.starts_with("UC")
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Strip sub-pages, query and fragment from a channel URL.
fn channel_root(url: &Url) -> Option<Url> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let keep = match segments.as_slice() {
        [handle, ..] if handle.starts_with('@') => 1,
        ["channel" | "c" | "user", _, ..] => 2,
        _ => return None,
    };
    if segments.len() > keep && !SUBPAGES.contains(&segments[keep]) {
        return None;
    }

    let mut root = url.clone();
    root.set_query(None);
    root.set_fragment(None);
    root.set_path(&segments[..keep].join("/"));
    Some(root)
}
