pub mod channel;
pub mod embedded;
pub mod errors;
pub mod meta;
pub mod model;
pub mod text;
pub mod videos;

#[cfg(test)]
mod tests;

pub use channel::extract_channel_info;
pub use embedded::{extract_embedded_object, extract_embedded_object_with};
pub use errors::ExtractError;
pub use meta::extract_meta_fallback;
pub use model::{ChannelInfo, VideoInfo};
pub use videos::extract_videos;

/// Channel info from an about page: embedded state first, `<meta>` tags as a
/// fallback. `Ok(None)` means neither source yielded anything.
pub fn extract_channel_page(html: &str) -> Result<Option<ChannelInfo>, ExtractError> {
    match extract_embedded_object(html) {
        Some(root) => extract_channel_info(&root).map(Some),
        None => Ok(extract_meta_fallback(html)),
    }
}

/// Videos from a videos page; any failure is an empty list.
pub fn extract_video_page(html: &str, limit: usize) -> Vec<VideoInfo> {
    extract_embedded_object(html)
        .map(|root| extract_videos(&root, limit))
        .unwrap_or_default()
}
