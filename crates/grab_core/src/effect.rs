use crate::state::Quality;

/// Side effects requested by [`crate::update`]; the caller runs them
/// against the backend, one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// One long call for the whole listing.
    FetchProfile { profile_url: String },
    /// One bounded chunk of the listing.
    FetchChunk {
        profile_url: String,
        offset: usize,
        limit: usize,
    },
    /// Resolve and save a single video.
    DownloadVideo {
        index: usize,
        url: String,
        quality: Quality,
    },
    /// Bundle the selected videos into one ZIP.
    DownloadZip { urls: Vec<String>, quality: Quality },
}
