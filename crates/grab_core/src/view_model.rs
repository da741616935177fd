use crate::state::InFlight;

/// Render-ready snapshot of a session, derived from
/// [`crate::SessionState::view`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionViewModel {
    pub profile_url: Option<String>,
    pub video_count: usize,
    /// Selected indices in ascending order.
    pub selected: Vec<usize>,
    pub rows: Vec<VideoRowView>,
    pub next_offset: usize,
    pub fetch_done: bool,
    pub in_flight: Option<InFlight>,
    /// Listing size the backend advertised, when it did.
    pub advertised_total: Option<usize>,
    pub saved_count: usize,
    pub zip_saved: bool,
    pub queued_downloads: usize,
    pub last_error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRowView {
    pub index: usize,
    pub url: String,
    pub thumbnail: Option<String>,
    pub selected: bool,
}
