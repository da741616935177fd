use crate::state::VideoRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the profile URL input box.
    InputChanged(String),
    /// User submitted the current input: switch profile and start fetching.
    FetchSubmitted,
    /// User asked for one more chunk ("load more").
    FetchNextRequested,
    /// User asked to retrieve the rest of the listing, chunk by chunk.
    FetchAllRequested,
    /// Backend delivered one chunk starting at `offset`.
    ChunkArrived { offset: usize, videos: Vec<VideoRef> },
    /// Backend delivered the complete listing in one response.
    ListingArrived { videos: Vec<VideoRef>, total: usize },
    /// A chunk or listing call failed; prior state stays untouched.
    FetchFailed { message: String },
    /// User toggled one video's selection checkbox.
    VideoToggled { index: usize },
    /// User clicked Select All.
    SelectAllClicked,
    /// User clicked Unselect All.
    ClearSelectionClicked,
    /// User asked to download a single video right away.
    DownloadVideoClicked { index: usize },
    /// User asked to download the current selection.
    DownloadSelectedClicked,
    /// Engine finished saving one video.
    VideoSaved { index: usize },
    /// Engine finished saving the ZIP bundle.
    ZipSaved,
    /// A video or ZIP call failed; the selection survives for a retry.
    DownloadFailed { message: String },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
