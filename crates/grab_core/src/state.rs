use std::collections::{BTreeSet, VecDeque};

use crate::effect::Effect;
use crate::view_model::{SessionViewModel, VideoRowView};

/// One discovered video. Identity is the position in the discovery
/// sequence; the struct itself only carries what the backend told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub url: String,
    pub thumbnail: Option<String>,
}

impl VideoRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            thumbnail: None,
        }
    }
}

/// Requested rendition for downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Best,
    P720,
    P480,
}

impl Quality {
    /// Wire name understood by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Best => "best",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    /// Incremental retrieval in `chunk_size` batches.
    Chunked { chunk_size: usize },
    /// One long-running call returning the whole listing.
    AllAtOnce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    /// One video per backend call, strictly sequential.
    Single,
    /// One ZIP bundle call covering the whole selection.
    Zip,
}

/// The recognized knobs across the original UI variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub pagination: PaginationMode,
    pub auto_select_on_fetch: bool,
    pub download: DownloadMode,
    pub quality: Quality,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            pagination: PaginationMode::Chunked { chunk_size: 20 },
            auto_select_on_fetch: false,
            download: DownloadMode::Single,
            quality: Quality::Best,
        }
    }
}

/// Bookkeeping for incremental retrieval. `done` flips when a fetch
/// returns zero new items and never flips back except through `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchCursor {
    pub offset: usize,
    pub chunk_size: usize,
    pub done: bool,
}

impl FetchCursor {
    fn new(chunk_size: usize) -> Self {
        Self {
            offset: 0,
            chunk_size,
            done: false,
        }
    }
}

/// The single backend call currently awaiting a response, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFlight {
    Chunk { offset: usize },
    Listing,
    Video { index: usize },
    Zip,
}

/// Session state owned by one UI/driver context. No hidden globals; the
/// caller threads this through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    options: SessionOptions,
    input: String,
    profile_url: Option<String>,
    videos: Vec<VideoRef>,
    selected: BTreeSet<usize>,
    cursor: FetchCursor,
    in_flight: Option<InFlight>,
    run_all: bool,
    download_queue: VecDeque<usize>,
    advertised_total: Option<usize>,
    saved_count: usize,
    zip_saved: bool,
    last_error: Option<String>,
    dirty: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl SessionState {
    pub fn new(options: SessionOptions) -> Self {
        let chunk_size = match options.pagination {
            PaginationMode::Chunked { chunk_size } => chunk_size.max(1),
            PaginationMode::AllAtOnce => 0,
        };
        Self {
            options,
            input: String::new(),
            profile_url: None,
            videos: Vec::new(),
            selected: BTreeSet::new(),
            cursor: FetchCursor::new(chunk_size),
            in_flight: None,
            run_all: false,
            download_queue: VecDeque::new(),
            advertised_total: None,
            saved_count: 0,
            zip_saved: false,
            last_error: None,
            dirty: false,
        }
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn cursor(&self) -> FetchCursor {
        self.cursor
    }

    pub fn in_flight(&self) -> Option<InFlight> {
        self.in_flight
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    /// Switches the session to `new_profile_url`. A change of profile
    /// invalidates the video sequence, the selection set and the cursor;
    /// submitting the same profile again keeps them so a failed call can
    /// be retried at the same offset.
    pub fn reset(&mut self, new_profile_url: &str) {
        let normalized = normalize_profile_url(new_profile_url);
        if self.profile_url.as_deref() == Some(normalized.as_str()) {
            return;
        }
        self.profile_url = Some(normalized);
        self.videos.clear();
        self.selected.clear();
        self.cursor = FetchCursor::new(self.cursor.chunk_size);
        self.run_all = false;
        self.download_queue.clear();
        self.advertised_total = None;
        self.saved_count = 0;
        self.zip_saved = false;
        self.last_error = None;
        self.mark_dirty();
    }

    /// Appends one fetched batch, preserving discovery order, and returns
    /// the number of items appended. An empty batch marks the cursor done.
    ///
    /// If the selection covered the whole pre-append sequence, it is
    /// extended over the new indices so "everything so far" keeps meaning
    /// everything.
    pub fn append_fetched_batch(&mut self, new_items: Vec<VideoRef>) -> usize {
        if new_items.is_empty() {
            if !self.cursor.done {
                self.cursor.done = true;
                self.mark_dirty();
            }
            return 0;
        }

        let prev_len = self.videos.len();
        let all_selected = prev_len > 0 && self.selected.len() == prev_len;
        let appended = new_items.len();

        self.videos.extend(new_items);
        self.cursor.offset += appended;
        if all_selected {
            self.selected.extend(prev_len..self.videos.len());
        }
        self.mark_dirty();
        appended
    }

    /// Flips membership of `index` in the selection set. Out-of-bounds
    /// indices are ignored; under correct sequencing they cannot occur.
    pub fn toggle_selection(&mut self, index: usize) {
        if index >= self.videos.len() {
            return;
        }
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
        self.mark_dirty();
    }

    pub fn select_all(&mut self) {
        let full: BTreeSet<usize> = (0..self.videos.len()).collect();
        if self.selected != full {
            self.selected = full;
            self.mark_dirty();
        }
    }

    pub fn clear_selection(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.mark_dirty();
        }
    }

    pub fn view(&self) -> SessionViewModel {
        SessionViewModel {
            profile_url: self.profile_url.clone(),
            video_count: self.videos.len(),
            selected: self.selected.iter().copied().collect(),
            rows: self
                .videos
                .iter()
                .enumerate()
                .map(|(index, video)| VideoRowView {
                    index,
                    url: video.url.clone(),
                    thumbnail: video.thumbnail.clone(),
                    selected: self.selected.contains(&index),
                })
                .collect(),
            next_offset: self.cursor.offset,
            fetch_done: self.cursor.done,
            in_flight: self.in_flight,
            advertised_total: self.advertised_total,
            saved_count: self.saved_count,
            zip_saved: self.zip_saved,
            queued_downloads: self.download_queue.len(),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether a re-render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    pub(crate) fn set_input(&mut self, text: String) {
        if self.input != text {
            self.input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.mark_dirty();
    }

    pub(crate) fn clear_error(&mut self) {
        if self.last_error.is_some() {
            self.last_error = None;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_run_all(&mut self, run_all: bool) {
        self.run_all = run_all;
    }

    pub(crate) fn run_all(&self) -> bool {
        self.run_all
    }

    pub(crate) fn clear_in_flight(&mut self) {
        self.in_flight = None;
    }

    pub(crate) fn set_advertised_total(&mut self, total: usize) {
        self.advertised_total = Some(total);
    }

    pub(crate) fn mark_listing_complete(&mut self) {
        self.cursor.done = true;
        self.mark_dirty();
    }

    pub(crate) fn video_url(&self, index: usize) -> Option<&str> {
        self.videos.get(index).map(|video| video.url.as_str())
    }

    pub(crate) fn selected_indices(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub(crate) fn selected_urls(&self) -> Vec<String> {
        self.selected
            .iter()
            .filter_map(|&index| self.videos.get(index))
            .map(|video| video.url.clone())
            .collect()
    }

    pub(crate) fn select_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.videos.len());
        if start < end {
            self.selected.extend(start..end);
            self.mark_dirty();
        }
    }

    pub(crate) fn queue_downloads(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.download_queue = indices.into_iter().collect();
    }

    pub(crate) fn pop_queued_download(&mut self) -> Option<usize> {
        self.download_queue.pop_front()
    }

    pub(crate) fn drop_queued_downloads(&mut self) {
        self.download_queue.clear();
    }

    pub(crate) fn note_video_saved(&mut self) {
        self.saved_count += 1;
        self.mark_dirty();
    }

    pub(crate) fn note_zip_saved(&mut self) {
        self.zip_saved = true;
        self.mark_dirty();
    }

    /// Emits the next chunk request unless the cursor is done, another
    /// call is in flight, or no profile has been submitted yet.
    pub(crate) fn chunk_request(&mut self) -> Option<Effect> {
        if self.cursor.done || self.in_flight.is_some() {
            return None;
        }
        let profile_url = self.profile_url.clone()?;
        let offset = self.cursor.offset;
        self.in_flight = Some(InFlight::Chunk { offset });
        Some(Effect::FetchChunk {
            profile_url,
            offset,
            limit: self.cursor.chunk_size,
        })
    }

    pub(crate) fn listing_request(&mut self) -> Option<Effect> {
        if self.cursor.done || self.in_flight.is_some() {
            return None;
        }
        let profile_url = self.profile_url.clone()?;
        self.in_flight = Some(InFlight::Listing);
        Some(Effect::FetchProfile { profile_url })
    }

    pub(crate) fn video_request(&mut self, index: usize) -> Option<Effect> {
        if self.in_flight.is_some() {
            return None;
        }
        let url = self.video_url(index)?.to_string();
        self.in_flight = Some(InFlight::Video { index });
        Some(Effect::DownloadVideo {
            index,
            url,
            quality: self.options.quality,
        })
    }

    pub(crate) fn zip_request(&mut self) -> Option<Effect> {
        if self.in_flight.is_some() || self.selected.is_empty() {
            return None;
        }
        let urls = self.selected_urls();
        self.in_flight = Some(InFlight::Zip);
        Some(Effect::DownloadZip {
            urls,
            quality: self.options.quality,
        })
    }
}

/// Canonical form of a profile URL used to decide whether a submission
/// switches profiles. Scheme and host compare case-insensitively and a
/// trailing slash is not a different profile; non-URL handles fall back
/// to a trimmed case-insensitive comparison.
pub fn normalize_profile_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            let mut normalized = parsed.to_string();
            while normalized.ends_with('/') {
                normalized.pop();
            }
            normalized
        }
        Err(_) => trimmed.to_ascii_lowercase(),
    }
}
