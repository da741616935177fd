use crate::{DownloadMode, Effect, InFlight, Msg, PaginationMode, SessionState};

/// Pure update function: applies a message to state and returns any effects.
///
/// At most one effect that talks to the backend is ever outstanding; every
/// arm re-checks the in-flight marker before emitting a new request.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::FetchSubmitted => submit(&mut state, false),
        Msg::FetchAllRequested => submit(&mut state, true),
        Msg::FetchNextRequested => state.chunk_request().into_iter().collect(),
        Msg::ChunkArrived { offset, videos } => {
            match state.in_flight() {
                Some(InFlight::Chunk { offset: expected }) if expected == offset => {}
                // Stale or unsolicited chunk; cannot occur under the
                // serialized engine, dropped without touching the sequence.
                _ => return (state, Vec::new()),
            }
            state.clear_in_flight();

            let prev_len = state.video_count();
            let appended = state.append_fetched_batch(videos);
            if state.options().auto_select_on_fetch && appended > 0 {
                state.select_range(prev_len, prev_len + appended);
            }

            if state.cursor().done {
                state.set_run_all(false);
                Vec::new()
            } else if state.run_all() {
                state.chunk_request().into_iter().collect()
            } else {
                Vec::new()
            }
        }
        Msg::ListingArrived { videos, total } => {
            match state.in_flight() {
                Some(InFlight::Listing) => {}
                _ => return (state, Vec::new()),
            }
            state.clear_in_flight();

            let prev_len = state.video_count();
            let appended = state.append_fetched_batch(videos);
            state.mark_listing_complete();
            state.set_advertised_total(total);
            if state.options().auto_select_on_fetch && appended > 0 {
                state.select_range(prev_len, prev_len + appended);
            }
            Vec::new()
        }
        Msg::FetchFailed { message } => {
            match state.in_flight() {
                Some(InFlight::Chunk { .. }) | Some(InFlight::Listing) => {}
                _ => return (state, Vec::new()),
            }
            // No partial application: sequence and cursor stay as they
            // were, so a retry re-requests the same offset.
            state.clear_in_flight();
            state.set_run_all(false);
            state.record_error(message);
            Vec::new()
        }
        Msg::VideoToggled { index } => {
            state.toggle_selection(index);
            Vec::new()
        }
        Msg::SelectAllClicked => {
            state.select_all();
            Vec::new()
        }
        Msg::ClearSelectionClicked => {
            state.clear_selection();
            Vec::new()
        }
        Msg::DownloadVideoClicked { index } => state.video_request(index).into_iter().collect(),
        Msg::DownloadSelectedClicked => {
            if state.in_flight().is_some() {
                return (state, Vec::new());
            }
            let selected = state.selected_indices();
            if selected.is_empty() {
                state.record_error("no videos selected");
                return (state, Vec::new());
            }
            state.clear_error();
            match state.options().download {
                DownloadMode::Zip => state.zip_request().into_iter().collect(),
                DownloadMode::Single => {
                    state.queue_downloads(selected);
                    next_queued_download(&mut state)
                }
            }
        }
        Msg::VideoSaved { index } => {
            match state.in_flight() {
                Some(InFlight::Video { index: expected }) if expected == index => {}
                _ => return (state, Vec::new()),
            }
            state.clear_in_flight();
            state.note_video_saved();
            next_queued_download(&mut state)
        }
        Msg::ZipSaved => {
            match state.in_flight() {
                Some(InFlight::Zip) => {}
                _ => return (state, Vec::new()),
            }
            state.clear_in_flight();
            state.note_zip_saved();
            Vec::new()
        }
        Msg::DownloadFailed { message } => {
            match state.in_flight() {
                Some(InFlight::Video { .. }) | Some(InFlight::Zip) => {}
                _ => return (state, Vec::new()),
            }
            state.clear_in_flight();
            state.drop_queued_downloads();
            state.record_error(message);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Shared path for FetchSubmitted / FetchAllRequested: validate the input,
/// switch profile if it changed, and issue the first request for the
/// configured pagination mode.
fn submit(state: &mut SessionState, run_all: bool) -> Vec<Effect> {
    if state.in_flight().is_some() {
        return Vec::new();
    }
    let raw = state.input().trim().to_string();
    if raw.is_empty() {
        state.record_error("enter a profile URL first");
        return Vec::new();
    }

    state.reset(&raw);
    state.clear_error();

    match state.options().pagination {
        PaginationMode::AllAtOnce => state.listing_request().into_iter().collect(),
        PaginationMode::Chunked { .. } => {
            state.set_run_all(run_all);
            state.chunk_request().into_iter().collect()
        }
    }
}

fn next_queued_download(state: &mut SessionState) -> Vec<Effect> {
    while let Some(index) = state.pop_queued_download() {
        if let Some(effect) = state.video_request(index) {
            return vec![effect];
        }
    }
    Vec::new()
}
