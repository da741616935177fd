use std::sync::Once;

use grab_core::{
    update, DownloadMode, Effect, Msg, PaginationMode, Quality, SessionOptions, SessionState,
    VideoRef,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(grab_logging::initialize_for_tests);
}

fn with_videos(options: SessionOptions, count: usize) -> SessionState {
    let state = SessionState::new(options);
    let (state, _) = update(
        state,
        Msg::InputChanged("https://site.example/@creator".to_string()),
    );
    let (state, _) = update(state, Msg::FetchSubmitted);
    let (state, _) = update(
        state,
        Msg::ChunkArrived {
            offset: 0,
            videos: (0..count)
                .map(|i| VideoRef::new(format!("https://videos.example/v{i}")))
                .collect(),
        },
    );
    state
}

fn single_mode() -> SessionOptions {
    SessionOptions {
        pagination: PaginationMode::Chunked { chunk_size: 10 },
        download: DownloadMode::Single,
        ..SessionOptions::default()
    }
}

fn zip_mode() -> SessionOptions {
    SessionOptions {
        pagination: PaginationMode::Chunked { chunk_size: 10 },
        download: DownloadMode::Zip,
        ..SessionOptions::default()
    }
}

#[test]
fn single_mode_drains_selection_one_call_at_a_time() {
    init_logging();
    let state = with_videos(single_mode(), 5);
    let (state, _) = update(state, Msg::VideoToggled { index: 1 });
    let (state, _) = update(state, Msg::VideoToggled { index: 3 });

    let (state, effects) = update(state, Msg::DownloadSelectedClicked);
    assert_eq!(
        effects,
        vec![Effect::DownloadVideo {
            index: 1,
            url: "https://videos.example/v1".to_string(),
            quality: Quality::Best,
        }]
    );
    assert_eq!(state.view().queued_downloads, 1);

    // The next call is only issued once the previous save completed.
    let (state, effects) = update(state, Msg::VideoSaved { index: 1 });
    assert_eq!(
        effects,
        vec![Effect::DownloadVideo {
            index: 3,
            url: "https://videos.example/v3".to_string(),
            quality: Quality::Best,
        }]
    );

    let (state, effects) = update(state, Msg::VideoSaved { index: 3 });
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.saved_count, 2);
    assert_eq!(view.queued_downloads, 0);
    assert!(view.in_flight.is_none());
}

#[test]
fn zip_mode_bundles_selection_in_index_order() {
    init_logging();
    let state = with_videos(zip_mode(), 4);
    // Toggle out of order; the bundle must follow ascending indices.
    let (state, _) = update(state, Msg::VideoToggled { index: 2 });
    let (state, _) = update(state, Msg::VideoToggled { index: 0 });

    let (state, effects) = update(state, Msg::DownloadSelectedClicked);
    assert_eq!(
        effects,
        vec![Effect::DownloadZip {
            urls: vec![
                "https://videos.example/v0".to_string(),
                "https://videos.example/v2".to_string(),
            ],
            quality: Quality::Best,
        }]
    );

    let (state, effects) = update(state, Msg::ZipSaved);
    assert!(effects.is_empty());
    assert!(state.view().zip_saved);
}

#[test]
fn empty_selection_is_reported_not_requested() {
    init_logging();
    let state = with_videos(single_mode(), 3);
    let (state, effects) = update(state, Msg::DownloadSelectedClicked);

    assert!(effects.is_empty());
    assert_eq!(state.view().last_error.as_deref(), Some("no videos selected"));
}

#[test]
fn download_failure_drops_the_queue_but_keeps_the_selection() {
    init_logging();
    let state = with_videos(single_mode(), 5);
    let (state, _) = update(state, Msg::SelectAllClicked);
    let (state, effects) = update(state, Msg::DownloadSelectedClicked);
    assert_eq!(effects.len(), 1);

    let (state, effects) = update(
        state,
        Msg::DownloadFailed {
            message: "timeout".to_string(),
        },
    );
    assert!(effects.is_empty());

    let view = state.view();
    assert_eq!(view.last_error.as_deref(), Some("timeout"));
    assert_eq!(view.queued_downloads, 0);
    assert!(view.in_flight.is_none());
    // Selection survives so the user can explicitly retry.
    assert_eq!(view.selected, vec![0, 1, 2, 3, 4]);
}

#[test]
fn direct_download_of_one_video() {
    init_logging();
    let state = with_videos(single_mode(), 3);
    let (state, effects) = update(state, Msg::DownloadVideoClicked { index: 2 });
    assert_eq!(
        effects,
        vec![Effect::DownloadVideo {
            index: 2,
            url: "https://videos.example/v2".to_string(),
            quality: Quality::Best,
        }]
    );

    let (state, _) = update(state, Msg::VideoSaved { index: 2 });
    let (_state, effects) = update(state, Msg::DownloadVideoClicked { index: 99 });
    assert!(effects.is_empty());
}

#[test]
fn no_second_request_while_one_is_in_flight() {
    init_logging();
    let state = with_videos(single_mode(), 3);
    let (state, effects) = update(state, Msg::DownloadVideoClicked { index: 0 });
    assert_eq!(effects.len(), 1);

    let (state, effects) = update(state, Msg::DownloadVideoClicked { index: 1 });
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::FetchNextRequested);
    assert!(effects.is_empty());

    let (_state, effects) = update(state, Msg::DownloadSelectedClicked);
    assert!(effects.is_empty());
}
