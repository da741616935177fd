use std::sync::Once;

use grab_core::{
    update, Msg, PaginationMode, SessionOptions, SessionState, SessionViewModel, VideoRef,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(grab_logging::initialize_for_tests);
}

fn chunked_state(chunk_size: usize) -> SessionState {
    SessionState::new(SessionOptions {
        pagination: PaginationMode::Chunked { chunk_size },
        ..SessionOptions::default()
    })
}

fn with_videos(chunk_size: usize, count: usize) -> SessionState {
    let state = chunked_state(chunk_size);
    let (state, _) = update(
        state,
        Msg::InputChanged("https://site.example/@creator".to_string()),
    );
    let (state, _) = update(state, Msg::FetchSubmitted);
    let (state, _) = update(
        state,
        Msg::ChunkArrived {
            offset: 0,
            videos: batch(0, count),
        },
    );
    state
}

fn batch(start: usize, count: usize) -> Vec<VideoRef> {
    (start..start + count)
        .map(|i| VideoRef::new(format!("https://videos.example/v{i}")))
        .collect()
}

fn assert_selection_in_bounds(view: &SessionViewModel) {
    assert!(
        view.selected.iter().all(|&i| i < view.video_count),
        "selection {:?} out of bounds for {} videos",
        view.selected,
        view.video_count
    );
}

#[test]
fn toggle_twice_restores_original_membership() {
    init_logging();
    let state = with_videos(10, 5);

    let (state, _) = update(state, Msg::VideoToggled { index: 3 });
    assert_eq!(state.view().selected, vec![3]);

    let (state, _) = update(state, Msg::VideoToggled { index: 3 });
    assert!(state.view().selected.is_empty());
    assert_selection_in_bounds(&state.view());
}

#[test]
fn select_all_then_clear_yields_empty_selection() {
    init_logging();
    let state = with_videos(10, 5);

    let (state, _) = update(state, Msg::VideoToggled { index: 1 });
    let (state, _) = update(state, Msg::SelectAllClicked);
    assert_eq!(state.view().selected, vec![0, 1, 2, 3, 4]);

    // Idempotent in both directions.
    let (state, _) = update(state, Msg::SelectAllClicked);
    assert_eq!(state.view().selected, vec![0, 1, 2, 3, 4]);

    let (state, _) = update(state, Msg::ClearSelectionClicked);
    assert!(state.view().selected.is_empty());

    let (state, _) = update(state, Msg::ClearSelectionClicked);
    assert!(state.view().selected.is_empty());
}

#[test]
fn select_all_on_empty_sequence_is_harmless() {
    init_logging();
    let state = chunked_state(10);
    let (state, _) = update(state, Msg::SelectAllClicked);
    assert!(state.view().selected.is_empty());
    let (state, _) = update(state, Msg::ClearSelectionClicked);
    assert!(state.view().selected.is_empty());
}

#[test]
fn full_selection_tracks_sequence_growth() {
    init_logging();
    let state = with_videos(5, 5);
    let (state, _) = update(state, Msg::SelectAllClicked);
    assert_eq!(state.view().selected, vec![0, 1, 2, 3, 4]);

    let (state, _) = update(state, Msg::FetchNextRequested);
    let (state, _) = update(
        state,
        Msg::ChunkArrived {
            offset: 5,
            videos: batch(5, 3),
        },
    );

    // "Everything so far" still means everything after the append.
    let view = state.view();
    assert_eq!(view.video_count, 8);
    assert_eq!(view.selected, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    assert_selection_in_bounds(&view);
}

#[test]
fn partial_selection_does_not_grow() {
    init_logging();
    let state = with_videos(5, 5);
    let (state, _) = update(state, Msg::VideoToggled { index: 0 });
    let (state, _) = update(state, Msg::VideoToggled { index: 2 });

    let (state, _) = update(state, Msg::FetchNextRequested);
    let (state, _) = update(
        state,
        Msg::ChunkArrived {
            offset: 5,
            videos: batch(5, 5),
        },
    );

    assert_eq!(state.view().selected, vec![0, 2]);
}

#[test]
fn empty_selection_on_first_batch_stays_empty() {
    init_logging();
    // A fresh session has zero videos and zero selected; that must not
    // count as "all selected" when the first batch lands.
    let state = with_videos(5, 5);
    assert!(state.view().selected.is_empty());
}

#[test]
fn out_of_bounds_toggle_is_ignored() {
    init_logging();
    let state = with_videos(10, 5);
    let before = state.view();

    let (state, effects) = update(state, Msg::VideoToggled { index: 99 });
    assert!(effects.is_empty());
    assert_eq!(state.view().selected, before.selected);
    assert_selection_in_bounds(&state.view());
}

#[test]
fn auto_select_option_selects_every_batch() {
    init_logging();
    let state = SessionState::new(SessionOptions {
        pagination: PaginationMode::Chunked { chunk_size: 4 },
        auto_select_on_fetch: true,
        ..SessionOptions::default()
    });
    let (state, _) = update(
        state,
        Msg::InputChanged("https://site.example/@creator".to_string()),
    );
    let (state, _) = update(state, Msg::FetchAllRequested);
    let (state, _) = update(
        state,
        Msg::ChunkArrived {
            offset: 0,
            videos: batch(0, 4),
        },
    );
    assert_eq!(state.view().selected, vec![0, 1, 2, 3]);

    let (state, _) = update(
        state,
        Msg::ChunkArrived {
            offset: 4,
            videos: batch(4, 2),
        },
    );
    let view = state.view();
    assert_eq!(view.selected, vec![0, 1, 2, 3, 4, 5]);
    assert_selection_in_bounds(&view);
}

#[test]
fn selection_stays_in_bounds_through_a_mixed_script() {
    init_logging();
    let state = with_videos(3, 3);
    let (state, _) = update(state, Msg::SelectAllClicked);
    let (state, _) = update(state, Msg::FetchNextRequested);
    let (state, _) = update(
        state,
        Msg::ChunkArrived {
            offset: 3,
            videos: batch(3, 3),
        },
    );
    assert_selection_in_bounds(&state.view());

    let (state, _) = update(state, Msg::VideoToggled { index: 5 });
    assert_selection_in_bounds(&state.view());

    // Switching profiles purges every stale index.
    let (state, _) = update(
        state,
        Msg::InputChanged("https://site.example/@other".to_string()),
    );
    let (state, _) = update(state, Msg::FetchSubmitted);
    let view = state.view();
    assert!(view.selected.is_empty());
    assert_selection_in_bounds(&view);
}
