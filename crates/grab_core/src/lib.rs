//! Grab core: pure session state machine and view-model helpers.
//!
//! Owns the discovered video sequence, the selection set and the fetch
//! cursor; everything with side effects lives behind [`Effect`] values
//! executed by the caller.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    normalize_profile_url, DownloadMode, FetchCursor, InFlight, PaginationMode, Quality,
    SessionOptions, SessionState, VideoRef,
};
pub use update::update;
pub use view_model::{SessionViewModel, VideoRowView};
