//! Grab engine: backend client and effect execution.
mod backend;
mod engine;
mod filename;
mod persist;
mod types;

pub use backend::{Backend, BackendSettings, ChannelProgressSink, ProgressSink, ReqwestBackend};
pub use engine::{EngineConfig, EngineHandle};
pub use filename::{media_extension, profile_handle, video_filename, zip_filename};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{
    BackendError, EngineEvent, FailureKind, MediaPayload, ProfileChunk, ProfilePage, Quality,
    RequestId, RequestOutcome, SavedMedia, TransferProgress, VideoEntry,
};
