use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub type RequestId = u64;

/// Requested rendition, serialized to the backend's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Quality {
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Best => "best",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
        }
    }
}

/// One listed video as the backend reports it. Some backend variants send
/// bare URL strings, others `{url, thumbnail}` objects; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "WireVideo")]
pub struct VideoEntry {
    pub url: String,
    pub thumbnail: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireVideo {
    Url(String),
    Item {
        url: String,
        #[serde(default)]
        thumbnail: Option<String>,
    },
}

impl From<WireVideo> for VideoEntry {
    fn from(wire: WireVideo) -> Self {
        match wire {
            WireVideo::Url(url) => Self {
                url,
                thumbnail: None,
            },
            WireVideo::Item { url, thumbnail } => Self { url, thumbnail },
        }
    }
}

/// Complete listing from the one-shot profile scrape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfilePage {
    pub videos: Vec<VideoEntry>,
    #[serde(alias = "total_videos")]
    pub total: usize,
}

/// One bounded batch of the listing. `count == 0` signals completion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileChunk {
    pub videos: Vec<VideoEntry>,
    pub offset: usize,
    pub count: usize,
}

/// Raw media bytes as received, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub bytes: bytes::Bytes,
    /// Name the backend suggested via `Content-Disposition`, if any.
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// A media file written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedMedia {
    pub index: Option<usize>,
    pub path: PathBuf,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferProgress {
    pub request_id: RequestId,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(TransferProgress),
    RequestCompleted {
        request_id: RequestId,
        result: Result<RequestOutcome, BackendError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Listing(ProfilePage),
    Chunk(ProfileChunk),
    Video(SavedMedia),
    Zip(SavedMedia),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    MalformedResponse,
    Persist,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Persist => write!(f, "persist error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
