use std::sync::mpsc;
use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::Serialize;

use crate::{
    BackendError, EngineEvent, FailureKind, MediaPayload, ProfileChunk, ProfilePage, Quality,
    RequestId, TransferProgress,
};

/// Per-operation timeouts reflect how long each backend call legitimately
/// runs: a chunk is quick, a full-profile scrape takes minutes, and a ZIP
/// bundle of many videos can take the better part of an hour.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub chunk_timeout: Duration,
    pub listing_timeout: Duration,
    pub video_timeout: Duration,
    pub zip_timeout: Duration,
    pub max_payload_bytes: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            chunk_timeout: Duration::from_secs(30),
            listing_timeout: Duration::from_secs(900),
            video_timeout: Duration::from_secs(300),
            zip_timeout: Duration::from_secs(3600),
            max_payload_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// The remote scraping service, as the state manager consumes it.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_listing(
        &self,
        request_id: RequestId,
        profile_url: &str,
    ) -> Result<ProfilePage, BackendError>;

    async fn fetch_chunk(
        &self,
        request_id: RequestId,
        profile_url: &str,
        offset: usize,
        limit: usize,
    ) -> Result<ProfileChunk, BackendError>;

    async fn fetch_video(
        &self,
        request_id: RequestId,
        url: &str,
        quality: Quality,
        sink: &dyn ProgressSink,
    ) -> Result<MediaPayload, BackendError>;

    async fn fetch_zip(
        &self,
        request_id: RequestId,
        urls: &[String],
        quality: Quality,
        sink: &dyn ProgressSink,
    ) -> Result<MediaPayload, BackendError>;
}

#[derive(Serialize)]
struct ListingRequest<'a> {
    profile_url: &'a str,
}

#[derive(Serialize)]
struct ChunkRequest<'a> {
    profile_url: &'a str,
    offset: usize,
    limit: usize,
}

#[derive(Serialize)]
struct VideoRequest<'a> {
    url: &'a str,
    quality: Quality,
}

#[derive(Serialize)]
struct ZipRequest<'a> {
    urls: &'a [String],
    quality: Quality,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        url::Url::parse(&settings.base_url)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { settings, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<T, B>(&self, path: &str, body: &B, timeout: Duration) -> Result<T, BackendError>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize + Sync,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        response.json::<T>().await.map_err(map_reqwest_error)
    }

    async fn post_media<B>(
        &self,
        request_id: RequestId,
        path: &str,
        body: &B,
        timeout: Duration,
        sink: &dyn ProgressSink,
    ) -> Result<MediaPayload, BackendError>
    where
        B: Serialize + Sync,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_payload_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(BackendError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let filename = content_disposition_filename(response.headers());
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        sink.emit(EngineEvent::Progress(TransferProgress {
            request_id,
            bytes: 0,
        }));

        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = buffer.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(BackendError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            buffer.extend_from_slice(&chunk);
            sink.emit(EngineEvent::Progress(TransferProgress {
                request_id,
                bytes: buffer.len() as u64,
            }));
        }

        Ok(MediaPayload {
            bytes: buffer.freeze(),
            filename,
            content_type,
        })
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn fetch_listing(
        &self,
        _request_id: RequestId,
        profile_url: &str,
    ) -> Result<ProfilePage, BackendError> {
        self.post_json(
            "profile/all",
            &ListingRequest { profile_url },
            self.settings.listing_timeout,
        )
        .await
    }

    async fn fetch_chunk(
        &self,
        _request_id: RequestId,
        profile_url: &str,
        offset: usize,
        limit: usize,
    ) -> Result<ProfileChunk, BackendError> {
        self.post_json(
            "profile/chunk",
            &ChunkRequest {
                profile_url,
                offset,
                limit,
            },
            self.settings.chunk_timeout,
        )
        .await
    }

    async fn fetch_video(
        &self,
        request_id: RequestId,
        url: &str,
        quality: Quality,
        sink: &dyn ProgressSink,
    ) -> Result<MediaPayload, BackendError> {
        self.post_media(
            request_id,
            "video",
            &VideoRequest { url, quality },
            self.settings.video_timeout,
            sink,
        )
        .await
    }

    async fn fetch_zip(
        &self,
        request_id: RequestId,
        urls: &[String],
        quality: Quality,
        sink: &dyn ProgressSink,
    ) -> Result<MediaPayload, BackendError> {
        self.post_media(
            request_id,
            "zip",
            &ZipRequest { urls, quality },
            self.settings.zip_timeout,
            sink,
        )
        .await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return BackendError::new(FailureKind::MalformedResponse, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}

/// Pulls the suggested filename out of a `Content-Disposition` header,
/// e.g. `attachment; filename="clip.mp4"`.
fn content_disposition_filename(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    let (_, rest) = raw.split_once("filename=")?;
    let name = rest
        .split(';')
        .next()
        .unwrap_or(rest)
        .trim()
        .trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
