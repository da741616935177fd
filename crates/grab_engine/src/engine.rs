use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use grab_logging::{grab_debug, grab_warn};

use crate::backend::{Backend, ChannelProgressSink, ReqwestBackend};
use crate::filename;
use crate::persist::AtomicFileWriter;
use crate::{
    BackendError, BackendSettings, EngineEvent, FailureKind, MediaPayload, Quality, RequestId,
    RequestOutcome, SavedMedia,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub settings: BackendSettings,
    pub output_dir: PathBuf,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            settings: BackendSettings::default(),
            output_dir,
        }
    }
}

enum EngineCommand {
    FetchListing {
        request_id: RequestId,
        profile_url: String,
    },
    FetchChunk {
        request_id: RequestId,
        profile_url: String,
        offset: usize,
        limit: usize,
    },
    DownloadVideo {
        request_id: RequestId,
        index: usize,
        url: String,
        quality: Quality,
    },
    DownloadZip {
        request_id: RequestId,
        urls: Vec<String>,
        quality: Quality,
        label: Option<String>,
    },
}

pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    /// Spawns the worker thread. Commands run strictly one at a time:
    /// the next call starts only after the previous response (or failure)
    /// has been delivered, so batches apply in issue order.
    pub fn new(config: EngineConfig) -> Result<Self, BackendError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let backend = ReqwestBackend::new(config.settings)?;
        let writer = AtomicFileWriter::new(config.output_dir);

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                runtime.block_on(handle_command(&backend, &writer, command, &event_tx));
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn fetch_listing(&self, request_id: RequestId, profile_url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::FetchListing {
            request_id,
            profile_url: profile_url.into(),
        });
    }

    pub fn fetch_chunk(
        &self,
        request_id: RequestId,
        profile_url: impl Into<String>,
        offset: usize,
        limit: usize,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::FetchChunk {
            request_id,
            profile_url: profile_url.into(),
            offset,
            limit,
        });
    }

    pub fn download_video(
        &self,
        request_id: RequestId,
        index: usize,
        url: impl Into<String>,
        quality: Quality,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::DownloadVideo {
            request_id,
            index,
            url: url.into(),
            quality,
        });
    }

    pub fn download_zip(
        &self,
        request_id: RequestId,
        urls: Vec<String>,
        quality: Quality,
        label: Option<String>,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::DownloadZip {
            request_id,
            urls,
            quality,
            label,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

async fn handle_command(
    backend: &ReqwestBackend,
    writer: &AtomicFileWriter,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::FetchListing {
            request_id,
            profile_url,
        } => {
            grab_debug!("fetch_listing id={} profile={}", request_id, profile_url);
            let result = backend
                .fetch_listing(request_id, &profile_url)
                .await
                .map(RequestOutcome::Listing);
            complete(event_tx, request_id, result);
        }
        EngineCommand::FetchChunk {
            request_id,
            profile_url,
            offset,
            limit,
        } => {
            grab_debug!(
                "fetch_chunk id={} offset={} limit={} profile={}",
                request_id,
                offset,
                limit,
                profile_url
            );
            let result = backend
                .fetch_chunk(request_id, &profile_url, offset, limit)
                .await
                .map(RequestOutcome::Chunk);
            complete(event_tx, request_id, result);
        }
        EngineCommand::DownloadVideo {
            request_id,
            index,
            url,
            quality,
        } => {
            grab_debug!(
                "download_video id={} index={} quality={}",
                request_id,
                index,
                quality.as_str()
            );
            let sink = ChannelProgressSink::new(event_tx.clone());
            let result = match backend.fetch_video(request_id, &url, quality, &sink).await {
                Ok(payload) => {
                    let fallback = filename::video_filename(
                        Some(index),
                        &url,
                        filename::media_extension(payload.content_type.as_deref(), "mp4"),
                    );
                    save_media(writer, Some(index), fallback, payload).map(RequestOutcome::Video)
                }
                Err(err) => Err(err),
            };
            complete(event_tx, request_id, result);
        }
        EngineCommand::DownloadZip {
            request_id,
            urls,
            quality,
            label,
        } => {
            grab_debug!(
                "download_zip id={} videos={} quality={}",
                request_id,
                urls.len(),
                quality.as_str()
            );
            let sink = ChannelProgressSink::new(event_tx.clone());
            let result = match backend.fetch_zip(request_id, &urls, quality, &sink).await {
                Ok(payload) => {
                    let fallback = filename::zip_filename(label.as_deref(), &urls);
                    save_media(writer, None, fallback, payload).map(RequestOutcome::Zip)
                }
                Err(err) => Err(err),
            };
            complete(event_tx, request_id, result);
        }
    }
}

fn complete(
    event_tx: &mpsc::Sender<EngineEvent>,
    request_id: RequestId,
    result: Result<RequestOutcome, BackendError>,
) {
    if let Err(err) = &result {
        grab_warn!("request {} failed: {}", request_id, err);
    }
    let _ = event_tx.send(EngineEvent::RequestCompleted { request_id, result });
}

fn save_media(
    writer: &AtomicFileWriter,
    index: Option<usize>,
    fallback_name: String,
    payload: MediaPayload,
) -> Result<SavedMedia, BackendError> {
    let name = payload
        .filename
        .as_deref()
        .map(filename::sanitize_media_name)
        .unwrap_or(fallback_name);
    let path = writer
        .write(&name, &payload.bytes)
        .map_err(|err| BackendError::new(FailureKind::Persist, err.to_string()))?;
    Ok(SavedMedia {
        index,
        path,
        byte_len: payload.bytes.len() as u64,
    })
}
