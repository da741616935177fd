//! Synchronous driver: feeds messages through the core update function and
//! executes the resulting effects against the engine, one at a time.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail};
use grab_core::{
    update, DownloadMode, Effect, InFlight, Msg, PaginationMode, SessionOptions, SessionState,
    VideoRef,
};
use grab_engine::{
    profile_handle, BackendSettings, EngineConfig, EngineEvent, EngineHandle, RequestId,
    RequestOutcome, VideoEntry,
};
use grab_logging::{grab_debug, grab_info, grab_warn};

use crate::archive::DownloadArchive;
use crate::cli::{parse_selection, Args, ModeArg, QualityArg, SelectSpec};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug)]
pub struct Summary {
    pub video_count: usize,
    pub selected_count: usize,
    pub saved_count: usize,
    pub skipped_archived: usize,
    pub zip_path: Option<PathBuf>,
}

pub fn run(args: &Args) -> anyhow::Result<Summary> {
    let selection = parse_selection(&args.select).map_err(|err| anyhow!(err))?;

    let options = SessionOptions {
        pagination: match args.mode {
            ModeArg::Chunked => PaginationMode::Chunked {
                chunk_size: args.chunk_size.max(1),
            },
            ModeArg::All => PaginationMode::AllAtOnce,
        },
        auto_select_on_fetch: false,
        download: if args.zip {
            DownloadMode::Zip
        } else {
            DownloadMode::Single
        },
        quality: core_quality(args.quality),
    };

    let config = EngineConfig {
        settings: BackendSettings {
            base_url: args.backend_url.clone(),
            ..BackendSettings::default()
        },
        output_dir: args.out.clone(),
    };
    let engine = EngineHandle::new(config).map_err(|err| anyhow!("engine init failed: {err}"))?;

    let mut driver = Driver {
        state: SessionState::new(options),
        engine,
        next_request_id: 0,
        downloads_started: 0,
        delay: Duration::from_millis(args.delay_ms),
        zip_label: profile_handle(&args.profile_url),
        zip_path: None,
        archive: DownloadArchive::load(&args.out),
    };

    driver.fetch_phase(args)?;
    let skipped_archived = driver.apply_selection(&selection, args.limit);
    let selected_count = driver.state.view().selected.len();
    driver.download_phase()?;
    driver.archive.save(&args.out);

    let view = driver.state.view();
    Ok(Summary {
        video_count: view.video_count,
        selected_count,
        saved_count: view.saved_count,
        skipped_archived,
        zip_path: driver.zip_path,
    })
}

struct Driver {
    state: SessionState,
    engine: EngineHandle,
    next_request_id: RequestId,
    downloads_started: usize,
    delay: Duration,
    zip_label: Option<String>,
    zip_path: Option<PathBuf>,
    archive: DownloadArchive,
}

impl Driver {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if self.state.consume_dirty() {
            let view = self.state.view();
            grab_debug!(
                "session: videos={} selected={} saved={} queued={}",
                view.video_count,
                view.selected.len(),
                view.saved_count,
                view.queued_downloads
            );
        }
        self.execute(effects);
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.next_request_id += 1;
            let request_id = self.next_request_id;
            match effect {
                Effect::FetchProfile { profile_url } => {
                    grab_info!("Scraping full listing for {}", profile_url);
                    self.engine.fetch_listing(request_id, profile_url);
                }
                Effect::FetchChunk {
                    profile_url,
                    offset,
                    limit,
                } => {
                    grab_debug!("Requesting chunk offset={} limit={}", offset, limit);
                    self.engine.fetch_chunk(request_id, profile_url, offset, limit);
                }
                Effect::DownloadVideo {
                    index,
                    url,
                    quality,
                } => {
                    // Anti-block pause between consecutive downloads.
                    if self.downloads_started > 0 && !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                    self.downloads_started += 1;
                    grab_info!("Downloading video {}", index + 1);
                    self.engine
                        .download_video(request_id, index, url, engine_quality(quality));
                }
                Effect::DownloadZip { urls, quality } => {
                    grab_info!("Requesting ZIP bundle of {} videos", urls.len());
                    self.engine.download_zip(
                        request_id,
                        urls,
                        engine_quality(quality),
                        self.zip_label.clone(),
                    );
                }
            }
        }
    }

    /// Handles at most one engine event; sleeps briefly when none is ready.
    fn poll_once(&mut self) {
        let event = match self.engine.try_recv() {
            Some(event) => event,
            None => {
                thread::sleep(POLL_INTERVAL);
                return;
            }
        };

        match event {
            EngineEvent::Progress(progress) => {
                grab_debug!(
                    "transfer {}: {} bytes",
                    progress.request_id,
                    progress.bytes
                );
            }
            EngineEvent::RequestCompleted { result, .. } => match result {
                Ok(RequestOutcome::Chunk(chunk)) => {
                    let videos = convert_entries(chunk.videos);
                    self.dispatch(Msg::ChunkArrived {
                        offset: chunk.offset,
                        videos,
                    });
                }
                Ok(RequestOutcome::Listing(page)) => {
                    if page.total != page.videos.len() {
                        grab_warn!(
                            "backend advertised {} videos but delivered {}",
                            page.total,
                            page.videos.len()
                        );
                    }
                    let total = page.total;
                    let videos = convert_entries(page.videos);
                    self.dispatch(Msg::ListingArrived { videos, total });
                }
                Ok(RequestOutcome::Video(saved)) => {
                    if let Some(index) = saved.index {
                        if let Some(row) = self.state.view().rows.get(index) {
                            self.archive.record(row.url.clone(), saved.byte_len);
                        }
                        grab_info!("Saved {}", saved.path.display());
                        self.dispatch(Msg::VideoSaved { index });
                    }
                }
                Ok(RequestOutcome::Zip(saved)) => {
                    grab_info!("Saved {}", saved.path.display());
                    self.zip_path = Some(saved.path);
                    self.dispatch(Msg::ZipSaved);
                }
                Err(err) => {
                    let msg = match self.state.view().in_flight {
                        Some(InFlight::Video { .. }) | Some(InFlight::Zip) => Msg::DownloadFailed {
                            message: err.to_string(),
                        },
                        _ => Msg::FetchFailed {
                            message: err.to_string(),
                        },
                    };
                    self.dispatch(msg);
                }
            },
        }
    }

    fn fetch_phase(&mut self, args: &Args) -> anyhow::Result<()> {
        grab_info!(
            "Fetching video list for {} (quality {})",
            args.profile_url,
            self.state.options().quality.as_str()
        );
        self.dispatch(Msg::InputChanged(args.profile_url.clone()));
        match (args.mode, args.limit) {
            (ModeArg::All, _) => self.dispatch(Msg::FetchSubmitted),
            (ModeArg::Chunked, None) => self.dispatch(Msg::FetchAllRequested),
            // With a limit, step chunk by chunk so we can stop early.
            (ModeArg::Chunked, Some(_)) => self.dispatch(Msg::FetchSubmitted),
        }

        loop {
            let view = self.state.view();
            if let Some(error) = view.last_error {
                bail!("fetch failed: {error}");
            }
            if view.fetch_done {
                break;
            }
            if view.in_flight.is_none() {
                if let Some(limit) = args.limit {
                    if view.video_count >= limit {
                        break;
                    }
                }
                self.dispatch(Msg::FetchNextRequested);
                if self.state.view().in_flight.is_none() {
                    break;
                }
                continue;
            }
            self.poll_once();
        }

        grab_info!("{} videos discovered", self.state.view().video_count);
        Ok(())
    }

    /// Applies the `--select` spec, then prunes entries beyond `--limit`
    /// and entries already present in the download archive.
    fn apply_selection(&mut self, selection: &SelectSpec, limit: Option<usize>) -> usize {
        match selection {
            SelectSpec::All => self.dispatch(Msg::SelectAllClicked),
            SelectSpec::None => {}
            SelectSpec::Indices(indices) => {
                let count = self.state.view().video_count;
                for &index in indices {
                    if index >= count {
                        grab_warn!("--select index {} out of range ({} videos)", index, count);
                        continue;
                    }
                    self.dispatch(Msg::VideoToggled { index });
                }
            }
        }

        let mut skipped_archived = 0;
        let rows = self.state.view().rows;
        for row in rows {
            if !row.selected {
                continue;
            }
            let beyond_limit = limit.is_some_and(|limit| row.index >= limit);
            let archived = self.archive.contains(&row.url);
            if beyond_limit || archived {
                if archived && !beyond_limit {
                    skipped_archived += 1;
                }
                self.dispatch(Msg::VideoToggled { index: row.index });
            }
        }
        skipped_archived
    }

    fn download_phase(&mut self) -> anyhow::Result<()> {
        if self.state.view().selected.is_empty() {
            grab_info!("Nothing selected; skipping downloads");
            return Ok(());
        }

        self.dispatch(Msg::DownloadSelectedClicked);
        loop {
            let view = self.state.view();
            if let Some(error) = view.last_error {
                bail!("download failed: {error}");
            }
            if view.in_flight.is_none() && view.queued_downloads == 0 {
                break;
            }
            self.poll_once();
        }
        Ok(())
    }
}

fn convert_entries(entries: Vec<VideoEntry>) -> Vec<VideoRef> {
    entries
        .into_iter()
        .map(|entry| VideoRef {
            url: entry.url,
            thumbnail: entry.thumbnail,
        })
        .collect()
}

fn core_quality(arg: QualityArg) -> grab_core::Quality {
    match arg {
        QualityArg::Best => grab_core::Quality::Best,
        QualityArg::P720 => grab_core::Quality::P720,
        QualityArg::P480 => grab_core::Quality::P480,
    }
}

fn engine_quality(quality: grab_core::Quality) -> grab_engine::Quality {
    match quality {
        grab_core::Quality::Best => grab_engine::Quality::Best,
        grab_core::Quality::P720 => grab_engine::Quality::P720,
        grab_core::Quality::P480 => grab_engine::Quality::P480,
    }
}
