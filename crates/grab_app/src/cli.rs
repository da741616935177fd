use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "grab",
    about = "Scrape a profile's public video list via the backend and download selections"
)]
pub struct Args {
    /// Profile URL to scrape, e.g. https://www.tiktok.com/@username
    pub profile_url: String,

    /// Backend service base URL.
    #[arg(long, env = "GRAB_BACKEND_URL", default_value = "http://127.0.0.1:8000")]
    pub backend_url: String,

    /// Rendition to request for downloads.
    #[arg(long, value_enum, default_value_t = QualityArg::Best)]
    pub quality: QualityArg,

    /// Listing retrieval strategy.
    #[arg(long, value_enum, default_value_t = ModeArg::Chunked)]
    pub mode: ModeArg,

    /// Videos per chunk in chunked mode.
    #[arg(long, default_value_t = 20)]
    pub chunk_size: usize,

    /// Keep only the first N discovered videos.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Which videos to download: "all", "none", or comma-separated indices.
    #[arg(long, default_value = "all")]
    pub select: String,

    /// Bundle the selection into one ZIP instead of per-video files.
    #[arg(long)]
    pub zip: bool,

    /// Directory downloads are written to.
    #[arg(long, default_value = "downloads")]
    pub out: PathBuf,

    /// Pause between single-video downloads (anti-blocking).
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogArg::Terminal)]
    pub log: LogArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    Best,
    #[value(name = "720p")]
    P720,
    #[value(name = "480p")]
    P480,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Incremental chunked retrieval.
    Chunked,
    /// One long call for the whole listing.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogArg {
    Terminal,
    File,
    Both,
}

impl From<LogArg> for LogDestination {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::File => LogDestination::File,
            LogArg::Both => LogDestination::Both,
        }
    }
}

/// Which of the discovered videos to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectSpec {
    All,
    None,
    Indices(Vec<usize>),
}

/// Parses the `--select` argument: `all`, `none`, or `1,3,5`.
pub fn parse_selection(raw: &str) -> Result<SelectSpec, String> {
    match raw.trim() {
        "all" => Ok(SelectSpec::All),
        "none" => Ok(SelectSpec::None),
        trimmed => {
            let mut indices = Vec::new();
            for part in trimmed.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let index: usize = part
                    .parse()
                    .map_err(|_| format!("invalid selection index: {part:?}"))?;
                indices.push(index);
            }
            if indices.is_empty() {
                return Err(format!("nothing to select in {raw:?}"));
            }
            indices.sort_unstable();
            indices.dedup();
            Ok(SelectSpec::Indices(indices))
        }
    }
}
