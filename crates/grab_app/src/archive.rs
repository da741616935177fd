//! RON archive of completed downloads, kept next to the media files so a
//! re-run of the same profile never fetches a video twice.

use std::fs;
use std::path::Path;

use grab_engine::AtomicFileWriter;
use grab_logging::{grab_info, grab_warn};
use serde::{Deserialize, Serialize};

const ARCHIVE_FILENAME: &str = ".grab_archive.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArchivedDownload {
    url: String,
    saved_utc: String,
    bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ArchiveFile {
    downloaded: Vec<ArchivedDownload>,
}

/// In-memory view of the archive for one run.
#[derive(Debug, Default)]
pub struct DownloadArchive {
    entries: Vec<ArchivedDownload>,
}

impl DownloadArchive {
    /// Loads the archive from `output_dir`. A missing file is an empty
    /// archive; an unreadable or unparsable one degrades to empty with a
    /// warning rather than blocking the run.
    pub fn load(output_dir: &Path) -> Self {
        let path = output_dir.join(ARCHIVE_FILENAME);
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Self::default();
            }
            Err(err) => {
                grab_warn!("Failed to read download archive from {:?}: {}", path, err);
                return Self::default();
            }
        };

        let file: ArchiveFile = match ron::from_str(&content) {
            Ok(file) => file,
            Err(err) => {
                grab_warn!("Failed to parse download archive from {:?}: {}", path, err);
                return Self::default();
            }
        };

        grab_info!(
            "Loaded download archive with {} entries from {:?}",
            file.downloaded.len(),
            path
        );
        Self {
            entries: file.downloaded,
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|entry| entry.url == url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records one completed download with the current UTC timestamp.
    pub fn record(&mut self, url: impl Into<String>, bytes: u64) {
        self.entries.push(ArchivedDownload {
            url: url.into(),
            saved_utc: chrono::Utc::now().to_rfc3339(),
            bytes,
        });
    }

    /// Writes the archive back atomically.
    pub fn save(&self, output_dir: &Path) {
        let file = ArchiveFile {
            downloaded: self.entries.clone(),
        };
        let pretty = ron::ser::PrettyConfig::new();
        let content = match ron::ser::to_string_pretty(&file, pretty) {
            Ok(text) => text,
            Err(err) => {
                grab_warn!("Failed to serialize download archive: {}", err);
                return;
            }
        };

        let writer = AtomicFileWriter::new(output_dir.to_path_buf());
        if let Err(err) = writer.write(ARCHIVE_FILENAME, content.as_bytes()) {
            grab_warn!(
                "Failed to write download archive to {:?}: {}",
                output_dir,
                err
            );
        }
    }
}
