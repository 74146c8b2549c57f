// file: src/exporter/change_log.rs
// description: per-run audit file of field-level changes
// reference: timestamped json audit files, one per run

use crate::error::{PipelineError, Result};
use crate::models::ChangeLogEntry;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FILE_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone)]
pub struct ChangeLogWriter {
    dir: PathBuf,
}

impl ChangeLogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes `entries` to `<dir>/<start time>-log.json` and returns the path.
    /// Nothing is written for an empty run. An existing file is never
    /// overwritten; a numeric suffix is appended instead.
    pub fn write(
        &self,
        entries: &[ChangeLogEntry],
        started_at: DateTime<FixedOffset>,
    ) -> Result<Option<PathBuf>> {
        if entries.is_empty() {
            debug!("No changes to log");
            return Ok(None);
        }

        fs::create_dir_all(&self.dir).map_err(|e| PipelineError::file(&self.dir, e))?;

        let stamp = started_at.format(FILE_STAMP_FORMAT).to_string();
        let mut attempt = 0u32;
        loop {
            let path = self.candidate_path(&stamp, attempt);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    write_or_remove(file, &path, entries)?;
                    info!("Wrote {} change log entries to {}", entries.len(), path.display());
                    return Ok(Some(path));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(PipelineError::file(&path, e)),
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidate_path(&self, stamp: &str, attempt: u32) -> PathBuf {
        if attempt == 0 {
            self.dir.join(format!("{stamp}-log.json"))
        } else {
            self.dir.join(format!("{stamp}-{attempt}-log.json"))
        }
    }
}

/// Serializes `payload` into the freshly created `file`. A file left
/// half-written is removed before the error is returned.
fn write_or_remove<T: Serialize + ?Sized>(file: File, path: &Path, payload: &T) -> Result<()> {
    let mut writer = BufWriter::new(file);
    let written = serde_json::to_writer_pretty(&mut writer, payload)
        .map_err(PipelineError::from)
        .and_then(|()| writer.flush().map_err(|e| PipelineError::file(path, e)));

    if written.is_err() {
        drop(writer);
        if let Err(e) = fs::remove_file(path) {
            warn!("Could not remove partial change log {}: {}", path.display(), e);
        }
    }

    written
}
