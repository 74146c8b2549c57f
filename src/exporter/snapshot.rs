// file: src/exporter/snapshot.rs
// description: json snapshot of crawled listing records
// reference: serde_json file persistence between crawl and reconcile

use crate::error::{PipelineError, Result};
use crate::models::RawRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Pretty-printed JSON array of raw records, the hand-off between a crawl and
/// a reconcile run.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, records: &[RawRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| PipelineError::file(parent, e))?;
        }

        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json).map_err(|e| PipelineError::file(&self.path, e))?;

        info!("Stored {} records in {}", records.len(), self.path.display());
        Ok(())
    }

    pub fn read(&self) -> Result<Vec<RawRecord>> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| PipelineError::file(&self.path, e))?;
        let records: Vec<RawRecord> = serde_json::from_str(&content)?;

        info!("Read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}
