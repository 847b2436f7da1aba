//! Snapshot sink: where rendered snapshots go.
//!
//! The core hands a finished snapshot to a sink by value and never retries;
//! a failed store fails the run loudly and re-triggering is external policy.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{OkrsnapError, Result};

/// Persistence boundary for rendered snapshots.
///
/// Cloud object storage lives behind this seam in deployments; the shipped
/// implementation is [`FileSink`]. Implementations must propagate every
/// persistence error, never silently drop data.
pub trait SnapshotSink {
    /// Store `bytes` under `logical_name`, returning a location identifier.
    fn store(&self, bytes: &[u8], logical_name: &str) -> Result<String>;
}

/// Local-filesystem sink. Snapshots land under `<root>/okrs/<name>`, the same
/// prefix the warehouse loader reads from object storage.
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SnapshotSink for FileSink {
    fn store(&self, bytes: &[u8], logical_name: &str) -> Result<String> {
        let dir = self.root.join("okrs");
        std::fs::create_dir_all(&dir)
            .map_err(|e| OkrsnapError::Sink(format!("create {}: {}", dir.display(), e)))?;

        let path = dir.join(logical_name);
        std::fs::write(&path, bytes)
            .map_err(|e| OkrsnapError::Sink(format!("write {}: {}", path.display(), e)))?;

        log::info!("Snapshot stored: {}", path.display());
        Ok(path.display().to_string())
    }
}

/// Find the most recent stored snapshot under `root`.
///
/// Snapshot names embed the capture stamp, so the lexicographically greatest
/// `export-*_processed.csv` is the latest run.
pub fn latest_snapshot(root: &Path) -> Result<PathBuf> {
    let mut latest: Option<PathBuf> = None;

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if !name.starts_with("export-") || !name.ends_with("_processed.csv") {
            continue;
        }
        let newer = match &latest {
            Some(current) => path.file_name() > current.file_name(),
            None => true,
        };
        if newer {
            latest = Some(path.to_path_buf());
        }
    }

    latest.ok_or_else(|| {
        OkrsnapError::Sink(format!("no snapshots found under {}", root.display()))
    })
}
