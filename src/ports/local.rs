//! Local adapters for the collaborator ports
//!
//! Production wiring for the pieces this crate actually owns an adapter for:
//! a directory-backed file source for the demo/batch mode, a tracing-backed
//! publisher, and a tracing-backed counter emitter.

use crate::ports::{EventPublisher, FileSource, ReconMetrics, RemoteFile};
use crate::types::{ReconError, SettlementUpdate};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// File source reading settlement batches from a local directory tree
///
/// Mirrors the remote list/get contract over `tokio::fs`; the configured
/// remote directory becomes a subdirectory under `root`.
#[derive(Debug, Clone)]
pub struct LocalDirSource {
    root: PathBuf,
}

impl LocalDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalDirSource { root: root.into() }
    }

    fn dir_path(&self, directory: &str) -> PathBuf {
        self.root.join(directory)
    }
}

#[async_trait]
impl FileSource for LocalDirSource {
    async fn list(&self, directory: &str) -> Result<Vec<RemoteFile>, ReconError> {
        let path = self.dir_path(directory);
        let mut entries = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| ReconError::file_access(directory, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ReconError::file_access(directory, e))?
        {
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                files.push(RemoteFile::new(entry.file_name().to_string_lossy()));
            }
        }
        // Directory iteration order is filesystem-dependent; sort so sweeps
        // are reproducible.
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn get(&self, directory: &str, name: &str) -> Result<Vec<u8>, ReconError> {
        let path = self.dir_path(directory).join(name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| ReconError::file_access(name, e))
    }
}

/// Publisher that writes settlement updates to the structured log
///
/// Stands in for the real event bus in the demo/batch mode; the payload is
/// the same JSON the bus adapter would send.
#[derive(Debug, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, update: SettlementUpdate) -> Result<(), ReconError> {
        let payload = serde_json::to_string(&update)
            .map_err(|e| ReconError::publish(&update.external_id, e))?;
        info!(target: "settlement_updates", %payload, "settlement update");
        Ok(())
    }
}

/// Metrics adapter emitting counters on a dedicated log target
///
/// Counter increments go out as structured events on the
/// `settlement_metrics` target, where the log pipeline scrapes them.
#[derive(Debug, Default)]
pub struct LogMetrics;

impl ReconMetrics for LogMetrics {
    fn increment(&self, name: &str, tags: &[(&str, &str)]) {
        let tags = tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        info!(target: "settlement_metrics", counter = name, %tags, "increment");
    }
}
