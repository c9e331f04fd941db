// Snapshot sources
// The seam where the external data pipeline delivers cleaned snapshots

use anyhow::{Context, Result};
use common::IndicatorSnapshot;
use std::path::PathBuf;

/// Supplies one cycle's worth of snapshots, already cleaned and
/// deduplicated by key.
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<IndicatorSnapshot>>;
}

/// Reads a JSON array of snapshots from disk each cycle. Stands in for
/// the fetch pipeline: whatever writes the file owns acquisition and
/// cleaning.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for JsonFileSource {
    async fn fetch(&self) -> Result<Vec<IndicatorSnapshot>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read snapshots from {}", self.path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("malformed snapshot file {}", self.path.display()))
    }
}

/// Fixed in-memory source for tests and development.
#[derive(Default)]
pub struct StaticSource {
    snapshots: Vec<IndicatorSnapshot>,
}

impl StaticSource {
    pub fn new(snapshots: Vec<IndicatorSnapshot>) -> Self {
        Self { snapshots }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<IndicatorSnapshot>> {
        Ok(self.snapshots.clone())
    }
}
