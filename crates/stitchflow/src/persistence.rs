//! Snapshot persistence.
//!
//! The engine persists the plain [`Snapshot`] form of its graph. Storage is
//! abstracted behind [`SnapshotStore`]; [`JsonFileStore`] keeps the snapshot
//! in a pretty-printed JSON file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};

use stitchflow_core::snapshot::Snapshot;

use crate::error::StitchflowError;

/// Where snapshots are loaded from and saved to.
pub trait SnapshotStore {
    fn load(&self) -> Result<Snapshot, StitchflowError>;

    fn save(&self, snapshot: &Snapshot) -> Result<(), StitchflowError>;
}

/// A snapshot kept as JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Snapshot, StitchflowError> {
        debug!(path:? = self.path; "Loading snapshot");
        let content = fs::read_to_string(&self.path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        info!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len();
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StitchflowError> {
        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, content)?;
        info!(path:? = self.path; "Snapshot saved");
        Ok(())
    }
}
