//! Persistence seam.
//!
//! Storage belongs to an external collaborator; the session only pushes and
//! pulls an opaque JSON-serializable snapshot through the `SnapshotStore`
//! trait. `JsonFileStore` is the file-backed implementation used by the CLI
//! and tests.

use core_ranges::PastedRangeSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// What gets persisted alongside a document: the text and the paste
/// provenance. `pasted_ranges` serializes as an array of `{start, end}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub text: String,
    pub pasted_ranges: PastedRangeSet,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Io(#[from] io::Error),
    #[error("malformed snapshot: {0}")]
    Format(#[from] serde_json::Error),
}

pub trait SnapshotStore {
    /// Read the persisted snapshot; `Ok(None)` when nothing was stored yet.
    fn load(&self) -> Result<Option<DocumentSnapshot>, StoreError>;
    fn save(&self, snapshot: &DocumentSnapshot) -> Result<(), StoreError>;
}

/// Snapshot store backed by a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<DocumentSnapshot>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &DocumentSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
