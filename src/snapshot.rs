//! Raw snapshot persistence.
//!
//! Every collector writes the normalized records it is about to load as
//! JSON files under the data root, one file per resource key, overwritten
//! wholesale on the next run. The snapshots make a database reload possible
//! without re-fetching anything upstream.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes JSON snapshots under a fixed root directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Serialize `data` to `<root>/<rel>`, creating parent directories and
    /// replacing any previous snapshot for the same key.
    pub fn write<T: Serialize>(&self, rel: &str, data: &T) -> Result<()> {
        let path = self.path_for(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create snapshot dir {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(data)
            .with_context(|| format!("Failed to serialize snapshot {rel}"))?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        debug!(path = %path.display(), "Snapshot written");
        Ok(())
    }

    pub fn exists(&self, rel: &str) -> bool {
        Path::new(&self.path_for(rel)).exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
