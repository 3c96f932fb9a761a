//! Persisted graph artifacts
//!
//! One JSON file per generation under `<cache_dir>/maps/`. Files are written
//! to a temporary name in the same directory and renamed into place, so a
//! reader either sees a complete artifact or none at all.

use crate::app::services::graph_builder::TransitGraph;
use crate::constants::{ARTIFACT_DIR_NAME, ARTIFACT_EXTENSION, ARTIFACT_TEMP_PREFIX};
use crate::{Error, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory of persisted graph artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Artifact directory inside a cache directory
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            dir: cache_dir.join(ARTIFACT_DIR_NAME),
        }
    }

    /// Directory holding the artifacts
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name of the artifact for a generation
    pub fn file_name(generation: &str) -> String {
        format!("{}.{}", generation, ARTIFACT_EXTENSION)
    }

    /// Canonical path of the artifact for a generation
    pub fn path_for(&self, generation: &str) -> PathBuf {
        self.dir.join(Self::file_name(generation))
    }

    /// Whether a completed artifact exists for a generation
    pub fn exists(&self, generation: &str) -> bool {
        self.path_for(generation).is_file()
    }

    /// Create the artifact directory
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::io(
                format!("Failed to create artifact directory '{}'", self.dir.display()),
                e,
            )
        })
    }

    /// Load the artifact for a generation
    ///
    /// Returns `Ok(None)` when no artifact exists. An artifact that does not
    /// parse, or that names a different generation, is `Error::CorruptArtifact`.
    pub fn load(&self, generation: &str) -> Result<Option<TransitGraph>> {
        let path = self.path_for(generation);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::io(
                    format!("Failed to read artifact '{}'", path.display()),
                    e,
                ));
            }
        };

        let origin = path.display().to_string();
        let graph = TransitGraph::from_json_slice(&bytes, &origin)?;
        if graph.generation != generation {
            return Err(Error::corrupt_artifact(
                origin,
                format!(
                    "artifact names generation '{}' but is stored as '{}'",
                    graph.generation, generation
                ),
            ));
        }
        Ok(Some(graph))
    }

    /// Write a graph's artifact atomically, replacing any previous file
    pub fn write_atomic(&self, graph: &TransitGraph) -> Result<PathBuf> {
        self.ensure_dir()?;
        let bytes = graph.to_json_bytes()?;
        let target = self.path_for(&graph.generation);

        let mut temp = Builder::new()
            .prefix(ARTIFACT_TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| Error::io("Failed to create temporary artifact", e))?;
        temp.write_all(&bytes)
            .map_err(|e| Error::io("Failed to write temporary artifact", e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| Error::io("Failed to sync temporary artifact", e))?;
        temp.persist(&target).map_err(|e| {
            Error::io(
                format!("Failed to rename artifact into '{}'", target.display()),
                e.error,
            )
        })?;

        debug!("Wrote artifact {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }

    /// Remove artifacts of other generations and orphaned temporary files
    ///
    /// Must only run while the rebuild lock is held. Best effort: failures
    /// are logged and skipped. Returns the number of files removed.
    pub fn prune_except(&self, generation: &str) -> usize {
        let keep = Self::file_name(generation);
        let mut removed = 0;

        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            let name = entry.file_name().to_string_lossy();
            let is_artifact = name.ends_with(&format!(".{}", ARTIFACT_EXTENSION));
            let is_orphan = name.starts_with(ARTIFACT_TEMP_PREFIX);
            if name == keep || !(is_artifact || is_orphan) {
                continue;
            }

            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    "Failed to remove stale artifact {}: {}",
                    entry.path().display(),
                    e
                ),
            }
        }

        if removed > 0 {
            debug!("Pruned {} stale artifact file(s)", removed);
        }
        removed
    }
}
