//! JSON document topology store
//!
//! Persists the whole topology as a single JSON document. Every mutation is a
//! read-modify-write under an advisory lock on a sibling `.lock` file, and the
//! document is replaced by writing a temporary file and renaming it over the
//! original, so readers never see a partial document.

use super::{TopologyState, TopologyStore};
use crate::app::models::TopologySnapshot;
use crate::{Error, Result};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Topology store backed by a JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonFileTopologyStore {
    path: PathBuf,
}

impl JsonFileTopologyStore {
    /// Create a store for the given document path (the file may not exist yet)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the JSON document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .unwrap_or_default()
            .to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Read the document; a missing or unparseable file means the store is unavailable
    pub fn load(&self) -> Result<TopologyState> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::topology_unavailable_from(
                format!("cannot read topology document '{}'", self.path.display()),
                e,
            )
        })?;

        serde_json::from_str(&content).map_err(|e| {
            Error::topology_unavailable_from(
                format!("cannot parse topology document '{}'", self.path.display()),
                e,
            )
        })
    }

    fn load_or_default(&self) -> Result<TopologyState> {
        if self.path.exists() {
            self.load()
        } else {
            debug!(
                "Topology document {} does not exist yet, starting empty",
                self.path.display()
            );
            Ok(TopologyState::default())
        }
    }

    fn save(&self, state: &TopologyState) -> Result<()> {
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| {
            Error::io(
                format!("Failed to create topology directory '{}'", parent.display()),
                e,
            )
        })?;

        let temp = NamedTempFile::new_in(&parent)
            .map_err(|e| Error::io("Failed to create temporary topology file", e))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, state)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| {
            Error::io(
                format!("Failed to replace topology document '{}'", self.path.display()),
                e.error,
            )
        })?;
        Ok(())
    }

    /// Apply a mutation as a locked read-modify-write of the document
    pub fn mutate<T>(&self, f: impl FnOnce(&mut TopologyState) -> Result<T>) -> Result<T> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let lock_file: File = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| {
                Error::io(
                    format!("Failed to open topology lock '{}'", lock_path.display()),
                    e,
                )
            })?;
        lock_file.lock_exclusive()?;

        let outcome = self.load_or_default().and_then(|mut state| {
            let value = f(&mut state)?;
            self.save(&state)?;
            debug!("Topology document now at version {}", state.version);
            Ok(value)
        });

        FileExt::unlock(&lock_file)?;
        outcome
    }

    /// Run [`mutate`](Self::mutate) on the blocking thread pool
    ///
    /// Async callers must use this rather than `mutate`, which waits on a file
    /// lock and does synchronous I/O.
    pub async fn mutate_async<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut TopologyState) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.mutate(f))
            .await
            .map_err(|e| Error::topology_unavailable_from("topology write task failed", e))?
    }

    /// Replace the document wholesale (used by the importer)
    pub fn replace(&self, state: &TopologyState) -> Result<()> {
        self.mutate(|current| {
            *current = state.clone();
            Ok(())
        })?;
        info!(
            "Wrote topology with {} stations and {} lines to {}",
            state.stations.len(),
            state.lines.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl TopologyStore for JsonFileTopologyStore {
    async fn version(&self) -> Result<u64> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.load().map(|state| state.version))
            .await
            .map_err(|e| Error::topology_unavailable_from("topology read task failed", e))?
    }

    async fn snapshot(&self) -> Result<TopologySnapshot> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.load().map(|state| state.snapshot()))
            .await
            .map_err(|e| Error::topology_unavailable_from("topology read task failed", e))?
    }

    async fn clear_dirty(&self, up_to_version: u64) -> Result<usize> {
        self.mutate_async(move |state| Ok(state.clear_dirty(up_to_version)))
            .await
    }
}
