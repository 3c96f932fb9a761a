//! Shared test utilities and fixtures for graph cache tests

use crate::app::models::{Line, Station, TopologySnapshot};
use crate::app::services::freshness::version_identity;
use crate::app::services::graph_cache::ArtifactStore;
use crate::app::services::topology_store::{InMemoryTopologyStore, TopologyStore};
use crate::config::CacheConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub mod lock_tests;

/// Cache config with timeouts short enough for tests
pub fn create_test_config(cache_dir: &Path) -> CacheConfig {
    CacheConfig::new(cache_dir)
        .with_lock_timeout(Duration::from_millis(300))
        .with_lock_poll_interval(Duration::from_millis(20))
}

/// Store holding A-B-C on the running "Red" line, at version 6
pub fn create_abc_store() -> InMemoryTopologyStore {
    let store = InMemoryTopologyStore::new();
    store
        .upsert_line(Line::new("Red", "#FF0000").unwrap())
        .unwrap();
    for name in ["A", "B", "C"] {
        store
            .upsert_station(Station::new(name).unwrap().with_lines(["Red"]))
            .unwrap();
    }
    store.connect("A", "B").unwrap();
    store.connect("B", "C").unwrap();
    store
}

/// Take the rebuild lock from outside the cache; released when dropped
pub fn hold_lock(path: &Path) -> File {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .unwrap();
    file.lock_exclusive().unwrap();
    file
}

/// Store wrapper that can be switched into an unreachable state
pub struct FlakyStore {
    pub inner: Arc<InMemoryTopologyStore>,
    unavailable: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<InMemoryTopologyStore>) -> Self {
        Self {
            inner,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(Error::topology_unavailable("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TopologyStore for FlakyStore {
    async fn version(&self) -> Result<u64> {
        self.check()?;
        self.inner.version().await
    }

    async fn snapshot(&self) -> Result<TopologySnapshot> {
        self.check()?;
        self.inner.snapshot().await
    }

    async fn clear_dirty(&self, up_to_version: u64) -> Result<usize> {
        self.check()?;
        self.inner.clear_dirty(up_to_version).await
    }
}

/// Store wrapper recording whether the artifact existed when flags were cleared
pub struct ObservingStore {
    pub inner: Arc<InMemoryTopologyStore>,
    artifacts: ArtifactStore,
    pub observed: Mutex<Vec<(u64, bool)>>,
}

impl ObservingStore {
    pub fn new(inner: Arc<InMemoryTopologyStore>, cache_dir: &Path) -> Self {
        Self {
            inner,
            artifacts: ArtifactStore::new(cache_dir),
            observed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TopologyStore for ObservingStore {
    async fn version(&self) -> Result<u64> {
        self.inner.version().await
    }

    async fn snapshot(&self) -> Result<TopologySnapshot> {
        self.inner.snapshot().await
    }

    async fn clear_dirty(&self, up_to_version: u64) -> Result<usize> {
        let exists = self.artifacts.exists(&version_identity(up_to_version));
        self.observed.lock().unwrap().push((up_to_version, exists));
        self.inner.clear_dirty(up_to_version).await
    }
}
