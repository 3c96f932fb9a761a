//! Graph cache and rebuild coordination
//!
//! Serves the routing graph for the current topology, rebuilding it at most
//! once per topology change across every task and process sharing a cache
//! directory.
//!
//! Lookup order on each call:
//!
//! 1. The in-memory graph, if its generation matches the current identity.
//! 2. An artifact for the current identity already on disk, written by
//!    another process.
//! 3. A rebuild under the in-process mutex and the cross-process file lock,
//!    both bounded by one deadline. Freshness is checked again once the locks
//!    are held.
//!
//! When a rebuild cannot proceed (lock timeout, store unreachable) the
//! previous graph keeps being served.

use crate::app::services::freshness::FreshnessOracle;
use crate::app::services::graph_builder::{self, BuildOptions, TransitGraph};
use crate::app::services::topology_store::TopologyStore;
use crate::config::CacheConfig;
use crate::constants::{ARTIFACT_DIR_NAME, LOCK_FILE_NAME};
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

pub mod artifact;
pub mod lock;

#[cfg(test)]
pub mod tests;

pub use artifact::ArtifactStore;
pub use lock::RebuildLock;

/// Cached routing graph with coordinated rebuilds
pub struct GraphCache {
    store: Arc<dyn TopologyStore>,
    config: CacheConfig,
    oracle: FreshnessOracle,
    build_options: BuildOptions,
    artifacts: ArtifactStore,
    current: RwLock<Option<Arc<TransitGraph>>>,
    rebuild_guard: Mutex<()>,
    rebuilds: AtomicU64,
}

impl std::fmt::Debug for GraphCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphCache")
            .field("cache_dir", &self.config.cache_dir)
            .field("freshness", &self.oracle.strategy())
            .field("generation", &self.generation())
            .field("rebuilds", &self.rebuild_count())
            .finish()
    }
}

impl GraphCache {
    /// Create a cache over a topology store
    ///
    /// Validates the configuration and creates the cache and artifact
    /// directories. No graph is built until the first request.
    pub fn new(store: Arc<dyn TopologyStore>, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let artifacts = ArtifactStore::new(&config.cache_dir);
        artifacts.ensure_dir()?;

        info!(
            "Graph cache at {} (freshness: {})",
            config.cache_dir.display(),
            config.freshness
        );

        Ok(Self {
            store,
            oracle: FreshnessOracle::new(config.freshness),
            build_options: BuildOptions::default().with_prune_isolated(config.prune_isolated),
            artifacts,
            config,
            current: RwLock::new(None),
            rebuild_guard: Mutex::new(()),
            rebuilds: AtomicU64::new(0),
        })
    }

    /// Graph for the current topology
    ///
    /// # Errors
    /// Only when no graph has ever been served and none can be produced now:
    /// * `Error::LockTimeout` if the rebuild lock stayed held past the deadline
    /// * `Error::TopologyUnavailable` if the store could not be read
    pub async fn get_current_graph(&self) -> Result<Arc<TransitGraph>> {
        let identity = match self.oracle.current_identity(self.store.as_ref()).await {
            Ok(identity) => identity,
            Err(e) => return self.fallback_after(e),
        };

        if let Some(graph) = self.fresh_in_memory(&identity) {
            return Ok(graph);
        }
        if let Some(graph) = self.adopt_artifact(&identity) {
            return Ok(graph);
        }

        match self.rebuild().await {
            Ok(graph) => Ok(graph),
            Err(e) => self.fallback_after(e),
        }
    }

    /// Public URL of the current map artifact
    ///
    /// Falls back to the configured station-list URL whenever no artifact can
    /// be served.
    pub async fn get_artifact_url(&self) -> String {
        match self.get_current_graph().await {
            Ok(graph) if self.artifacts.exists(&graph.generation) => format!(
                "{}/{}/{}",
                self.config.media_url.trim_end_matches('/'),
                ARTIFACT_DIR_NAME,
                ArtifactStore::file_name(&graph.generation)
            ),
            Ok(graph) => {
                warn!(
                    "Artifact for generation {} is missing, serving fallback URL",
                    graph.generation
                );
                self.config.fallback_url.clone()
            }
            Err(e) => {
                warn!("No map available ({}), serving fallback URL", e);
                self.config.fallback_url.clone()
            }
        }
    }

    /// Number of rebuilds this cache has performed
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::SeqCst)
    }

    /// Generation of the graph currently held in memory
    pub fn generation(&self) -> Option<String> {
        self.cached().map(|graph| graph.generation.clone())
    }

    /// Graph currently held in memory, without any freshness check
    pub fn cached(&self) -> Option<Arc<TransitGraph>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Cache settings
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Persisted artifact directory
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Path of the cross-process rebuild lock file
    pub fn lock_path(&self) -> PathBuf {
        self.config.cache_dir.join(LOCK_FILE_NAME)
    }

    fn install(&self, graph: Arc<TransitGraph>) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(graph);
    }

    fn fresh_in_memory(&self, identity: &str) -> Option<Arc<TransitGraph>> {
        self.cached().filter(|graph| graph.generation == identity)
    }

    fn adopt_artifact(&self, identity: &str) -> Option<Arc<TransitGraph>> {
        match self.artifacts.load(identity) {
            Ok(Some(graph)) => {
                debug!("Adopted artifact for generation {}", identity);
                let graph = Arc::new(graph);
                self.install(graph.clone());
                Some(graph)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unusable artifact: {}", e);
                None
            }
        }
    }

    async fn rebuild(&self) -> Result<Arc<TransitGraph>> {
        let timeout = self.config.lock_timeout();
        let deadline = Instant::now() + timeout;
        let lock_path = self.lock_path();

        let _guard = tokio::time::timeout_at(deadline, self.rebuild_guard.lock())
            .await
            .map_err(|_| Error::lock_timeout(lock_path.display().to_string(), timeout))?;
        let _lock =
            RebuildLock::acquire(&lock_path, deadline, self.config.lock_poll_interval()).await?;

        // Someone else may have finished while we waited
        let identity = self.oracle.current_identity(self.store.as_ref()).await?;
        if let Some(graph) = self.fresh_in_memory(&identity) {
            return Ok(graph);
        }
        if let Some(graph) = self.adopt_artifact(&identity) {
            return Ok(graph);
        }

        let started = std::time::Instant::now();
        let snapshot = self.store.snapshot().await?;
        let generation = self.oracle.identity_of(&snapshot);
        let graph = graph_builder::build(&snapshot, generation, &self.build_options);
        let path = self.artifacts.write_atomic(&graph)?;

        let graph = Arc::new(graph);
        self.install(graph.clone());
        self.rebuilds.fetch_add(1, Ordering::SeqCst);

        info!(
            "Rebuilt graph generation {} from topology version {} ({} stations, {} connections) in {:.2?}",
            graph.generation,
            snapshot.version,
            graph.node_count(),
            graph.connection_count(),
            started.elapsed()
        );
        debug!("Artifact written to {}", path.display());

        // Flags on rows modified after the snapshot stay set for the next rebuild
        match self.store.clear_dirty(snapshot.version).await {
            Ok(cleared) => debug!("Cleared {} dirty flag(s)", cleared),
            Err(e) => warn!("Failed to clear dirty flags: {}", e),
        }

        self.artifacts.prune_except(&graph.generation);
        Ok(graph)
    }

    fn fallback_after(&self, err: Error) -> Result<Arc<TransitGraph>> {
        match &err {
            Error::LockTimeout { .. } => warn!("Graph rebuild skipped: {}", err),
            _ => error!("Graph rebuild aborted: {}", err),
        }

        match self.cached() {
            Some(graph) => {
                warn!("Serving previous graph generation {}", graph.generation);
                Ok(graph)
            }
            None => Err(err),
        }
    }
}
