//! In-process topology store
//!
//! Holds the topology behind a read-write lock. Intended for embedding the
//! engine in a single process and for tests.

use super::{TopologyState, TopologyStore};
use crate::app::models::{Line, Station, TopologySnapshot};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Topology store kept entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryTopologyStore {
    state: RwLock<TopologyState>,
}

impl InMemoryTopologyStore {
    /// Create an empty store at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from existing state
    pub fn from_state(state: TopologyState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TopologyState>> {
        self.state
            .read()
            .map_err(|_| Error::topology_unavailable("in-memory topology lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TopologyState>> {
        self.state
            .write()
            .map_err(|_| Error::topology_unavailable("in-memory topology lock poisoned"))
    }

    /// Apply a mutation under the write lock
    pub fn mutate<T>(&self, f: impl FnOnce(&mut TopologyState) -> Result<T>) -> Result<T> {
        let mut state = self.write()?;
        let result = f(&mut state)?;
        debug!("Topology mutated, now at version {}", state.version);
        Ok(result)
    }

    /// Insert or replace a station
    pub fn upsert_station(&self, station: Station) -> Result<()> {
        self.mutate(|state| state.upsert_station(station))
    }

    /// Insert or replace a line
    pub fn upsert_line(&self, line: Line) -> Result<()> {
        self.mutate(|state| state.upsert_line(line))
    }

    /// Record a symmetric neighbour connection
    pub fn connect(&self, a: &str, b: &str) -> Result<()> {
        self.mutate(|state| state.connect(a, b))
    }

    /// Remove a symmetric neighbour connection
    pub fn disconnect(&self, a: &str, b: &str) -> Result<()> {
        self.mutate(|state| state.disconnect(a, b))
    }

    /// Add a station to a line
    pub fn assign_line(&self, station: &str, line: &str) -> Result<()> {
        self.mutate(|state| state.assign_line(station, line))
    }

    /// Set a line's service state
    pub fn set_line_running(&self, name: &str, is_running: bool) -> Result<bool> {
        self.mutate(|state| state.set_line_running(name, is_running))
    }

    /// Flip a line's service state
    pub fn toggle_line_running(&self, name: &str) -> Result<bool> {
        self.mutate(|state| state.toggle_line_running(name))
    }

    /// Flip a line's ticket purchase eligibility
    pub fn toggle_ticket_purchase(&self, name: &str) -> Result<bool> {
        self.mutate(|state| state.toggle_ticket_purchase(name))
    }

    /// Increase a station's footfall counter
    pub fn record_footfall(&self, station: &str, count: u64) -> Result<u64> {
        self.mutate(|state| state.record_footfall(station, count))
    }

    /// Delete a station
    pub fn remove_station(&self, name: &str) -> Result<()> {
        self.mutate(|state| state.remove_station(name))
    }

    /// Delete a line
    pub fn remove_line(&self, name: &str) -> Result<()> {
        self.mutate(|state| state.remove_line(name))
    }

    /// Copy of a station row
    pub fn station(&self, name: &str) -> Result<Option<Station>> {
        Ok(self.read()?.stations.get(name).cloned())
    }

    /// Copy of a line row
    pub fn line(&self, name: &str) -> Result<Option<Line>> {
        Ok(self.read()?.lines.get(name).cloned())
    }
}

#[async_trait]
impl TopologyStore for InMemoryTopologyStore {
    async fn version(&self) -> Result<u64> {
        Ok(self.read()?.version)
    }

    async fn snapshot(&self) -> Result<TopologySnapshot> {
        Ok(self.read()?.snapshot())
    }

    async fn clear_dirty(&self, up_to_version: u64) -> Result<usize> {
        let cleared = self.write()?.clear_dirty(up_to_version);
        debug!(
            "Cleared {} dirty rows up to version {}",
            cleared, up_to_version
        );
        Ok(cleared)
    }
}
