//! Topology store abstraction
//!
//! The relational store of stations, lines and neighbour capabilities lives
//! outside the engine. This module defines the read/clear contract the cache
//! depends on, the shared mutation logic that keeps dirty flags and the
//! topology version in step, and two concrete stores: an in-memory one for
//! embedding and tests, and a JSON document store used by the CLI.

use crate::app::models::{Line, Station, TopologySnapshot};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod import;
pub mod json_file;
pub mod memory;

#[cfg(test)]
pub mod tests;

// Re-export key types for convenience
pub use import::{ImportStats, TopologyImporter};
pub use json_file::JsonFileTopologyStore;
pub use memory::InMemoryTopologyStore;

/// Read access to the topology plus dirty-flag clearing
///
/// Implementations must return a snapshot whose `version` matches the rows it
/// contains, and must only clear flags on rows last modified at or before the
/// version passed to [`TopologyStore::clear_dirty`].
#[async_trait]
pub trait TopologyStore: Send + Sync {
    /// Current topology version; bumped by every mutation
    async fn version(&self) -> Result<u64>;

    /// Consistent read of every station and line
    async fn snapshot(&self) -> Result<TopologySnapshot>;

    /// Clear dirty flags on rows modified at or before `up_to_version`
    ///
    /// Returns the number of rows cleared.
    async fn clear_dirty(&self, up_to_version: u64) -> Result<usize>;
}

/// Mutable topology state shared by the concrete stores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyState {
    /// Monotonic topology version
    pub version: u64,

    /// Stations keyed by name
    pub stations: BTreeMap<String, Station>,

    /// Lines keyed by name
    pub lines: BTreeMap<String, Line>,

    /// Deleted rows leave nothing behind to carry a timestamp, so the last
    /// deletion time is kept here
    #[serde(default)]
    pub removed_at: Option<DateTime<Utc>>,
}

impl TopologyState {
    /// Whether the state holds no stations and no lines
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty() && self.lines.is_empty()
    }

    fn bump(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Insert or replace a station
    pub fn upsert_station(&mut self, mut station: Station) -> Result<()> {
        station.validate()?;
        let version = self.bump();
        station.touch(version);
        self.stations.insert(station.name.clone(), station);
        Ok(())
    }

    /// Insert or replace a line
    pub fn upsert_line(&mut self, mut line: Line) -> Result<()> {
        line.validate()?;
        let version = self.bump();
        line.touch(version);
        self.lines.insert(line.name.clone(), line);
        Ok(())
    }

    /// Set a line's service state; returns whether anything changed
    pub fn set_line_running(&mut self, name: &str, is_running: bool) -> Result<bool> {
        let current = self
            .lines
            .get(name)
            .ok_or_else(|| Error::line_not_found(name))?
            .is_running;
        if current == is_running {
            return Ok(false);
        }

        let version = self.bump();
        if let Some(line) = self.lines.get_mut(name) {
            line.is_running = is_running;
            line.touch(version);
        }
        Ok(true)
    }

    /// Flip a line's service state; returns the new state
    pub fn toggle_line_running(&mut self, name: &str) -> Result<bool> {
        let next = !self
            .lines
            .get(name)
            .ok_or_else(|| Error::line_not_found(name))?
            .is_running;
        self.set_line_running(name, next)?;
        Ok(next)
    }

    /// Flip a line's ticket purchase eligibility; returns the new state
    pub fn toggle_ticket_purchase(&mut self, name: &str) -> Result<bool> {
        if !self.lines.contains_key(name) {
            return Err(Error::line_not_found(name));
        }
        let version = self.bump();
        let line = self
            .lines
            .get_mut(name)
            .ok_or_else(|| Error::line_not_found(name))?;
        line.allow_ticket_purchase = !line.allow_ticket_purchase;
        line.touch(version);
        Ok(line.allow_ticket_purchase)
    }

    /// Record both directed capabilities between two stations
    pub fn connect(&mut self, a: &str, b: &str) -> Result<()> {
        self.require_pair(a, b)?;
        let version = self.bump();
        for (from, to) in [(a, b), (b, a)] {
            if let Some(station) = self.stations.get_mut(from) {
                station.neighbours.insert(to.to_string());
                station.touch(version);
            }
        }
        Ok(())
    }

    /// Remove both directed capabilities between two stations
    pub fn disconnect(&mut self, a: &str, b: &str) -> Result<()> {
        self.require_pair(a, b)?;
        let version = self.bump();
        for (from, to) in [(a, b), (b, a)] {
            if let Some(station) = self.stations.get_mut(from) {
                station.neighbours.remove(to);
                station.touch(version);
            }
        }
        Ok(())
    }

    /// Add a station to a line
    pub fn assign_line(&mut self, station: &str, line: &str) -> Result<()> {
        if !self.lines.contains_key(line) {
            return Err(Error::line_not_found(line));
        }
        if !self.stations.contains_key(station) {
            return Err(Error::station_not_found(station));
        }

        let version = self.bump();
        if let Some(row) = self.stations.get_mut(station) {
            row.lines.insert(line.to_string());
            row.touch(version);
        }
        Ok(())
    }

    /// Increase a station's footfall counter
    pub fn record_footfall(&mut self, station: &str, count: u64) -> Result<u64> {
        if !self.stations.contains_key(station) {
            return Err(Error::station_not_found(station));
        }
        let version = self.bump();
        let row = self
            .stations
            .get_mut(station)
            .ok_or_else(|| Error::station_not_found(station))?;
        row.footfall = row.footfall.saturating_add(count);
        row.touch(version);
        Ok(row.footfall)
    }

    /// Delete a station and every neighbour record pointing at it
    pub fn remove_station(&mut self, name: &str) -> Result<()> {
        if self.stations.remove(name).is_none() {
            return Err(Error::station_not_found(name));
        }

        self.removed_at = Some(Utc::now());
        let version = self.bump();
        for station in self.stations.values_mut() {
            if station.neighbours.remove(name) {
                station.touch(version);
            }
        }
        Ok(())
    }

    /// Delete a line and every membership referring to it
    pub fn remove_line(&mut self, name: &str) -> Result<()> {
        if self.lines.remove(name).is_none() {
            return Err(Error::line_not_found(name));
        }

        self.removed_at = Some(Utc::now());
        let version = self.bump();
        for station in self.stations.values_mut() {
            if station.lines.remove(name) {
                station.touch(version);
            }
        }
        Ok(())
    }

    /// Ordered snapshot of the current state
    pub fn snapshot(&self) -> TopologySnapshot {
        // BTreeMap iteration is already name-ordered
        TopologySnapshot {
            version: self.version,
            stations: self.stations.values().cloned().collect(),
            lines: self.lines.values().cloned().collect(),
            removed_at: self.removed_at,
        }
    }

    /// Clear dirty flags on rows modified at or before `up_to_version`
    pub fn clear_dirty(&mut self, up_to_version: u64) -> usize {
        let mut cleared = 0;
        for station in self.stations.values_mut() {
            if station.dirty && station.modified_version <= up_to_version {
                station.dirty = false;
                cleared += 1;
            }
        }
        for line in self.lines.values_mut() {
            if line.dirty && line.modified_version <= up_to_version {
                line.dirty = false;
                cleared += 1;
            }
        }
        cleared
    }

    fn require_pair(&self, a: &str, b: &str) -> Result<()> {
        if a == b {
            return Err(Error::data_validation(format!(
                "Station '{}' cannot neighbour itself",
                a
            )));
        }
        for name in [a, b] {
            if !self.stations.contains_key(name) {
                return Err(Error::station_not_found(name));
            }
        }
        Ok(())
    }
}
