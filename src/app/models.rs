//! Data models for the transit topology
//!
//! This module contains the core data structures for stations, lines and the
//! consistent topology snapshot the graph builder reads. Every row carries a
//! dirty flag, a last-modified timestamp and the topology version at which it
//! was last modified, so the cache can tell which edits a build has observed.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

// =============================================================================
// Station
// =============================================================================

/// A station node in the transit topology
///
/// Neighbour entries are directed capability records: a symmetric connection
/// is stored as A lists B and B lists A.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Station {
    /// Unique station name - primary key
    pub name: String,

    /// Names of the lines serving this station
    #[serde(default)]
    pub lines: BTreeSet<String>,

    /// Names of directly adjacent stations
    #[serde(default)]
    pub neighbours: BTreeSet<String>,

    /// Passenger footfall counter
    #[serde(default)]
    pub footfall: u64,

    /// Set on every mutation, cleared once a build has observed it
    #[serde(default)]
    pub dirty: bool,

    /// Last-modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Topology version at which this row was last modified
    #[serde(default)]
    pub modified_version: u64,
}

impl Station {
    /// Create a new, dirty station with validation
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let station = Self {
            name: name.into(),
            lines: BTreeSet::new(),
            neighbours: BTreeSet::new(),
            footfall: 0,
            dirty: true,
            updated_at: Utc::now(),
            modified_version: 0,
        };

        station.validate()?;
        Ok(station)
    }

    /// Add line memberships
    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Add neighbour capability records
    pub fn with_neighbours<I, S>(mut self, neighbours: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.neighbours.extend(neighbours.into_iter().map(Into::into));
        self
    }

    /// Validate station data
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::data_validation("Station name cannot be empty"));
        }

        if self.neighbours.contains(&self.name) {
            return Err(Error::data_validation(format!(
                "Station '{}' cannot be its own neighbour",
                self.name
            )));
        }

        Ok(())
    }

    /// Whether this station is served by the given line
    pub fn serves(&self, line: &str) -> bool {
        self.lines.contains(line)
    }

    /// Mark the row as modified at the given topology version
    pub fn touch(&mut self, version: u64) {
        self.dirty = true;
        self.updated_at = Utc::now();
        self.modified_version = version;
    }
}

// =============================================================================
// Line
// =============================================================================

/// A transit line with its display colour and service state
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Line {
    /// Unique line name - primary key
    pub name: String,

    /// Display colour in `#RRGGBB` form
    pub color: String,

    /// Whether the line is currently in service; stopped lines add no edges
    #[serde(default = "default_running")]
    pub is_running: bool,

    /// Whether tickets may be bought for journeys on this line
    #[serde(default)]
    pub allow_ticket_purchase: bool,

    /// Set on every mutation, cleared once a build has observed it
    #[serde(default)]
    pub dirty: bool,

    /// Last-modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Topology version at which this row was last modified
    #[serde(default)]
    pub modified_version: u64,
}

fn default_running() -> bool {
    true
}

fn color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("static colour pattern"))
}

impl Line {
    /// Create a new running, dirty line with validation
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Result<Self> {
        let line = Self {
            name: name.into(),
            color: color.into(),
            is_running: true,
            allow_ticket_purchase: false,
            dirty: true,
            updated_at: Utc::now(),
            modified_version: 0,
        };

        line.validate()?;
        Ok(line)
    }

    /// Set the initial service state
    pub fn running(mut self, is_running: bool) -> Self {
        self.is_running = is_running;
        self
    }

    /// Validate line data
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::data_validation("Line name cannot be empty"));
        }

        if !color_pattern().is_match(&self.color) {
            return Err(Error::data_validation(format!(
                "Invalid colour '{}' for line '{}': expected #RRGGBB",
                self.color, self.name
            )));
        }

        Ok(())
    }

    /// Mark the row as modified at the given topology version
    pub fn touch(&mut self, version: u64) {
        self.dirty = true;
        self.updated_at = Utc::now();
        self.modified_version = version;
    }
}

// =============================================================================
// Topology Snapshot
// =============================================================================

/// A consistent read of the whole topology at one version
///
/// Stations and lines are ordered by name so that everything derived from a
/// snapshot is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopologySnapshot {
    /// Topology version the snapshot was taken at
    pub version: u64,

    /// All stations, ordered by name
    pub stations: Vec<Station>,

    /// All lines, ordered by name
    pub lines: Vec<Line>,

    /// When a station or line was last deleted
    #[serde(default)]
    pub removed_at: Option<DateTime<Utc>>,
}

impl TopologySnapshot {
    /// Create a snapshot, sorting rows by name
    pub fn new(version: u64, mut stations: Vec<Station>, mut lines: Vec<Line>) -> Self {
        stations.sort_by(|a, b| a.name.cmp(&b.name));
        lines.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            version,
            stations,
            lines,
            removed_at: None,
        }
    }

    /// Whether the topology has no stations and no lines
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty() && self.lines.is_empty()
    }

    /// Look up a station by name
    pub fn station(&self, name: &str) -> Option<&Station> {
        self.stations
            .binary_search_by(|s| s.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.stations[idx])
    }

    /// Look up a line by name
    pub fn line(&self, name: &str) -> Option<&Line> {
        self.lines
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.lines[idx])
    }

    /// Lines currently in service, keyed by name
    pub fn running_lines(&self) -> HashMap<&str, &Line> {
        self.lines
            .iter()
            .filter(|line| line.is_running)
            .map(|line| (line.name.as_str(), line))
            .collect()
    }

    /// Latest modification time across all rows and deletions
    pub fn max_updated_at(&self) -> Option<DateTime<Utc>> {
        let stations = self.stations.iter().map(|s| s.updated_at);
        let lines = self.lines.iter().map(|l| l.updated_at);
        stations.chain(lines).chain(self.removed_at).max()
    }

    /// Number of rows still carrying a dirty flag
    pub fn dirty_count(&self) -> usize {
        self.stations.iter().filter(|s| s.dirty).count()
            + self.lines.iter().filter(|l| l.dirty).count()
    }
}
