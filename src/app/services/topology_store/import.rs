//! CSV topology import
//!
//! Seeds a topology from two CSV documents:
//!
//! - stations: `uid,name,neighbours` where `neighbours` is a `|`-separated
//!   list of station uids
//! - lines: `name,stations` where `stations` is a `|`-separated list of
//!   station uids
//!
//! Uids only exist in the CSV; the resulting topology is keyed by name.
//! Malformed rows are skipped with a warning and counted, never fatal.

use super::TopologyState;
use crate::app::models::{Line, Station};
use crate::constants::{CSV_LIST_SEPARATOR, seed_line_color};
use crate::{Error, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Statistics about a topology import
#[derive(Debug, Clone, Default)]
pub struct ImportStats {
    /// Stations created
    pub stations_created: usize,

    /// Lines created
    pub lines_created: usize,

    /// Station-to-line memberships set
    pub memberships: usize,

    /// Directed neighbour records set
    pub neighbour_links: usize,

    /// Rows skipped as malformed or duplicate
    pub rows_skipped: usize,

    /// References to uids not present in the stations CSV
    pub unknown_references: usize,

    /// Time taken by the import
    pub import_duration: std::time::Duration,

    /// Messages for every skipped row
    pub errors: Vec<String>,
}

impl ImportStats {
    /// Check if any rows were skipped
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get a summary string of the import
    pub fn summary(&self) -> String {
        format!(
            "Imported {} stations, {} lines, {} memberships, {} neighbour links ({} rows skipped) in {:.2}s",
            self.stations_created,
            self.lines_created,
            self.memberships,
            self.neighbour_links,
            self.rows_skipped,
            self.import_duration.as_secs_f64()
        )
    }

    fn skip(&mut self, message: String) {
        warn!("{}", message);
        self.rows_skipped += 1;
        self.errors.push(message);
    }
}

/// Parsed station row before uids are resolved
struct StationRow {
    name: String,
    neighbour_uids: Vec<u32>,
}

/// Parsed line row before uids are resolved
struct LineRow {
    name: String,
    station_uids: Vec<u32>,
}

/// Builds a [`TopologyState`] from station and line CSV documents
#[derive(Debug, Clone, Default)]
pub struct TopologyImporter {
    /// Colour overrides by line name; other lines use the seed colour map
    colors: HashMap<String, String>,
}

impl TopologyImporter {
    /// Create an importer using the seed colour map
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the colour for one line
    pub fn with_color(mut self, line: impl Into<String>, color: impl Into<String>) -> Self {
        self.colors.insert(line.into(), color.into());
        self
    }

    fn color_for(&self, line: &str) -> String {
        self.colors
            .get(line)
            .cloned()
            .unwrap_or_else(|| seed_line_color(line).to_string())
    }

    /// Import from CSV files on disk
    pub fn import_files(
        &self,
        stations_path: &Path,
        lines_path: &Path,
    ) -> Result<(TopologyState, ImportStats)> {
        let open = |path: &Path| {
            File::open(path).map_err(|e| {
                Error::io(format!("Failed to open CSV file '{}'", path.display()), e)
            })
        };
        info!(
            "Importing topology from {} and {}",
            stations_path.display(),
            lines_path.display()
        );
        self.import(open(stations_path)?, open(lines_path)?)
    }

    /// Import from any pair of CSV readers
    pub fn import<S: Read, L: Read>(
        &self,
        stations_csv: S,
        lines_csv: L,
    ) -> Result<(TopologyState, ImportStats)> {
        let start_time = Instant::now();
        let mut stats = ImportStats::default();

        let station_rows = Self::parse_stations(stations_csv, &mut stats)?;
        let line_rows = Self::parse_lines(lines_csv, &mut stats)?;

        let uid_to_name: HashMap<u32, &str> = station_rows
            .iter()
            .map(|(uid, row)| (*uid, row.name.as_str()))
            .collect();

        let mut stations: BTreeMap<String, Station> = BTreeMap::new();
        for row in station_rows.values() {
            if stations.contains_key(&row.name) {
                stats.skip(format!("Duplicate station name '{}', keeping first", row.name));
                continue;
            }
            match Station::new(row.name.clone()) {
                Ok(station) => {
                    stations.insert(row.name.clone(), station);
                }
                Err(e) => stats.skip(format!("Invalid station '{}': {}", row.name, e)),
            }
        }

        let mut lines: BTreeMap<String, Line> = BTreeMap::new();
        for row in &line_rows {
            if lines.contains_key(&row.name) {
                stats.skip(format!("Duplicate line name '{}', keeping first", row.name));
                continue;
            }
            let line = match Line::new(row.name.clone(), self.color_for(&row.name)) {
                Ok(line) => line,
                Err(e) => {
                    stats.skip(format!("Invalid line '{}': {}", row.name, e));
                    continue;
                }
            };

            for uid in &row.station_uids {
                match uid_to_name.get(uid).and_then(|name| stations.get_mut(*name)) {
                    Some(station) => {
                        if station.lines.insert(row.name.clone()) {
                            stats.memberships += 1;
                        }
                    }
                    None => {
                        debug!("Line '{}' references unknown station uid {}", row.name, uid);
                        stats.unknown_references += 1;
                    }
                }
            }
            lines.insert(row.name.clone(), line);
        }

        for row in station_rows.values() {
            let neighbours: Vec<String> = row
                .neighbour_uids
                .iter()
                .filter_map(|uid| match uid_to_name.get(uid) {
                    Some(name) if *name != row.name => Some(name.to_string()),
                    Some(_) => None,
                    None => {
                        debug!("Station '{}' references unknown neighbour uid {}", row.name, uid);
                        stats.unknown_references += 1;
                        None
                    }
                })
                .collect();
            if let Some(station) = stations.get_mut(&row.name) {
                for neighbour in neighbours {
                    if station.neighbours.insert(neighbour) {
                        stats.neighbour_links += 1;
                    }
                }
            }
        }

        let mut state = TopologyState::default();
        for line in lines.into_values() {
            state.upsert_line(line)?;
            stats.lines_created += 1;
        }
        for station in stations.into_values() {
            state.upsert_station(station)?;
            stats.stations_created += 1;
        }

        stats.import_duration = start_time.elapsed();
        info!("{}", stats.summary());
        Ok((state, stats))
    }

    fn parse_stations<R: Read>(
        reader: R,
        stats: &mut ImportStats,
    ) -> Result<BTreeMap<u32, StationRow>> {
        let mut rows = BTreeMap::new();
        for record in Self::records(reader, "stations")? {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    stats.skip(format!("Skipping unreadable station row: {}", e));
                    continue;
                }
            };
            if record.len() < 3 {
                stats.skip(format!("Skipping malformed station row: {:?}", record));
                continue;
            }

            let uid = match record[0].parse::<u32>() {
                Ok(uid) => uid,
                Err(e) => {
                    stats.skip(format!("Skipping station row with bad uid {:?}: {}", record, e));
                    continue;
                }
            };
            let neighbour_uids = match Self::parse_uid_list(&record[2]) {
                Ok(uids) => uids,
                Err(e) => {
                    stats.skip(format!("Skipping station row {:?}: {}", record, e));
                    continue;
                }
            };

            match rows.entry(uid) {
                Entry::Occupied(_) => {
                    stats.skip(format!(
                        "Skipping station row with duplicate uid {}: {:?}",
                        uid, record
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(StationRow {
                        name: record[1].to_string(),
                        neighbour_uids,
                    });
                }
            }
        }
        Ok(rows)
    }

    fn parse_lines<R: Read>(reader: R, stats: &mut ImportStats) -> Result<Vec<LineRow>> {
        let mut rows = Vec::new();
        for record in Self::records(reader, "lines")? {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    stats.skip(format!("Skipping unreadable line row: {}", e));
                    continue;
                }
            };
            if record.len() < 2 {
                stats.skip(format!("Skipping malformed line row: {:?}", record));
                continue;
            }

            match Self::parse_uid_list(&record[1]) {
                Ok(station_uids) => rows.push(LineRow {
                    name: record[0].to_string(),
                    station_uids,
                }),
                Err(e) => stats.skip(format!("Skipping line row {:?}: {}", record, e)),
            }
        }
        Ok(rows)
    }

    fn records<R: Read>(
        reader: R,
        label: &str,
    ) -> Result<Vec<std::result::Result<StringRecord, csv::Error>>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        csv_reader
            .headers()
            .map_err(|e| Error::csv_parsing(label, "Failed to read CSV header", Some(e)))?;
        Ok(csv_reader.records().collect())
    }

    fn parse_uid_list(cell: &str) -> std::result::Result<Vec<u32>, std::num::ParseIntError> {
        cell.split(CSV_LIST_SEPARATOR)
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .map(str::parse::<u32>)
            .collect()
    }
}
