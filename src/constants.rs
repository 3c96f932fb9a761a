//! Application constants for the transit graph engine
//!
//! This module contains default values, file names and the seed colour
//! mapping used throughout the engine and its CLI.

use std::time::Duration;

// =============================================================================
// Cache Layout
// =============================================================================

/// Subdirectory of the cache directory holding graph artifacts
pub const ARTIFACT_DIR_NAME: &str = "maps";

/// File extension of persisted graph artifacts
pub const ARTIFACT_EXTENSION: &str = "json";

/// Advisory lock file guarding rebuilds, relative to the cache directory
pub const LOCK_FILE_NAME: &str = "graph.lock";

/// Prefix of temporary artifact files before they are renamed into place
pub const ARTIFACT_TEMP_PREFIX: &str = ".graph-";

/// Default URL prefix under which the artifact directory is served
pub const DEFAULT_MEDIA_URL: &str = "/media/";

/// Degraded redirect target when no map artifact can be produced
pub const DEFAULT_FALLBACK_URL: &str = "/stations/";

// =============================================================================
// Locking
// =============================================================================

/// Maximum time a caller waits for the rebuild lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between non-blocking lock attempts while waiting
pub const DEFAULT_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

// =============================================================================
// Freshness
// =============================================================================

/// Timestamp format used by the timestamp freshness strategy (microseconds)
pub const TIMESTAMP_IDENTITY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Prefix of version-strategy generation identities
pub const VERSION_IDENTITY_PREFIX: &str = "v";

/// Separator joining configuration strings before content hashing
pub const CONTENT_HASH_SEPARATOR: &str = "|";

// =============================================================================
// Topology Import
// =============================================================================

/// Colour assigned to imported lines missing from the colour map
pub const DEFAULT_LINE_COLOR: &str = "#000000";

/// Separator for multi-valued CSV cells (neighbour uids, line stations)
pub const CSV_LIST_SEPARATOR: char = '|';

/// Seed colour mapping for the metro network lines
pub const LINE_COLOR_MAP: &[(&str, &str)] = &[
    ("Red Line", "#FF0000"),
    ("Yellow Line", "#FFFF00"),
    ("Blue Line", "#0000FF"),
    ("Green Line", "#008000"),
    ("Violet Line", "#EE82EE"),
    ("Pink Line", "#FF69B4"),
    ("Magenta Line", "#FF00FF"),
    ("Grey Line", "#808080"),
    ("Airport Express", "#FFA500"),
];

/// Look up the seed colour for a line name
pub fn seed_line_color(name: &str) -> &'static str {
    LINE_COLOR_MAP
        .iter()
        .find(|(line, _)| *line == name)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_LINE_COLOR)
}

// =============================================================================
// Pricing (CLI quote only)
// =============================================================================

/// Price per hop used by the CLI route quote
pub const DEFAULT_UNIT_PRICE: f64 = 10.0;

// =============================================================================
// Configuration
// =============================================================================

/// Application directory name under the user's config/data directories
pub const APP_DIR_NAME: &str = "transit-graph";

/// Config file name inside the application config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default topology document file name
pub const DEFAULT_TOPOLOGY_FILE: &str = "topology.json";

/// Environment variable overriding the cache directory
pub const ENV_CACHE_DIR: &str = "TRANSIT_GRAPH_CACHE_DIR";

/// Environment variable overriding the topology document path
pub const ENV_TOPOLOGY_PATH: &str = "TRANSIT_GRAPH_TOPOLOGY";

/// Environment variable overriding the lock timeout in milliseconds
pub const ENV_LOCK_TIMEOUT_MS: &str = "TRANSIT_GRAPH_LOCK_TIMEOUT_MS";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_line_color_known_and_default() {
        assert_eq!(seed_line_color("Blue Line"), "#0000FF");
        assert_eq!(seed_line_color("Orange Line"), DEFAULT_LINE_COLOR);
    }

    #[test]
    fn test_poll_interval_below_timeout() {
        assert!(DEFAULT_LOCK_POLL_INTERVAL < DEFAULT_LOCK_TIMEOUT);
    }
}
