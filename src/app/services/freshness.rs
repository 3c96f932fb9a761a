//! Freshness oracle
//!
//! Derives the cache identity (generation) of the current topology. A cached
//! graph is stale exactly when its generation differs from the identity the
//! oracle computes now.
//!
//! Three strategies are supported; a cache uses one consistently:
//!
//! - `Version`: `v<n>` from the store's monotonic topology version. Only the
//!   version counter is read, so the check is cheap.
//! - `Timestamp`: SHA-512 of the latest row modification time, formatted with
//!   microsecond precision.
//! - `ContentHash`: SHA-512 over the sorted configuration strings of every
//!   line, station, membership and neighbour record.
//!
//! Both hashing strategies map an empty topology to a fixed sentinel.

use crate::app::models::TopologySnapshot;
use crate::app::services::topology_store::TopologyStore;
use crate::constants::{CONTENT_HASH_SEPARATOR, TIMESTAMP_IDENTITY_FORMAT, VERSION_IDENTITY_PREFIX};
use crate::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::fmt;
use std::str::FromStr;

/// How the cache identity of a topology is computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FreshnessStrategy {
    /// Monotonic topology version counter
    #[default]
    Version,
    /// Hash of the latest modification timestamp
    Timestamp,
    /// Hash of the full topology configuration
    ContentHash,
}

impl fmt::Display for FreshnessStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FreshnessStrategy::Version => "version",
            FreshnessStrategy::Timestamp => "timestamp",
            FreshnessStrategy::ContentHash => "content-hash",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FreshnessStrategy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "version" => Ok(FreshnessStrategy::Version),
            "timestamp" => Ok(FreshnessStrategy::Timestamp),
            "content-hash" | "content_hash" | "hash" => Ok(FreshnessStrategy::ContentHash),
            other => Err(crate::Error::configuration(format!(
                "Unknown freshness strategy '{}': expected version, timestamp or content-hash",
                other
            ))),
        }
    }
}

/// Identity used when there is nothing to hash
pub fn empty_sentinel() -> String {
    sha512_hex(b"")
}

fn sha512_hex(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}

/// Identity under the version strategy
pub fn version_identity(version: u64) -> String {
    format!("{}{}", VERSION_IDENTITY_PREFIX, version)
}

/// Identity under the timestamp strategy
pub fn timestamp_identity(snapshot: &TopologySnapshot) -> String {
    match snapshot.max_updated_at() {
        Some(latest) => {
            sha512_hex(latest.format(TIMESTAMP_IDENTITY_FORMAT).to_string().as_bytes())
        }
        None => empty_sentinel(),
    }
}

/// Identity under the content-hash strategy
pub fn content_hash_identity(snapshot: &TopologySnapshot) -> String {
    let mut config_strings: Vec<String> = Vec::new();

    for line in &snapshot.lines {
        config_strings.push(format!(
            "LINE_CONF:{}|{}|{}|{}",
            line.name, line.color, line.is_running, line.allow_ticket_purchase
        ));
    }
    for station in &snapshot.stations {
        config_strings.push(format!("STATION_CONF:{}|{}", station.name, station.footfall));
        for line in &station.lines {
            config_strings.push(format!("LINE_CONN:{}|{}", station.name, line));
        }
        for neighbour in &station.neighbours {
            config_strings.push(format!("NEIGHBOR_CONN:{}|{}", station.name, neighbour));
        }
    }

    config_strings.sort();
    sha512_hex(config_strings.join(CONTENT_HASH_SEPARATOR).as_bytes())
}

/// Decides whether a cached graph is stale
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshnessOracle {
    strategy: FreshnessStrategy,
}

impl FreshnessOracle {
    /// Create an oracle for a strategy
    pub fn new(strategy: FreshnessStrategy) -> Self {
        Self { strategy }
    }

    /// The configured strategy
    pub fn strategy(&self) -> FreshnessStrategy {
        self.strategy
    }

    /// Identity of the store's current topology
    ///
    /// Under the version strategy only the version counter is read; the
    /// hashing strategies need a full snapshot.
    pub async fn current_identity(&self, store: &dyn TopologyStore) -> Result<String> {
        match self.strategy {
            FreshnessStrategy::Version => Ok(version_identity(store.version().await?)),
            _ => Ok(self.identity_of(&store.snapshot().await?)),
        }
    }

    /// Identity of a specific snapshot
    pub fn identity_of(&self, snapshot: &TopologySnapshot) -> String {
        match self.strategy {
            FreshnessStrategy::Version => version_identity(snapshot.version),
            FreshnessStrategy::Timestamp => timestamp_identity(snapshot),
            FreshnessStrategy::ContentHash => content_hash_identity(snapshot),
        }
    }

    /// Whether a cached generation must be rebuilt for the current identity
    pub fn is_stale(&self, cached: Option<&str>, current: &str) -> bool {
        cached != Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{Line, Station};
    use crate::app::services::topology_store::InMemoryTopologyStore;
    use chrono::{TimeZone, Utc};

    fn create_test_store() -> InMemoryTopologyStore {
        let store = InMemoryTopologyStore::new();
        store
            .upsert_line(Line::new("Red", "#FF0000").unwrap())
            .unwrap();
        store
            .upsert_station(Station::new("A").unwrap().with_lines(["Red"]))
            .unwrap();
        store
            .upsert_station(Station::new("B").unwrap().with_lines(["Red"]))
            .unwrap();
        store.connect("A", "B").unwrap();
        store
    }

    #[test]
    fn test_strategy_parse_and_display() {
        assert_eq!(
            "content-hash".parse::<FreshnessStrategy>().unwrap(),
            FreshnessStrategy::ContentHash
        );
        assert_eq!(
            "VERSION".parse::<FreshnessStrategy>().unwrap(),
            FreshnessStrategy::Version
        );
        assert!("mtime".parse::<FreshnessStrategy>().is_err());
        assert_eq!(FreshnessStrategy::Timestamp.to_string(), "timestamp");
    }

    #[test]
    fn test_empty_topology_uses_sentinel() {
        let empty = TopologySnapshot::default();
        assert_eq!(timestamp_identity(&empty), empty_sentinel());
        assert_eq!(content_hash_identity(&empty), empty_sentinel());
        assert_eq!(empty_sentinel().len(), 128);
    }

    #[test]
    fn test_timestamp_identity_microsecond_precision() {
        let mut station = Station::new("A").unwrap();
        station.updated_at = Utc.timestamp_opt(1_700_000_000, 1_000).unwrap();
        let first = TopologySnapshot::new(1, vec![station.clone()], vec![]);

        station.updated_at = Utc.timestamp_opt(1_700_000_000, 2_000).unwrap();
        let second = TopologySnapshot::new(1, vec![station.clone()], vec![]);

        // Differs only below a microsecond
        station.updated_at = Utc.timestamp_opt(1_700_000_000, 2_500).unwrap();
        let third = TopologySnapshot::new(1, vec![station], vec![]);

        assert_ne!(timestamp_identity(&first), timestamp_identity(&second));
        assert_eq!(timestamp_identity(&second), timestamp_identity(&third));
    }

    #[tokio::test]
    async fn test_version_identity_tracks_mutations() {
        let store = create_test_store();
        let oracle = FreshnessOracle::new(FreshnessStrategy::Version);

        let before = oracle.current_identity(&store).await.unwrap();
        assert_eq!(before, "v4");

        store.record_footfall("A", 1).unwrap();
        let after = oracle.current_identity(&store).await.unwrap();
        assert!(oracle.is_stale(Some(&before), &after));
        assert!(!oracle.is_stale(Some(&after), &after));
        assert!(oracle.is_stale(None, &after));
    }

    #[tokio::test]
    async fn test_content_hash_ignores_dirty_flags() {
        let store = create_test_store();
        let oracle = FreshnessOracle::new(FreshnessStrategy::ContentHash);

        let before = oracle.current_identity(&store).await.unwrap();
        store.clear_dirty(u64::MAX).await.unwrap();
        let after = oracle.current_identity(&store).await.unwrap();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_content_hash_detects_line_toggle() {
        let store = create_test_store();
        let oracle = FreshnessOracle::new(FreshnessStrategy::ContentHash);

        let running = oracle.current_identity(&store).await.unwrap();
        store.toggle_line_running("Red").unwrap();
        let stopped = oracle.current_identity(&store).await.unwrap();
        store.toggle_line_running("Red").unwrap();
        let running_again = oracle.current_identity(&store).await.unwrap();

        assert_ne!(running, stopped);
        // Same content, same identity, regardless of version
        assert_eq!(running, running_again);
    }

    #[tokio::test]
    async fn test_identity_of_matches_current_identity() {
        let store = create_test_store();
        let snapshot = store.snapshot().await.unwrap();

        for strategy in [
            FreshnessStrategy::Version,
            FreshnessStrategy::Timestamp,
            FreshnessStrategy::ContentHash,
        ] {
            let oracle = FreshnessOracle::new(strategy);
            assert_eq!(
                oracle.identity_of(&snapshot),
                oracle.current_identity(&store).await.unwrap()
            );
        }
    }
}
