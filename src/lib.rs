//! Transit Graph Library
//!
//! A Rust library that derives a routing graph from a station/line/neighbour
//! topology, keeps a cached build of that graph consistent with edits to the
//! topology, and answers shortest-path queries against it.
//!
//! This library provides tools for:
//! - Modelling stations, lines and neighbour capabilities with dirty tracking
//! - Building a deterministic directed graph over currently running lines
//! - Detecting stale builds via version, timestamp or content-hash identities
//! - Serializing rebuilds across processes with an advisory file lock
//! - Persisting graph artifacts atomically (temp file, then rename)
//! - Breadth-first shortest-path routing over the cached graph

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod freshness;
        pub mod graph_builder;
        pub mod graph_cache;
        pub mod router;
        pub mod topology_store;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Line, Station, TopologySnapshot};
pub use app::services::freshness::{FreshnessOracle, FreshnessStrategy};
pub use app::services::graph_builder::{BuildOptions, TransitGraph};
pub use app::services::graph_cache::GraphCache;
pub use app::services::router::{Route, Router};
pub use app::services::topology_store::{InMemoryTopologyStore, TopologyStore};
pub use config::Config;

/// Result type alias for the transit graph engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for graph building, caching and routing operations
///
/// "No path" is deliberately absent: an unreachable destination is an empty
/// [`Route`], not an error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not take the rebuild lock before the deadline
    #[error("Timed out after {waited:?} waiting for rebuild lock at '{path}'")]
    LockTimeout {
        path: String,
        waited: std::time::Duration,
    },

    /// The topology store could not be read
    #[error("Topology store unavailable: {message}")]
    TopologyUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A persisted graph artifact could not be parsed
    #[error("Corrupt graph artifact '{path}': {message}")]
    CorruptArtifact { path: String, message: String },

    /// JSON/TOML (de)serialization failed
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// CSV parsing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Data validation error
    #[error("Data validation error: {message}")]
    DataValidation { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Station not found
    #[error("Station not found: {name}")]
    StationNotFound { name: String },

    /// Line not found
    #[error("Line not found: {name}")]
    LineNotFound { name: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a lock timeout error
    pub fn lock_timeout(path: impl Into<String>, waited: std::time::Duration) -> Self {
        Self::LockTimeout {
            path: path.into(),
            waited,
        }
    }

    /// Create a topology unavailable error without an underlying cause
    pub fn topology_unavailable(message: impl Into<String>) -> Self {
        Self::TopologyUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a topology unavailable error wrapping the store failure
    pub fn topology_unavailable_from(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::TopologyUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a corrupt artifact error
    pub fn corrupt_artifact(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptArtifact {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a data validation error
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a station not found error
    pub fn station_not_found(name: impl Into<String>) -> Self {
        Self::StationNotFound { name: name.into() }
    }

    /// Create a line not found error
    pub fn line_not_found(name: impl Into<String>) -> Self {
        Self::LineNotFound { name: name.into() }
    }

    /// Whether this error means the topology store could not be read
    pub fn is_topology_unavailable(&self) -> bool {
        matches!(self, Self::TopologyUnavailable { .. })
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON serialization failed".to_string(),
            source: Box::new(error),
        }
    }
}
