//! The materialized routing graph
//!
//! Nodes and adjacency are kept in ordered maps so that iteration order, and
//! therefore serialization and BFS visitation, depend only on station names.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display attributes of a station node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Display label (the station name)
    pub label: String,

    /// Tooltip text listing the lines serving the station
    pub title: String,
}

/// Attributes of a directed edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Representative running line shared by both endpoints
    pub line: String,

    /// Display colour of that line
    pub color: String,

    /// Whether the reverse edge also exists (rendering hint only)
    pub bidirectional: bool,
}

/// Directed station graph restricted to running lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitGraph {
    /// Cache identity this graph was built for
    pub generation: String,

    /// Topology version of the snapshot the graph was built from
    pub topology_version: u64,

    /// Station nodes keyed by name
    pub nodes: BTreeMap<String, GraphNode>,

    /// Adjacency: station -> neighbour -> edge attributes
    pub edges: BTreeMap<String, BTreeMap<String, GraphEdge>>,
}

impl TransitGraph {
    /// Create an empty graph for a generation
    pub fn new(generation: impl Into<String>, topology_version: u64) -> Self {
        Self {
            generation: generation.into(),
            topology_version,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Number of station nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed edges
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    /// Number of logical (unordered) connections
    pub fn connection_count(&self) -> usize {
        self.edges_iter()
            .filter(|(from, to, edge)| !edge.bidirectional || from < to)
            .count()
    }

    /// Whether the station is a node of the graph
    pub fn contains_station(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Whether the directed edge `from -> to` exists
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edge(from, to).is_some()
    }

    /// Attributes of the directed edge `from -> to`
    pub fn edge(&self, from: &str, to: &str) -> Option<&GraphEdge> {
        self.edges.get(from).and_then(|targets| targets.get(to))
    }

    /// Successors of a station in name order
    pub fn successors<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .get(name)
            .into_iter()
            .flat_map(|targets| targets.keys().map(String::as_str))
    }

    /// All directed edges as `(from, to, attributes)` in name order
    pub fn edges_iter(&self) -> impl Iterator<Item = (&str, &str, &GraphEdge)> {
        self.edges.iter().flat_map(|(from, targets)| {
            targets
                .iter()
                .map(move |(to, edge)| (from.as_str(), to.as_str(), edge))
        })
    }

    /// Deterministic JSON encoding used for persisted artifacts
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| Error::serialization("Failed to encode graph artifact", e))
    }

    /// Decode a persisted artifact, reporting failures as corrupt artifacts
    pub fn from_json_slice(bytes: &[u8], origin: &str) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::corrupt_artifact(origin, e.to_string()))
    }
}
