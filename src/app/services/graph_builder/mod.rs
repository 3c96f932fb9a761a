//! Graph builder
//!
//! Turns a topology snapshot into a [`TransitGraph`]. For every station `S`
//! and every neighbour record `S -> N`, the edge exists iff `S` and `N` share
//! at least one running line. The edge carries the lexicographically smallest
//! such line, so two builds of the same snapshot are identical.
//!
//! The builder is a pure function: it performs no I/O and never consults the
//! store, which lets the cache run it on a snapshot taken under its lock.

use crate::app::models::{Station, TopologySnapshot};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub mod graph;
pub mod render;

#[cfg(test)]
pub mod tests;

// Re-export key types for convenience
pub use graph::{GraphEdge, GraphNode, TransitGraph};
pub use render::{RenderEdge, RenderNode, RenderView};

/// Options controlling graph materialization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Drop stations that end up with no incident edges
    ///
    /// Off by default: an isolated station stays a node, so routing to it
    /// reports "no path" the same way as an unreachable connected station.
    pub prune_isolated: bool,
}

impl BuildOptions {
    /// Enable or disable pruning of isolated stations
    pub fn with_prune_isolated(mut self, prune_isolated: bool) -> Self {
        self.prune_isolated = prune_isolated;
        self
    }
}

/// Tooltip text for a station node
pub fn lines_tooltip(station: &Station) -> String {
    let lines: Vec<&str> = station.lines.iter().map(String::as_str).collect();
    format!("Lines: {}", lines.join(", "))
}

/// Build the routing graph for a snapshot
pub fn build(
    snapshot: &TopologySnapshot,
    generation: impl Into<String>,
    options: &BuildOptions,
) -> TransitGraph {
    let mut graph = TransitGraph::new(generation, snapshot.version);
    let running = snapshot.running_lines();
    let stations: HashMap<&str, &Station> = snapshot
        .stations
        .iter()
        .map(|station| (station.name.as_str(), station))
        .collect();

    for station in &snapshot.stations {
        graph.nodes.insert(
            station.name.clone(),
            GraphNode {
                label: station.name.clone(),
                title: lines_tooltip(station),
            },
        );
    }

    for station in &snapshot.stations {
        for neighbour_name in &station.neighbours {
            let Some(neighbour) = stations.get(neighbour_name.as_str()) else {
                debug!(
                    "Skipping neighbour record {} -> {}: unknown station",
                    station.name, neighbour_name
                );
                continue;
            };

            // BTreeSet intersection yields names in ascending order
            let shared = station
                .lines
                .intersection(&neighbour.lines)
                .find_map(|name| running.get(name.as_str()));

            if let Some(line) = shared {
                graph.edges.entry(station.name.clone()).or_default().insert(
                    neighbour_name.clone(),
                    GraphEdge {
                        line: line.name.clone(),
                        color: line.color.clone(),
                        bidirectional: false,
                    },
                );
            }
        }
    }

    mark_bidirectional(&mut graph);

    if options.prune_isolated {
        prune_isolated(&mut graph);
    }

    debug!(
        "Built graph {} with {} nodes and {} directed edges",
        graph.generation,
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

fn mark_bidirectional(graph: &mut TransitGraph) {
    let pairs: Vec<(String, String)> = graph
        .edges_iter()
        .filter(|(from, to, _)| graph.has_edge(to, from))
        .map(|(from, to, _)| (from.to_string(), to.to_string()))
        .collect();

    for (from, to) in pairs {
        if let Some(edge) = graph.edges.get_mut(&from).and_then(|t| t.get_mut(&to)) {
            edge.bidirectional = true;
        }
    }
}

fn prune_isolated(graph: &mut TransitGraph) {
    let connected: BTreeSet<String> = graph
        .edges_iter()
        .flat_map(|(from, to, _)| [from.to_string(), to.to_string()])
        .collect();

    let before = graph.node_count();
    graph.nodes.retain(|name, _| connected.contains(name));
    debug!(
        "Pruned {} isolated stations",
        before - graph.node_count()
    );
}
