//! Renderer hand-off view
//!
//! Flattens a [`TransitGraph`] into node and edge lists in the shape network
//! visualizers consume. A bidirectional pair is emitted once with arrows on
//! both ends.

use super::TransitGraph;
use serde::{Deserialize, Serialize};

/// A node as handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    pub title: String,
}

/// An edge as handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub from: String,
    pub to: String,
    pub color: String,
    /// `"to"` for one-way edges, `"to;from"` for bidirectional pairs
    pub arrows: String,
}

/// Flattened graph for visualization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderView {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl TransitGraph {
    /// Flatten the graph for the visualization renderer
    pub fn render_view(&self) -> RenderView {
        let nodes = self
            .nodes
            .iter()
            .map(|(id, node)| RenderNode {
                id: id.clone(),
                label: node.label.clone(),
                title: node.title.clone(),
            })
            .collect();

        let edges = self
            .edges_iter()
            .filter(|(from, to, edge)| !edge.bidirectional || from < to)
            .map(|(from, to, edge)| RenderEdge {
                from: from.to_string(),
                to: to.to_string(),
                color: edge.color.clone(),
                arrows: if edge.bidirectional { "to;from" } else { "to" }.to_string(),
            })
            .collect();

        RenderView { nodes, edges }
    }
}
