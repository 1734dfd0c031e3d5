//! Copy/paste buffer
//!
//! The clipboard holds a deep copy of the copied nodes plus every edge that
//! runs between two of them. It shares nothing with the live graph, so later
//! edits never leak into it.

use std::collections::HashMap;

use crate::error::{EditorError, Result};
use crate::graph::Graph;
use crate::types::{new_edge_id, new_node_id, CellId, Endpoint, GraphEdge, GraphNode, NodeId};

/// Snapshot of a copied subgraph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    /// Pastes made from the current contents
    pastes: u32,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the selected nodes and their interior edges from `graph`
    ///
    /// Selected edges with an end outside the copied node set are not
    /// captured; pasting them would leave them dangling.
    pub fn capture(graph: &Graph, cells: &[CellId]) -> Self {
        let nodes: Vec<GraphNode> = graph
            .nodes()
            .iter()
            .filter(|n| cells.iter().any(|c| c.as_node() == Some(n.id.as_str())))
            .cloned()
            .collect();
        let inside = |endpoint: &Endpoint| {
            endpoint
                .node_id()
                .is_some_and(|id| nodes.iter().any(|n| n.id == id))
        };
        let edges = graph
            .edges()
            .iter()
            .filter(|e| inside(&e.source) && inside(&e.target))
            .cloned()
            .collect();
        Self {
            nodes,
            edges,
            pastes: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn paste_count(&self) -> u32 {
        self.pastes
    }

    /// Produce the cells for the next paste
    ///
    /// Every id is fresh, edges are rewired to the new node ids, and the
    /// n-th paste is shifted by `n * offset` on both axes.
    pub(crate) fn next_paste(&mut self, offset: f64) -> Result<(Vec<GraphNode>, Vec<GraphEdge>)> {
        if self.is_empty() {
            return Err(EditorError::EmptyClipboard);
        }
        self.pastes += 1;
        let shift = offset * f64::from(self.pastes);

        let mut id_map: HashMap<&str, NodeId> = HashMap::new();
        let nodes: Vec<GraphNode> = self
            .nodes
            .iter()
            .map(|node| {
                let id = new_node_id();
                id_map.insert(node.id.as_str(), id.clone());
                GraphNode {
                    id,
                    position: node.position.translate(shift, shift),
                    ..node.clone()
                }
            })
            .collect();

        let remap = |endpoint: &Endpoint| match endpoint {
            Endpoint::Port { node, port } => Endpoint::Port {
                node: id_map.get(node.as_str()).cloned().unwrap_or_else(|| node.clone()),
                port: port.clone(),
            },
            Endpoint::Point { x, y } => Endpoint::Point {
                x: x + shift,
                y: y + shift,
            },
        };
        let edges: Vec<GraphEdge> = self
            .edges
            .iter()
            .map(|edge| GraphEdge {
                id: new_edge_id(),
                source: remap(&edge.source),
                target: remap(&edge.target),
                ..edge.clone()
            })
            .collect();

        Ok((nodes, edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::{NodeType, Point};

    fn graph() -> Graph {
        GraphBuilder::new()
            .add_node("a", NodeType::Webhook, (0.0, 0.0))
            .add_node("b", NodeType::Shell, (200.0, 0.0))
            .add_node("c", NodeType::Shell, (400.0, 0.0))
            .add_edge("a", "output", "b", "input")
            .add_edge("b", "output", "c", "input")
            .build_graph()
            .unwrap()
    }

    #[test]
    fn test_capture_keeps_only_interior_edges() {
        let graph = graph();
        let clipboard = Clipboard::capture(&graph, &[CellId::node("a"), CellId::node("b")]);
        assert_eq!(clipboard.nodes().len(), 2);
        assert_eq!(clipboard.edges().len(), 1);
        assert_eq!(clipboard.edges()[0].target, Endpoint::port("b", "input"));
    }

    #[test]
    fn test_empty_clipboard() {
        let mut clipboard = Clipboard::new();
        assert!(matches!(
            clipboard.next_paste(32.0),
            Err(EditorError::EmptyClipboard)
        ));

        // copying only an edge captures nothing
        let graph = graph();
        let mut clipboard = Clipboard::capture(&graph, &[CellId::edge("edge-1")]);
        assert!(clipboard.is_empty());
        assert!(clipboard.next_paste(32.0).is_err());
    }

    #[test]
    fn test_pastes_are_fresh_and_cumulative() {
        let graph = graph();
        let mut clipboard = Clipboard::capture(&graph, &[CellId::node("a"), CellId::node("b")]);

        let (first_nodes, first_edges) = clipboard.next_paste(32.0).unwrap();
        let (second_nodes, _) = clipboard.next_paste(32.0).unwrap();
        assert_eq!(clipboard.paste_count(), 2);

        assert_eq!(first_nodes[0].position, Point::new(32.0, 32.0));
        assert_eq!(first_nodes[1].position, Point::new(232.0, 32.0));
        assert_eq!(second_nodes[0].position, Point::new(64.0, 64.0));

        for node in first_nodes.iter().chain(&second_nodes) {
            assert!(graph.node(&node.id).is_none());
        }
        assert!(first_nodes.iter().all(|a| second_nodes.iter().all(|b| a.id != b.id)));

        let edge = &first_edges[0];
        assert_eq!(edge.source, Endpoint::port(first_nodes[0].id.clone(), "output"));
        assert_eq!(edge.target, Endpoint::port(first_nodes[1].id.clone(), "input"));
        assert_ne!(edge.id, "edge-1");
    }

    #[test]
    fn test_snapshot_is_independent_of_graph() {
        let mut graph = graph();
        let clipboard = Clipboard::capture(&graph, &[CellId::node("a")]);
        graph.set_node_position("a", Point::new(999.0, 999.0)).unwrap();
        assert_eq!(clipboard.nodes()[0].position, Point::new(0.0, 0.0));
    }
}
