//! Fluent builder for workflow graphs
//!
//! Provides a fluent API for constructing graph snapshots programmatically,
//! mostly for seeding an editor and for tests.

use crate::constants::defaults;
use crate::error::Result;
use crate::graph::Graph;
use crate::types::{Endpoint, GraphEdge, GraphNode, GraphSnapshot, NodeType, Point, Size};

/// Fluent builder for constructing workflow graphs
///
/// # Example
///
/// ```
/// use workflow_editor::builder::GraphBuilder;
/// use workflow_editor::types::NodeType;
///
/// let graph = GraphBuilder::new()
///     .add_node("hook", NodeType::Webhook, (0.0, 0.0))
///     .with_data(serde_json::json!({"path": "/deploy"}))
///     .add_node("build", NodeType::Shell, (0.0, 120.0))
///     .add_edge("hook", "output", "build", "input")
///     .build_graph()
///     .unwrap();
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    edge_counter: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with its type's default ports and size
    pub fn add_node(
        mut self,
        id: impl Into<String>,
        node_type: NodeType,
        position: (f64, f64),
    ) -> Self {
        self.nodes.push(GraphNode {
            id: id.into(),
            node_type,
            position: Point::from(position),
            size: Size::new(defaults::NODE_WIDTH, defaults::NODE_HEIGHT),
            ports: node_type.default_ports(),
            data: serde_json::Value::Null,
        });
        self
    }

    /// Set data on the most recently added node
    ///
    /// Must be called immediately after `add_node`.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.data = data;
        }
        self
    }

    /// Set the size of the most recently added node
    pub fn with_size(mut self, size: Size) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.size = size;
        }
        self
    }

    /// Add a confirmed port-to-port edge (auto-generates edge ID)
    pub fn add_edge(
        mut self,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.edge_counter += 1;
        let id = format!("edge-{}", self.edge_counter);
        self.add_edge_with_id(id, source, source_port, target, target_port)
    }

    /// Add a confirmed edge with an explicit ID
    pub fn add_edge_with_id(
        mut self,
        edge_id: impl Into<String>,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.edges.push(GraphEdge::confirmed(
            edge_id,
            Endpoint::port(source, source_port),
            Endpoint::port(target, target_port),
        ));
        self
    }

    /// Build the snapshot without validation
    pub fn build(self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes,
            edges: self.edges,
        }
    }

    /// Build a validated graph
    pub fn build_graph(self) -> Result<Graph> {
        Graph::from_snapshot(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use crate::types::RenderState;

    #[test]
    fn test_builder_basic() {
        let snapshot = GraphBuilder::new()
            .add_node("hook", NodeType::Webhook, (0.0, 0.0))
            .with_data(serde_json::json!({"path": "/deploy"}))
            .add_node("build", NodeType::Shell, (0.0, 120.0))
            .with_size(Size::new(240.0, 60.0))
            .add_edge("hook", "output", "build", "input")
            .build();

        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.edges.len(), 1);
        assert_eq!(snapshot.nodes[0].data, serde_json::json!({"path": "/deploy"}));
        assert_eq!(snapshot.nodes[0].size, Size::new(200.0, 48.0));
        assert_eq!(snapshot.nodes[1].size, Size::new(240.0, 60.0));
        assert_eq!(snapshot.edges[0].render, RenderState::Confirmed);
    }

    #[test]
    fn test_builder_auto_edge_ids() {
        let snapshot = GraphBuilder::new()
            .add_node("a", NodeType::Cron, (0.0, 0.0))
            .add_node("b", NodeType::Shell, (0.0, 100.0))
            .add_node("c", NodeType::AsyncTask, (0.0, 200.0))
            .add_edge("a", "output", "b", "input")
            .add_edge_with_id("custom", "b", "output", "c", "input")
            .add_edge("a", "output", "c", "input")
            .build();

        assert_eq!(snapshot.edges[0].id, "edge-1");
        assert_eq!(snapshot.edges[1].id, "custom");
        assert_eq!(snapshot.edges[2].id, "edge-2");
    }

    #[test]
    fn test_build_graph_rejects_dangling_edge() {
        let err = GraphBuilder::new()
            .add_node("a", NodeType::Cron, (0.0, 0.0))
            .add_edge("a", "output", "ghost", "input")
            .build_graph()
            .unwrap_err();
        assert!(matches!(err, EditorError::InvalidSnapshot(errors) if errors.len() == 1));
    }
}
