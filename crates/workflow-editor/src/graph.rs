//! The in-memory graph model
//!
//! `Graph` owns every node and edge of one editor. Reads are public; writes
//! happen only through the crate-private primitives below, each of which
//! returns the [`Change`] it performed so the history can invert it.
//!
//! Invariant: every port endpoint of a stored edge resolves to an existing
//! node that declares that port. Primitives that would break this fail with
//! [`EditorError::DanglingReference`] or [`EditorError::UnknownPort`].

use std::collections::HashSet;

use crate::error::{EditorError, Result};
use crate::history::Change;
use crate::types::{
    CellId, EdgeId, Endpoint, GraphEdge, GraphNode, GraphSnapshot, NodeId, Point, Rect, Size,
};
use crate::validation::validate_snapshot;

/// Nodes and edges of a workflow, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a snapshot, rejecting it whole if it is malformed
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let errors = validate_snapshot(&snapshot);
        if !errors.is_empty() {
            return Err(EditorError::InvalidSnapshot(errors));
        }
        Ok(Self {
            nodes: snapshot.nodes,
            edges: snapshot.edges,
        })
    }

    /// Find a node by ID
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find an edge by ID
    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Check whether a cell is present
    pub fn contains(&self, cell: &CellId) -> bool {
        match cell {
            CellId::Node(id) => self.node(id).is_some(),
            CellId::Edge(id) => self.edge(id).is_some(),
        }
    }

    /// Edges with either end attached to a node
    pub fn edges_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    /// Get edges coming into a node
    pub fn incoming_edges<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.target.node_id() == Some(node_id))
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source.node_id() == Some(node_id))
    }

    /// Bounding box of all nodes, `None` for an empty graph
    pub fn bounding_box(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .map(GraphNode::bounds)
            .reduce(|acc, r| acc.union(&r))
    }

    /// Canvas position of an endpoint
    pub fn resolve(&self, endpoint: &Endpoint) -> Option<Point> {
        match endpoint {
            Endpoint::Port { node, port } => self.node(node)?.port_anchor(port),
            Endpoint::Point { x, y } => Some(Point::new(*x, *y)),
        }
    }

    /// Deep copy of the current contents
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Verify the no-dangling-edge invariant over the whole graph
    pub fn check_integrity(&self) -> Result<()> {
        for edge in &self.edges {
            self.check_endpoints(edge)?;
        }
        Ok(())
    }

    /// Edges and nodes that removing `cells` would delete, edges first
    ///
    /// Every edge attached to a removed node is included. Unknown ids are
    /// ignored.
    pub(crate) fn removal_plan(&self, cells: &[CellId]) -> (Vec<EdgeId>, Vec<NodeId>) {
        let node_ids: HashSet<&str> = cells
            .iter()
            .filter_map(CellId::as_node)
            .filter(|id| self.node(id).is_some())
            .collect();
        let edge_ids: HashSet<&str> = cells.iter().filter_map(CellId::as_edge).collect();

        let edges = self
            .edges
            .iter()
            .filter(|e| {
                edge_ids.contains(e.id.as_str())
                    || e.source.node_id().is_some_and(|n| node_ids.contains(n))
                    || e.target.node_id().is_some_and(|n| node_ids.contains(n))
            })
            .map(|e| e.id.clone())
            .collect();
        let nodes = self
            .nodes
            .iter()
            .filter(|n| node_ids.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();
        (edges, nodes)
    }

    /// Insert a node at `index` (appended when `None`)
    pub(crate) fn insert_node(&mut self, node: GraphNode, index: Option<usize>) -> Result<Change> {
        if self.node(&node.id).is_some() {
            return Err(EditorError::DuplicateNodeId(node.id));
        }
        let index = index.unwrap_or(self.nodes.len()).min(self.nodes.len());
        self.nodes.insert(index, node.clone());
        Ok(Change::AddNode { node, index })
    }

    /// Remove a node that no longer has attached edges
    pub(crate) fn remove_node(&mut self, id: &str) -> Result<Change> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))?;
        if let Some(edge) = self.edges.iter().find(|e| e.touches(id)) {
            return Err(EditorError::dangling(edge.id.clone(), id));
        }
        let node = self.nodes.remove(index);
        Ok(Change::RemoveNode { node, index })
    }

    /// Insert an edge at `index` (appended when `None`)
    pub(crate) fn insert_edge(&mut self, edge: GraphEdge, index: Option<usize>) -> Result<Change> {
        if self.edge(&edge.id).is_some() {
            return Err(EditorError::DuplicateEdgeId(edge.id));
        }
        self.check_endpoints(&edge)?;
        let index = index.unwrap_or(self.edges.len()).min(self.edges.len());
        self.edges.insert(index, edge.clone());
        Ok(Change::AddEdge { edge, index })
    }

    pub(crate) fn remove_edge(&mut self, id: &str) -> Result<Change> {
        let index = self
            .edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EditorError::UnknownEdge(id.to_string()))?;
        let edge = self.edges.remove(index);
        Ok(Change::RemoveEdge { edge, index })
    }

    pub(crate) fn set_node_position(&mut self, id: &str, to: Point) -> Result<Change> {
        let node = self.node_mut(id)?;
        let from = std::mem::replace(&mut node.position, to);
        Ok(Change::MoveNode {
            id: id.to_string(),
            from,
            to,
        })
    }

    pub(crate) fn set_node_size(&mut self, id: &str, to: Size) -> Result<Change> {
        let node = self.node_mut(id)?;
        let from = std::mem::replace(&mut node.size, to);
        Ok(Change::ResizeNode {
            id: id.to_string(),
            from,
            to,
        })
    }

    /// Replay a recorded change
    pub(crate) fn apply(&mut self, change: &Change) -> Result<()> {
        match change {
            Change::AddNode { node, index } => {
                self.insert_node(node.clone(), Some(*index))?;
            }
            Change::RemoveNode { node, .. } => {
                self.remove_node(&node.id)?;
            }
            Change::AddEdge { edge, index } => {
                self.insert_edge(edge.clone(), Some(*index))?;
            }
            Change::RemoveEdge { edge, .. } => {
                self.remove_edge(&edge.id)?;
            }
            Change::MoveNode { id, to, .. } => {
                self.set_node_position(id, *to)?;
            }
            Change::ResizeNode { id, to, .. } => {
                self.set_node_size(id, *to)?;
            }
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut GraphNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))
    }

    fn check_endpoints(&self, edge: &GraphEdge) -> Result<()> {
        for endpoint in [&edge.source, &edge.target] {
            if let Endpoint::Port { node, port } = endpoint {
                let target = self
                    .node(node)
                    .ok_or_else(|| EditorError::dangling(edge.id.clone(), node.clone()))?;
                if !target.has_port(port) {
                    return Err(EditorError::UnknownPort {
                        node: node.clone(),
                        port: port.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeType, Size};

    fn node(id: &str, node_type: NodeType, x: f64, y: f64) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            node_type,
            position: Point::new(x, y),
            size: Size::new(200.0, 48.0),
            ports: node_type.default_ports(),
            data: serde_json::Value::Null,
        }
    }

    fn edge(id: &str, from: &str, to: &str) -> GraphEdge {
        GraphEdge::confirmed(id, Endpoint::port(from, "output"), Endpoint::port(to, "input"))
    }

    fn sample() -> Graph {
        let mut graph = Graph::new();
        graph.insert_node(node("a", NodeType::Webhook, 0.0, 0.0), None).unwrap();
        graph.insert_node(node("b", NodeType::Shell, 200.0, 0.0), None).unwrap();
        graph.insert_node(node("c", NodeType::AsyncTask, 400.0, 0.0), None).unwrap();
        graph.insert_edge(edge("e1", "a", "b"), None).unwrap();
        graph.insert_edge(edge("e2", "a", "c"), None).unwrap();
        graph.insert_edge(edge("e3", "b", "c"), None).unwrap();
        graph
    }

    #[test]
    fn test_lookup_and_adjacency() {
        let graph = sample();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.outgoing_edges("a").count(), 2);
        assert_eq!(graph.incoming_edges("c").count(), 2);
        assert_eq!(graph.edges_of("b").count(), 2);
        assert!(graph.contains(&CellId::node("a")));
        assert!(!graph.contains(&CellId::edge("missing")));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut graph = sample();
        let err = graph.insert_node(node("a", NodeType::Cron, 0.0, 0.0), None).unwrap_err();
        assert!(matches!(err, EditorError::DuplicateNodeId(id) if id == "a"));
        let err = graph.insert_edge(edge("e1", "b", "c"), None).unwrap_err();
        assert!(matches!(err, EditorError::DuplicateEdgeId(_)));
    }

    #[test]
    fn test_edge_to_missing_node_is_dangling() {
        let mut graph = sample();
        let err = graph.insert_edge(edge("e9", "a", "ghost"), None).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_edge_to_undeclared_port() {
        let mut graph = sample();
        // triggers have no input port
        let bad = GraphEdge::confirmed("e9", Endpoint::port("b", "output"), Endpoint::port("a", "input"));
        let err = graph.insert_edge(bad, None).unwrap_err();
        assert!(matches!(err, EditorError::UnknownPort { .. }));
    }

    #[test]
    fn test_remove_node_with_edges_refused() {
        let mut graph = sample();
        let err = graph.remove_node("a").unwrap_err();
        assert!(matches!(err, EditorError::DanglingReference { .. }));
        assert!(graph.node("a").is_some());
    }

    #[test]
    fn test_removal_plan_cascades() {
        let graph = sample();
        let (edges, nodes) = graph.removal_plan(&[CellId::node("a"), CellId::node("ghost")]);
        assert_eq!(nodes, vec!["a".to_string()]);
        assert_eq!(edges, vec!["e1".to_string(), "e2".to_string()]);

        let (edges, nodes) = graph.removal_plan(&[CellId::edge("e3")]);
        assert!(nodes.is_empty());
        assert_eq!(edges, vec!["e3".to_string()]);
    }

    #[test]
    fn test_change_inverse_restores_order() {
        let mut graph = sample();
        let before = graph.snapshot();

        let removed = graph.remove_edge("e2").unwrap();
        assert_eq!(graph.edges().iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), ["e1", "e3"]);

        graph.apply(&removed.inverse()).unwrap();
        assert_eq!(graph.snapshot(), before);
    }

    #[test]
    fn test_move_and_resize_changes() {
        let mut graph = sample();
        let change = graph.set_node_position("b", Point::new(10.0, 20.0)).unwrap();
        assert_eq!(graph.node("b").unwrap().position, Point::new(10.0, 20.0));
        graph.apply(&change.inverse()).unwrap();
        assert_eq!(graph.node("b").unwrap().position, Point::new(200.0, 0.0));

        let change = graph.set_node_size("b", Size::new(10.0, 10.0)).unwrap();
        graph.apply(&change.inverse()).unwrap();
        assert_eq!(graph.node("b").unwrap().size, Size::new(200.0, 48.0));
    }

    #[test]
    fn test_bounding_box_and_resolve() {
        let graph = sample();
        assert_eq!(graph.bounding_box(), Some(Rect::new(0.0, 0.0, 600.0, 48.0)));
        assert_eq!(Graph::new().bounding_box(), None);
        assert_eq!(
            graph.resolve(&Endpoint::port("a", "output")),
            Some(Point::new(100.0, 48.0))
        );
        assert_eq!(graph.resolve(&Endpoint::port("ghost", "output")), None);
        assert!(graph.check_integrity().is_ok());
    }
}
