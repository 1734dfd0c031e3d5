//! Connection policy
//!
//! Every edge passes two named stages before it is committed:
//!
//! 1. [`ConnectionPolicy::validate_connection`] decides structural legality.
//!    A finished edge must end on a real port; a free point is refused.
//! 2. [`ConnectionPolicy::validate_edge`] finalizes an edge that is about to
//!    be committed, turning provisional styling into confirmed styling.
//!
//! The styling rules live in stage two only, so the legality rule can change
//! without touching how edges look.

use crate::constants::style;
use crate::graph::Graph;
use crate::types::{
    new_edge_id, Connector, EdgeAttrs, Endpoint, GraphEdge, NodeId, Point, PortId,
    RenderState,
};

/// How an edge reached the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeCreation {
    /// A new edge drawn from a port
    Create,
    /// An existing edge whose end was reattached
    Update,
}

/// Decides which edges may exist and how they look
pub trait ConnectionPolicy: Send + Sync {
    /// Structural legality of a prospective edge. Must not have side effects.
    fn validate_connection(&self, graph: &Graph, source: &Endpoint, target: &Endpoint) -> bool;

    /// Finalize an edge about to be committed
    ///
    /// Must be idempotent: finalizing an already-final edge leaves it unchanged.
    fn validate_edge(
        &self,
        edge: &mut GraphEdge,
        creation: EdgeCreation,
        previous: Option<&GraphEdge>,
    ) -> bool;

    /// A new provisional edge starting at `source` and currently ending at `pointer`
    fn create_edge(&self, source: Endpoint, pointer: Point) -> GraphEdge {
        GraphEdge {
            id: new_edge_id(),
            source,
            target: Endpoint::point(pointer),
            render: RenderState::Provisional,
            connector: Connector::Normal,
            attrs: EdgeAttrs::provisional(),
        }
    }

    /// Radius within which a dragged edge end snaps onto a port
    fn snap_radius(&self) -> f64;
}

/// The editor's stock policy: any port may connect to any other port
#[derive(Debug, Clone)]
pub struct DefaultConnectionPolicy {
    snap_radius: f64,
}

impl DefaultConnectionPolicy {
    pub fn new(snap_radius: f64) -> Self {
        Self { snap_radius }
    }
}

impl Default for DefaultConnectionPolicy {
    fn default() -> Self {
        Self::new(crate::constants::defaults::SNAP_RADIUS)
    }
}

impl ConnectionPolicy for DefaultConnectionPolicy {
    fn validate_connection(&self, graph: &Graph, source: &Endpoint, target: &Endpoint) -> bool {
        let resolves =
            |node: &NodeId, port: &PortId| graph.node(node).is_some_and(|n| n.has_port(port));
        // free-point sources are allowed, port sources must still exist
        if let Endpoint::Port { node, port } = source {
            if !resolves(node, port) {
                return false;
            }
        }
        match target {
            Endpoint::Port { .. } if target == source => false,
            Endpoint::Port { node, port } => resolves(node, port),
            Endpoint::Point { .. } => false,
        }
    }

    fn validate_edge(
        &self,
        edge: &mut GraphEdge,
        _creation: EdgeCreation,
        _previous: Option<&GraphEdge>,
    ) -> bool {
        edge.attrs.stroke_dasharray = None;
        edge.render = RenderState::Confirmed;
        edge.connector = Connector::Rounded;
        true
    }

    fn snap_radius(&self) -> f64 {
        self.snap_radius
    }
}

/// A port that a dragged edge end is close enough to snap onto
#[derive(Debug, Clone, PartialEq)]
pub struct Magnet {
    pub node: NodeId,
    pub port: PortId,
    /// Canvas position of the port anchor
    pub anchor: Point,
    pub distance: f64,
}

impl Magnet {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::port(self.node.clone(), self.port.clone())
    }

    /// Highlight colour for the adsorbed port
    pub fn highlight_color(&self) -> &'static str {
        style::MAGNET_HIGHLIGHT
    }
}

/// Nearest port within `radius` of `point`, ties broken by graph order
pub fn find_magnet(graph: &Graph, point: Point, radius: f64) -> Option<Magnet> {
    let mut best: Option<Magnet> = None;
    for node in graph.nodes() {
        for port in node.ports.keys() {
            let Some(anchor) = node.port_anchor(port) else {
                continue;
            };
            let distance = anchor.distance(point);
            if distance > radius {
                continue;
            }
            if best.as_ref().map_or(true, |b| distance < b.distance) {
                best = Some(Magnet {
                    node: node.id.clone(),
                    port: port.clone(),
                    anchor,
                    distance,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Transaction;
    use crate::types::{GraphNode, NodeType, Size};

    fn graph() -> Graph {
        let mut graph = Graph::new();
        let mut tx = Transaction::new(&mut graph);
        for (id, node_type, x) in [("a", NodeType::Webhook, 0.0), ("b", NodeType::Shell, 200.0)] {
            tx.insert_node(GraphNode {
                id: id.to_string(),
                node_type,
                position: Point::new(x, 0.0),
                size: Size::new(200.0, 48.0),
                ports: node_type.default_ports(),
                data: serde_json::Value::Null,
            })
            .unwrap();
        }
        tx.into_changes();
        graph
    }

    #[test]
    fn test_validate_connection_requires_port_target() {
        let graph = graph();
        let policy = DefaultConnectionPolicy::default();
        let source = Endpoint::port("a", "output");

        assert!(policy.validate_connection(&graph, &source, &Endpoint::port("b", "input")));
        assert!(!policy.validate_connection(
            &graph,
            &source,
            &Endpoint::point(Point::new(600.0, 400.0))
        ));
        assert!(!policy.validate_connection(&graph, &source, &Endpoint::port("b", "nope")));
        assert!(!policy.validate_connection(&graph, &source, &Endpoint::port("ghost", "input")));
    }

    #[test]
    fn test_validate_connection_checks_source() {
        let graph = graph();
        let policy = DefaultConnectionPolicy::default();
        let target = Endpoint::port("b", "input");

        assert!(!policy.validate_connection(&graph, &Endpoint::port("ghost", "output"), &target));
        assert!(!policy.validate_connection(&graph, &Endpoint::port("a", "nope"), &target));
        assert!(policy.validate_connection(
            &graph,
            &Endpoint::point(Point::new(-40.0, -40.0)),
            &target
        ));
    }

    #[test]
    fn test_validate_connection_refuses_same_endpoint() {
        let graph = graph();
        let policy = DefaultConnectionPolicy::default();
        let port = Endpoint::port("b", "output");
        assert!(!policy.validate_connection(&graph, &port, &port));
        // other ports on the same node are fine
        assert!(policy.validate_connection(&graph, &port, &Endpoint::port("b", "input")));
    }

    #[test]
    fn test_provisional_then_confirmed_styling() {
        let policy = DefaultConnectionPolicy::default();
        let mut edge = policy.create_edge(Endpoint::port("a", "output"), Point::new(5.0, 5.0));
        assert_eq!(edge.render, RenderState::Provisional);
        assert_eq!(edge.attrs.stroke_dasharray.as_deref(), Some("4,2,1,2"));
        assert_eq!(edge.attrs.stroke, "#A2B1C3");

        assert!(policy.validate_edge(&mut edge, EdgeCreation::Create, None));
        assert_eq!(edge.render, RenderState::Confirmed);
        assert_eq!(edge.connector, Connector::Rounded);
        assert_eq!(edge.attrs.stroke_dasharray, None);
    }

    #[test]
    fn test_validate_edge_is_idempotent() {
        let policy = DefaultConnectionPolicy::default();
        let mut edge = policy.create_edge(Endpoint::port("a", "output"), Point::new(5.0, 5.0));
        policy.validate_edge(&mut edge, EdgeCreation::Create, None);
        let once = edge.clone();
        policy.validate_edge(&mut edge, EdgeCreation::Create, None);
        assert_eq!(edge, once);
    }

    #[test]
    fn test_find_magnet_within_radius() {
        let graph = graph();
        // b.input anchor sits at (300, 0)
        let magnet = find_magnet(&graph, Point::new(305.0, 12.0), 20.0).unwrap();
        assert_eq!(magnet.node, "b");
        assert_eq!(magnet.port, "input");
        assert_eq!(magnet.anchor, Point::new(300.0, 0.0));
        assert_eq!(magnet.endpoint(), Endpoint::port("b", "input"));

        assert!(find_magnet(&graph, Point::new(330.0, 0.0), 20.0).is_none());
    }

    #[test]
    fn test_find_magnet_prefers_nearest() {
        let graph = graph();
        // a.output at (100, 48), b.input at (300, 0); nearest wins
        let magnet = find_magnet(&graph, Point::new(110.0, 40.0), 500.0).unwrap();
        assert_eq!(magnet.node, "a");
    }
}
