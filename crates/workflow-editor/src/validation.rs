//! Snapshot validation
//!
//! Checks that a serialized graph can be loaded without breaking the model's
//! invariants: unique ids, edges that resolve to declared ports, and no
//! leftover provisional edges.

use std::collections::HashSet;

use crate::types::{EdgeId, Endpoint, GraphSnapshot, NodeId, PortId};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two nodes share an id
    DuplicateNodeId { node_id: NodeId },
    /// Two edges share an id
    DuplicateEdgeId { edge_id: EdgeId },
    /// An edge references a non-existent node
    UnknownNode { edge_id: EdgeId, node_id: NodeId },
    /// An edge references a port its node does not declare
    UnknownPort {
        edge_id: EdgeId,
        node_id: NodeId,
        port_id: PortId,
    },
    /// An edge ends on a free point instead of a port
    FreeTarget { edge_id: EdgeId },
    /// An edge was saved while still being drawn
    ProvisionalEdge { edge_id: EdgeId },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNodeId { node_id } => write!(f, "Duplicate node id '{}'", node_id),
            Self::DuplicateEdgeId { edge_id } => write!(f, "Duplicate edge id '{}'", edge_id),
            Self::UnknownNode { edge_id, node_id } => {
                write!(f, "Edge '{}' references unknown node '{}'", edge_id, node_id)
            }
            Self::UnknownPort {
                edge_id,
                node_id,
                port_id,
            } => {
                write!(
                    f,
                    "Edge '{}' references unknown port '{}' on node '{}'",
                    edge_id, port_id, node_id
                )
            }
            Self::FreeTarget { edge_id } => {
                write!(f, "Edge '{}' does not end on a port", edge_id)
            }
            Self::ProvisionalEdge { edge_id } => {
                write!(f, "Edge '{}' is still provisional", edge_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a graph snapshot
///
/// Returns all validation errors found (not just the first).
pub fn validate_snapshot(snapshot: &GraphSnapshot) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_unique_ids(snapshot, &mut errors);
    validate_edge_references(snapshot, &mut errors);

    errors
}

fn validate_unique_ids(snapshot: &GraphSnapshot, errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in &snapshot.nodes {
        if !seen.insert(&node.id) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for edge in &snapshot.edges {
        if !seen.insert(&edge.id) {
            errors.push(ValidationError::DuplicateEdgeId {
                edge_id: edge.id.clone(),
            });
        }
    }
}

/// Check that every port endpoint resolves and every edge is finished
fn validate_edge_references(snapshot: &GraphSnapshot, errors: &mut Vec<ValidationError>) {
    for edge in &snapshot.edges {
        if !edge.is_confirmed() {
            errors.push(ValidationError::ProvisionalEdge {
                edge_id: edge.id.clone(),
            });
        }
        if !edge.target.is_port() {
            errors.push(ValidationError::FreeTarget {
                edge_id: edge.id.clone(),
            });
        }

        for endpoint in [&edge.source, &edge.target] {
            let Endpoint::Port { node, port } = endpoint else {
                continue;
            };
            match snapshot.nodes.iter().find(|n| &n.id == node) {
                None => errors.push(ValidationError::UnknownNode {
                    edge_id: edge.id.clone(),
                    node_id: node.clone(),
                }),
                Some(n) if !n.has_port(port) => errors.push(ValidationError::UnknownPort {
                    edge_id: edge.id.clone(),
                    node_id: node.clone(),
                    port_id: port.clone(),
                }),
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::{GraphEdge, NodeType, Point, RenderState};

    #[test]
    fn test_valid_snapshot() {
        let snapshot = GraphBuilder::new()
            .add_node("a", NodeType::Cron, (0.0, 0.0))
            .add_node("b", NodeType::Shell, (0.0, 100.0))
            .add_edge("a", "output", "b", "input")
            .build();
        assert!(validate_snapshot(&snapshot).is_empty());
    }

    #[test]
    fn test_duplicate_ids() {
        let snapshot = GraphBuilder::new()
            .add_node("a", NodeType::Shell, (0.0, 0.0))
            .add_node("a", NodeType::Shell, (0.0, 100.0))
            .add_edge_with_id("e1", "a", "output", "a", "input")
            .add_edge_with_id("e1", "a", "output", "a", "input")
            .build();
        let errors = validate_snapshot(&snapshot);
        assert!(errors.contains(&ValidationError::DuplicateNodeId {
            node_id: "a".to_string()
        }));
        assert!(errors.contains(&ValidationError::DuplicateEdgeId {
            edge_id: "e1".to_string()
        }));
    }

    #[test]
    fn test_unknown_node_and_port() {
        let snapshot = GraphBuilder::new()
            .add_node("a", NodeType::Webhook, (0.0, 0.0))
            .add_edge_with_id("e1", "a", "output", "ghost", "input")
            .add_edge_with_id("e2", "a", "output", "a", "input")
            .build();
        let errors = validate_snapshot(&snapshot);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].to_string(),
            "Edge 'e1' references unknown node 'ghost'"
        );
        assert!(matches!(
            &errors[1],
            ValidationError::UnknownPort { port_id, .. } if port_id == "input"
        ));
    }

    #[test]
    fn test_free_target_and_provisional_edge() {
        let mut snapshot = GraphBuilder::new()
            .add_node("a", NodeType::Cron, (0.0, 0.0))
            .build();
        let mut edge = GraphEdge::confirmed(
            "e1",
            Endpoint::port("a", "output"),
            Endpoint::point(Point::new(10.0, 10.0)),
        );
        edge.render = RenderState::Provisional;
        snapshot.edges.push(edge);

        let errors = validate_snapshot(&snapshot);
        assert_eq!(
            errors,
            vec![
                ValidationError::ProvisionalEdge {
                    edge_id: "e1".to_string()
                },
                ValidationError::FreeTarget {
                    edge_id: "e1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_free_source_is_allowed() {
        let mut snapshot = GraphBuilder::new()
            .add_node("b", NodeType::Shell, (0.0, 0.0))
            .build();
        snapshot.edges.push(GraphEdge::confirmed(
            "e1",
            Endpoint::point(Point::new(-50.0, -50.0)),
            Endpoint::port("b", "input"),
        ));
        assert!(validate_snapshot(&snapshot).is_empty());
    }
}
