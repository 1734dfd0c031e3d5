//! Error types for the workflow editor

use thiserror::Error;

use crate::types::{EdgeId, NodeId, PortId};
use crate::validation::ValidationError;

/// Result type alias using EditorError
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors that can occur while editing a workflow graph
#[derive(Debug, Error)]
pub enum EditorError {
    /// The connection policy refused an edge
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// An edge would reference a node that is not in the graph
    #[error("Edge '{edge_id}' references missing node '{node_id}'")]
    DanglingReference { edge_id: EdgeId, node_id: NodeId },

    /// Paste requested before any copy/cut
    #[error("Clipboard is empty")]
    EmptyClipboard,

    /// Undo/redo requested with nothing to replay
    #[error("History stack is empty")]
    EmptyHistoryStack,

    /// A node with this id already exists
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    /// An edge with this id already exists
    #[error("Duplicate edge id: {0}")]
    DuplicateEdgeId(EdgeId),

    /// Node not found
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// Edge not found
    #[error("Unknown edge: {0}")]
    UnknownEdge(EdgeId),

    /// Port not declared on the node
    #[error("Unknown port '{port}' on node '{node}'")]
    UnknownPort { node: NodeId, port: PortId },

    /// A key binding string could not be parsed
    #[error("Invalid key binding: {0}")]
    InvalidKeyBinding(String),

    /// A graph snapshot failed validation
    #[error("Invalid snapshot ({} problem(s)): {}", .0.len(), join_errors(.0))]
    InvalidSnapshot(Vec<ValidationError>),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EditorError {
    /// Create an invalid connection error with a message
    pub fn invalid_connection(msg: impl Into<String>) -> Self {
        Self::InvalidConnection(msg.into())
    }

    /// Create a dangling reference error
    pub fn dangling(edge_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self::DanglingReference {
            edge_id: edge_id.into(),
            node_id: node_id.into(),
        }
    }

    /// Invariant violations that require a full model reset
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DanglingReference { .. })
    }

    /// Unmet command preconditions, swallowed by command dispatch
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            Self::InvalidConnection(_) | Self::EmptyClipboard | Self::EmptyHistoryStack
        )
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(EditorError::dangling("e1", "n1").is_fatal());
        assert!(!EditorError::EmptyClipboard.is_fatal());
        assert!(EditorError::EmptyClipboard.is_silent());
        assert!(EditorError::EmptyHistoryStack.is_silent());
        assert!(EditorError::invalid_connection("blank target").is_silent());
        assert!(!EditorError::UnknownNode("n1".into()).is_silent());
    }

    #[test]
    fn test_snapshot_error_message() {
        let err = EditorError::InvalidSnapshot(vec![
            ValidationError::DuplicateNodeId {
                node_id: "a".to_string(),
            },
            ValidationError::FreeTarget {
                edge_id: "e1".to_string(),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid snapshot (2 problem(s))"));
        assert!(msg.contains("'a'"));
        assert!(msg.contains("'e1'"));
    }
}
