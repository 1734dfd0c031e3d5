//! Change notifications for the rendering surface
//!
//! The editor never draws. Every model or view-state change is reported as
//! a [`GraphEvent`] through an [`EventSink`], and the view layer repaints.

use serde::{Deserialize, Serialize};

use crate::interaction::ToolKind;
use crate::types::{CellId, EdgeId, Endpoint, GraphEdge, NodeId, Point, Size};
use crate::viewport::ViewportTransform;

/// Trait for receiving editor events
///
/// This abstracts over the transport mechanism (UI binding, channel, etc.)
/// allowing the editor to be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel closed)
    fn send(&self, event: GraphEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted by the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GraphEvent {
    /// A node was added (interactively, by paste, undo or redo)
    #[serde(rename_all = "camelCase")]
    NodeAdded { node_id: NodeId },

    #[serde(rename_all = "camelCase")]
    NodeRemoved { node_id: NodeId },

    /// A node's position changed, including live drag updates
    #[serde(rename_all = "camelCase")]
    NodeMoved { node_id: NodeId, position: Point },

    #[serde(rename_all = "camelCase")]
    NodeResized { node_id: NodeId, size: Size },

    #[serde(rename_all = "camelCase")]
    EdgeAdded { edge_id: EdgeId },

    #[serde(rename_all = "camelCase")]
    EdgeRemoved { edge_id: EdgeId },

    /// The selection set was replaced
    #[serde(rename_all = "camelCase")]
    SelectionChanged { cells: Vec<CellId> },

    /// The whole model was replaced (load or reset)
    #[serde(rename_all = "camelCase")]
    GraphLoaded { node_count: usize, edge_count: usize },

    /// Port visibility toggled by hover
    #[serde(rename_all = "camelCase")]
    PortsVisibilityChanged { visible: bool },

    /// Hover tools attached to or detached from a cell
    #[serde(rename_all = "camelCase")]
    ToolsChanged { cell: CellId, tools: Vec<ToolKind> },

    /// The edge being drawn moved, snapped or was dropped (`edge: None`)
    #[serde(rename_all = "camelCase")]
    ProvisionalEdgeChanged {
        edge: Option<GraphEdge>,
        highlighted_port: Option<Endpoint>,
        /// Colour to paint `highlighted_port` with
        highlight_color: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    ViewportChanged {
        transform: ViewportTransform,
        width: f64,
        height: f64,
    },
}

impl GraphEvent {
    /// Whether this event reflects a change to persisted graph data
    pub fn is_model_change(&self) -> bool {
        matches!(
            self,
            Self::NodeAdded { .. }
                | Self::NodeRemoved { .. }
                | Self::NodeMoved { .. }
                | Self::NodeResized { .. }
                | Self::EdgeAdded { .. }
                | Self::EdgeRemoved { .. }
                | Self::GraphLoaded { .. }
        )
    }
}

/// A no-op event sink that discards all events
///
/// Useful for headless use or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: GraphEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: parking_lot::Mutex<Vec<GraphEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<GraphEvent> {
        self.events.lock().clone()
    }

    /// Take all collected events, leaving the sink empty
    pub fn drain(&self) -> Vec<GraphEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: GraphEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}
