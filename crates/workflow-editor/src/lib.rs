//! Workflow Editor - interactive editing core for workflow graphs
//!
//! This crate holds everything a canvas-based workflow editor needs except
//! the drawing itself. It supports:
//!
//! - A node/edge graph model that never holds dangling edges
//! - A two-stage connection policy with magnet snapping
//! - Selection, rubber-band selection and a copy/paste clipboard
//! - Inverse-change undo/redo with one history entry per user action
//! - Pointer, keyboard, wheel and resize handling
//! - A pan/zoom viewport
//!
//! # Architecture
//!
//! - `Editor`: owns the graph, selection, clipboard and history; every
//!   mutation is an atomic, undoable batch
//! - `InteractionController`: turns raw input into editor operations and
//!   keeps transient hover/gesture state
//! - `EventSink`: receives every change so a view layer can repaint
//!
//! # Example
//!
//! ```
//! use workflow_editor::{Editor, EdgeSpec, Endpoint, NodeSpec, NodeType};
//!
//! let mut editor = Editor::default();
//! let hook = editor.add_node(NodeSpec::new(NodeType::Webhook, (0.0, 0.0))).unwrap();
//! let build = editor.add_node(NodeSpec::new(NodeType::Shell, (0.0, 120.0))).unwrap();
//! editor
//!     .add_edge(EdgeSpec::new(
//!         Endpoint::port(hook, "output"),
//!         Endpoint::port(build, "input"),
//!     ))
//!     .unwrap();
//!
//! editor.undo().unwrap();
//! assert_eq!(editor.graph().edge_count(), 0);
//! ```

pub mod builder;
pub mod clipboard;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod events;
pub mod graph;
pub mod history;
pub mod interaction;
pub mod policy;
pub mod selection;
pub mod types;
pub mod validation;
pub mod viewport;

// Re-export key types
pub use builder::GraphBuilder;
pub use config::EditorConfig;
pub use editor::{EdgeEnd, Editor};
pub use error::{EditorError, Result};
pub use events::{EventSink, GraphEvent, NullEventSink, VecEventSink};
pub use graph::Graph;
pub use history::{BatchKind, Change, History, HistoryEntry};
pub use interaction::{Command, HitTarget, InputEvent, InteractionController, Keymap, KeyStroke};
pub use policy::{ConnectionPolicy, DefaultConnectionPolicy, EdgeCreation};
pub use types::{
    CellId, EdgeSpec, Endpoint, GraphEdge, GraphNode, GraphSnapshot, NodeSpec, NodeType, Point,
    Rect, Size,
};
pub use validation::{validate_snapshot, ValidationError};
pub use viewport::{Viewport, ViewportTransform, ZoomType};
