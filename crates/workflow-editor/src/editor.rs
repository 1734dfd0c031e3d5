//! The editor aggregate
//!
//! `Editor` owns the graph together with everything that edits it: the
//! selection, the clipboard, the undo history and the connection policy.
//! Every user mutation goes through here, is applied atomically and lands in
//! the history as exactly one batch.

use std::sync::Arc;

use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::events::{EventSink, GraphEvent, NullEventSink};
use crate::graph::Graph;
use crate::history::{BatchKind, Change, History, HistoryEntry, Transaction};
use crate::policy::{ConnectionPolicy, DefaultConnectionPolicy, EdgeCreation};
use crate::selection::{nodes_in_rect, Selection};
use crate::types::{
    new_edge_id, new_node_id, CellId, Connector, EdgeAttrs, EdgeId, EdgeSpec, Endpoint,
    GraphEdge, GraphNode, GraphSnapshot, NodeId, NodeSpec, Point, Rect, RenderState, Size,
};

/// Which end of an edge to reattach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEnd {
    Source,
    Target,
}

/// An editable workflow graph with selection, clipboard and history
pub struct Editor {
    config: EditorConfig,
    graph: Graph,
    selection: Selection,
    clipboard: Clipboard,
    history: History,
    policy: Box<dyn ConnectionPolicy>,
    events: Arc<dyn EventSink>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let config = config.normalized();
        Self {
            graph: Graph::new(),
            selection: Selection::new(),
            clipboard: Clipboard::new(),
            history: History::new(config.history_limit),
            policy: Box::new(DefaultConnectionPolicy::new(config.snap_radius)),
            events: Arc::new(NullEventSink),
            config,
        }
    }

    /// Route change notifications to `sink`
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Replace the connection policy
    pub fn with_policy(mut self, policy: impl ConnectionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn policy(&self) -> &dyn ConnectionPolicy {
        self.policy.as_ref()
    }

    /// Immutable copy of the current graph
    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    // ------------------------------------------------------------------
    // Graph mutations
    // ------------------------------------------------------------------

    /// Add a node; a fresh id, the default size and the type's ports fill
    /// in whatever the request leaves out
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<NodeId> {
        let node = GraphNode {
            id: spec.id.unwrap_or_else(new_node_id),
            node_type: spec.node_type,
            position: spec.position,
            size: spec.size.unwrap_or(self.config.default_node_size),
            ports: spec.ports.unwrap_or_else(|| spec.node_type.default_ports()),
            data: spec.data,
        };
        let id = node.id.clone();
        self.transact(BatchKind::AddNode, |tx| tx.insert_node(node))?;
        Ok(id)
    }

    /// Add an edge between two endpoints, subject to the connection policy
    pub fn add_edge(&mut self, spec: EdgeSpec) -> Result<EdgeId> {
        let edge = GraphEdge {
            id: spec.id.unwrap_or_else(new_edge_id),
            source: spec.source,
            target: spec.target,
            render: RenderState::Provisional,
            connector: Connector::Normal,
            attrs: EdgeAttrs::provisional(),
        };
        self.commit_edge(edge)
    }

    /// Run a drawn edge through both policy stages and commit it
    pub fn commit_edge(&mut self, mut edge: GraphEdge) -> Result<EdgeId> {
        if !self
            .policy
            .validate_connection(&self.graph, &edge.source, &edge.target)
        {
            return Err(EditorError::invalid_connection(format!(
                "edge '{}' does not end on a valid port",
                edge.id
            )));
        }
        if !self.policy.validate_edge(&mut edge, EdgeCreation::Create, None) {
            return Err(EditorError::invalid_connection(format!(
                "edge '{}' was refused",
                edge.id
            )));
        }
        let id = edge.id.clone();
        self.transact(BatchKind::AddEdge, |tx| tx.insert_edge(edge, None))?;
        Ok(id)
    }

    /// Reattach one end of an existing edge, keeping its id and position in
    /// the edge list
    pub fn reconnect_edge(&mut self, edge_id: &str, end: EdgeEnd, to: Endpoint) -> Result<()> {
        let previous = self
            .graph
            .edge(edge_id)
            .cloned()
            .ok_or_else(|| EditorError::UnknownEdge(edge_id.to_string()))?;
        let mut next = previous.clone();
        match end {
            EdgeEnd::Source => next.source = to,
            EdgeEnd::Target => next.target = to,
        }
        if next == previous {
            return Ok(());
        }
        if !self
            .policy
            .validate_connection(&self.graph, &next.source, &next.target)
        {
            return Err(EditorError::invalid_connection(format!(
                "edge '{}' cannot be reattached there",
                edge_id
            )));
        }
        if !self
            .policy
            .validate_edge(&mut next, EdgeCreation::Update, Some(&previous))
        {
            return Err(EditorError::invalid_connection(format!(
                "edge '{}' was refused",
                edge_id
            )));
        }
        self.transact(BatchKind::ReconnectEdge, |tx| {
            let index = tx.remove_edge(edge_id)?;
            tx.insert_edge(next, Some(index))
        })
    }

    /// Remove cells; edges attached to removed nodes go with them
    pub fn remove_cells(&mut self, cells: &[CellId]) -> Result<()> {
        self.remove_as(BatchKind::RemoveCells, cells)
    }

    /// Remove every selected cell as one batch
    pub fn delete_selection(&mut self) -> Result<()> {
        let cells = self.selection.cells().to_vec();
        self.remove_cells(&cells)
    }

    /// Move nodes to absolute positions as one batch
    pub fn move_nodes(&mut self, moves: &[(NodeId, Point)]) -> Result<()> {
        self.transact(BatchKind::MoveNodes, |tx| {
            for (id, to) in moves {
                let current = tx
                    .graph()
                    .node(id)
                    .map(|n| n.position)
                    .ok_or_else(|| EditorError::UnknownNode(id.clone()))?;
                if current != *to {
                    tx.move_node(id, *to)?;
                }
            }
            Ok(())
        })
    }

    pub fn resize_node(&mut self, id: &str, size: Size) -> Result<()> {
        self.transact(BatchKind::ResizeNode, |tx| {
            let current = tx
                .graph()
                .node(id)
                .map(|n| n.size)
                .ok_or_else(|| EditorError::UnknownNode(id.to_string()))?;
            if current != size {
                tx.resize_node(id, size)?;
            }
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Live node drag
    // ------------------------------------------------------------------

    /// Move a node while it is being dragged; not recorded in history
    pub(crate) fn drag_node_to(&mut self, id: &str, to: Point) -> Result<()> {
        let change = self.graph.set_node_position(id, to)?;
        self.emit_changes(std::slice::from_ref(&change));
        Ok(())
    }

    /// Record a finished drag as one move batch
    ///
    /// The moves are already applied; `origins` are the positions the nodes
    /// had when the drag started.
    pub(crate) fn finish_drag(&mut self, origins: &[(NodeId, Point)]) {
        let changes: Vec<Change> = origins
            .iter()
            .filter_map(|(id, from)| {
                let to = self.graph.node(id)?.position;
                (to != *from).then(|| Change::MoveNode {
                    id: id.clone(),
                    from: *from,
                    to,
                })
            })
            .collect();
        if changes.is_empty() {
            return;
        }
        log::debug!("Editor: drag moved {} node(s)", changes.len());
        self.history.push(HistoryEntry::new(BatchKind::MoveNodes, changes));
    }

    /// Put dragged nodes back where the drag started
    pub(crate) fn cancel_drag(&mut self, origins: &[(NodeId, Point)]) {
        for (id, from) in origins {
            if let Ok(change) = self.graph.set_node_position(id, *from) {
                self.emit_changes(std::slice::from_ref(&change));
            }
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Replace the selection; ids not in the graph are ignored
    pub fn select(&mut self, cells: impl IntoIterator<Item = CellId>) {
        let graph = &self.graph;
        let changed = self
            .selection
            .replace(cells.into_iter().filter(|c| graph.contains(c)));
        if changed {
            self.emit_selection();
        }
    }

    /// Select every node (edges are not included)
    pub fn select_all(&mut self) {
        let nodes: Vec<CellId> = self
            .graph
            .nodes()
            .iter()
            .map(|n| CellId::Node(n.id.clone()))
            .collect();
        self.select(nodes);
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.emit_selection();
        }
    }

    /// Rubber-band selection of the nodes fully inside `rect`
    pub fn select_in_rect(&mut self, rect: &Rect) {
        let hit = nodes_in_rect(&self.graph, rect);
        self.select(hit);
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    /// Copy the selected nodes and their interior edges
    ///
    /// Returns false, leaving the clipboard alone, when nothing is selected.
    pub fn copy(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.clipboard = Clipboard::capture(&self.graph, self.selection.cells());
        log::debug!(
            "Editor: copied {} node(s), {} edge(s)",
            self.clipboard.nodes().len(),
            self.clipboard.edges().len()
        );
        true
    }

    /// Copy, then remove the selection as one batch
    pub fn cut(&mut self) -> Result<()> {
        if !self.copy() {
            return Ok(());
        }
        let cells = self.selection.cells().to_vec();
        self.remove_as(BatchKind::Cut, &cells)
    }

    /// Insert a fresh copy of the clipboard and select it
    pub fn paste(&mut self) -> Result<Vec<CellId>> {
        let (nodes, edges) = self.clipboard.next_paste(self.config.paste_offset)?;
        let pasted: Vec<CellId> = nodes
            .iter()
            .map(|n| CellId::Node(n.id.clone()))
            .chain(edges.iter().map(|e| CellId::Edge(e.id.clone())))
            .collect();

        self.transact(BatchKind::Paste, |tx| {
            for node in nodes {
                tx.insert_node(node)?;
            }
            for edge in edges {
                tx.insert_edge(edge, None)?;
            }
            Ok(())
        })?;
        self.select(pasted.clone());
        Ok(pasted)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<()> {
        let result = self.history.undo(&mut self.graph);
        self.after_replay("undo", result)
    }

    pub fn redo(&mut self) -> Result<()> {
        let result = self.history.redo(&mut self.graph);
        self.after_replay("redo", result)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------

    /// Replace the whole model with a validated snapshot
    ///
    /// On error the current model is untouched. On success selection,
    /// clipboard and history start over.
    pub fn load_graph(&mut self, snapshot: GraphSnapshot) -> Result<()> {
        let graph = match Graph::from_snapshot(snapshot) {
            Ok(graph) => graph,
            Err(e) => {
                log::warn!("Editor: rejected graph load: {}", e);
                return Err(e);
            }
        };
        self.graph = graph;
        self.clipboard = Clipboard::new();
        self.history.clear();
        self.clear_selection();
        log::debug!(
            "Editor: loaded {} node(s), {} edge(s)",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        self.emit(GraphEvent::GraphLoaded {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Apply `f` as one atomic batch and record it
    fn transact<T>(
        &mut self,
        kind: BatchKind,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut tx = Transaction::new(&mut self.graph);
        let value = match f(&mut tx) {
            Ok(value) => value,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    log::error!("Editor: rollback of {} failed: {}", kind, rollback_err);
                    self.reset();
                    return Err(rollback_err);
                }
                log::debug!("Editor: {} batch rolled back: {}", kind, err);
                return Err(err);
            }
        };
        let changes = tx.into_changes();
        if changes.is_empty() {
            return Ok(value);
        }

        log::debug!("Editor: committed {} batch ({} changes)", kind, changes.len());
        self.emit_changes(&changes);
        self.history.push(HistoryEntry::new(kind, changes));
        if self.selection.prune(&self.graph) {
            self.emit_selection();
        }
        Ok(value)
    }

    fn remove_as(&mut self, kind: BatchKind, cells: &[CellId]) -> Result<()> {
        let (edges, nodes) = self.graph.removal_plan(cells);
        self.transact(kind, |tx| {
            for id in &edges {
                tx.remove_edge(id)?;
            }
            for id in &nodes {
                tx.remove_node(id)?;
            }
            Ok(())
        })
    }

    fn after_replay(&mut self, action: &str, result: Result<Vec<Change>>) -> Result<()> {
        match result {
            Ok(changes) => {
                log::debug!("Editor: {} applied {} change(s)", action, changes.len());
                self.emit_changes(&changes);
                if self.selection.prune(&self.graph) {
                    self.emit_selection();
                }
                Ok(())
            }
            Err(EditorError::EmptyHistoryStack) => Err(EditorError::EmptyHistoryStack),
            Err(e) => {
                log::error!("Editor: {} failed, resetting model: {}", action, e);
                self.reset();
                Err(e)
            }
        }
    }

    /// Drop everything after an invariant violation
    fn reset(&mut self) {
        self.graph.clear();
        self.clipboard = Clipboard::new();
        self.history.clear();
        self.clear_selection();
        self.emit(GraphEvent::GraphLoaded {
            node_count: 0,
            edge_count: 0,
        });
    }

    pub(crate) fn emit(&self, event: GraphEvent) {
        let _ = self.events.send(event);
    }

    fn emit_selection(&self) {
        self.emit(GraphEvent::SelectionChanged {
            cells: self.selection.cells().to_vec(),
        });
    }

    fn emit_changes(&self, changes: &[Change]) {
        for change in changes {
            let event = match change {
                Change::AddNode { node, .. } => GraphEvent::NodeAdded {
                    node_id: node.id.clone(),
                },
                Change::RemoveNode { node, .. } => GraphEvent::NodeRemoved {
                    node_id: node.id.clone(),
                },
                Change::AddEdge { edge, .. } => GraphEvent::EdgeAdded {
                    edge_id: edge.id.clone(),
                },
                Change::RemoveEdge { edge, .. } => GraphEvent::EdgeRemoved {
                    edge_id: edge.id.clone(),
                },
                Change::MoveNode { id, to, .. } => GraphEvent::NodeMoved {
                    node_id: id.clone(),
                    position: *to,
                },
                Change::ResizeNode { id, to, .. } => GraphEvent::NodeResized {
                    node_id: id.clone(),
                    size: *to,
                },
            };
            self.emit(event);
        }
    }
}
