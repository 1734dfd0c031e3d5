//! Undo/redo built from invertible changes
//!
//! Every user-level mutation is recorded as one [`HistoryEntry`]: a named
//! batch of primitive [`Change`]s in the order they were applied. Each change
//! carries the full cell and its index, so replaying an inverse restores the
//! exact identifiers, field values and ordering.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::graph::Graph;
use crate::types::{GraphEdge, GraphNode, NodeId, Point, Size};

/// A primitive, invertible graph mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Change {
    AddNode { node: GraphNode, index: usize },
    RemoveNode { node: GraphNode, index: usize },
    AddEdge { edge: GraphEdge, index: usize },
    RemoveEdge { edge: GraphEdge, index: usize },
    MoveNode { id: NodeId, from: Point, to: Point },
    ResizeNode { id: NodeId, from: Size, to: Size },
}

impl Change {
    /// The change that undoes this one
    pub fn inverse(&self) -> Change {
        match self {
            Self::AddNode { node, index } => Self::RemoveNode {
                node: node.clone(),
                index: *index,
            },
            Self::RemoveNode { node, index } => Self::AddNode {
                node: node.clone(),
                index: *index,
            },
            Self::AddEdge { edge, index } => Self::RemoveEdge {
                edge: edge.clone(),
                index: *index,
            },
            Self::RemoveEdge { edge, index } => Self::AddEdge {
                edge: edge.clone(),
                index: *index,
            },
            Self::MoveNode { id, from, to } => Self::MoveNode {
                id: id.clone(),
                from: *to,
                to: *from,
            },
            Self::ResizeNode { id, from, to } => Self::ResizeNode {
                id: id.clone(),
                from: *to,
                to: *from,
            },
        }
    }
}

/// Logical operation a history entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchKind {
    AddNode,
    AddEdge,
    ReconnectEdge,
    RemoveCells,
    MoveNodes,
    ResizeNode,
    Cut,
    Paste,
}

impl BatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddNode => "add-node",
            Self::AddEdge => "add-edge",
            Self::ReconnectEdge => "reconnect-edge",
            Self::RemoveCells => "remove-cells",
            Self::MoveNodes => "move-nodes",
            Self::ResizeNode => "resize-node",
            Self::Cut => "cut",
            Self::Paste => "paste",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One undoable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: BatchKind,
    /// Changes in the order they were applied
    pub changes: Vec<Change>,
}

impl HistoryEntry {
    pub fn new(kind: BatchKind, changes: Vec<Change>) -> Self {
        Self { kind, changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Apply the inverses newest-first; returns what was applied
    fn revert(&self, graph: &mut Graph) -> Result<Vec<Change>> {
        let mut applied = Vec::with_capacity(self.changes.len());
        for change in self.changes.iter().rev() {
            let inverse = change.inverse();
            graph.apply(&inverse)?;
            applied.push(inverse);
        }
        Ok(applied)
    }

    fn replay(&self, graph: &mut Graph) -> Result<Vec<Change>> {
        for change in &self.changes {
            graph.apply(change)?;
        }
        Ok(self.changes.clone())
    }
}

/// Linear undo/redo stacks
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    /// Maximum number of undoable entries to keep
    max_entries: usize,
}

impl History {
    /// Create a history keeping at most `max_entries` undoable batches
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Record a batch that has already been applied
    ///
    /// Empty batches are dropped. Any redo history is discarded.
    pub fn push(&mut self, entry: HistoryEntry) {
        if entry.is_empty() {
            return;
        }
        self.redo_stack.clear();
        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > self.max_entries {
            self.undo_stack.pop_front();
        }
    }

    /// Undo the newest batch, returning the changes applied to `graph`
    pub fn undo(&mut self, graph: &mut Graph) -> Result<Vec<Change>> {
        let entry = self.undo_stack.pop_back().ok_or(EditorError::EmptyHistoryStack)?;
        let applied = entry.revert(graph)?;
        self.redo_stack.push(entry);
        Ok(applied)
    }

    /// Redo the most recently undone batch
    pub fn redo(&mut self, graph: &mut Graph) -> Result<Vec<Change>> {
        let entry = self.redo_stack.pop().ok_or(EditorError::EmptyHistoryStack)?;
        let applied = entry.replay(graph)?;
        self.undo_stack.push_back(entry);
        Ok(applied)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// The batch the next undo would revert
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.undo_stack.back()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(crate::constants::defaults::HISTORY_LIMIT)
    }
}

/// Changes applied to a graph as one in-flight batch
///
/// If the batch fails half-way, [`Transaction::rollback`] reverts what was
/// already applied so the graph never holds a partial batch.
pub(crate) struct Transaction<'g> {
    graph: &'g mut Graph,
    changes: Vec<Change>,
}

impl<'g> Transaction<'g> {
    pub(crate) fn new(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            changes: Vec::new(),
        }
    }

    pub(crate) fn graph(&self) -> &Graph {
        &*self.graph
    }

    pub(crate) fn insert_node(&mut self, node: GraphNode) -> Result<()> {
        let change = self.graph.insert_node(node, None)?;
        self.changes.push(change);
        Ok(())
    }

    pub(crate) fn remove_node(&mut self, id: &str) -> Result<()> {
        let change = self.graph.remove_node(id)?;
        self.changes.push(change);
        Ok(())
    }

    pub(crate) fn insert_edge(&mut self, edge: GraphEdge, index: Option<usize>) -> Result<()> {
        let change = self.graph.insert_edge(edge, index)?;
        self.changes.push(change);
        Ok(())
    }

    /// Remove an edge, returning the index it occupied
    pub(crate) fn remove_edge(&mut self, id: &str) -> Result<usize> {
        let index = self
            .graph
            .edges()
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EditorError::UnknownEdge(id.to_string()))?;
        let change = self.graph.remove_edge(id)?;
        self.changes.push(change);
        Ok(index)
    }

    pub(crate) fn move_node(&mut self, id: &str, to: Point) -> Result<()> {
        let change = self.graph.set_node_position(id, to)?;
        self.changes.push(change);
        Ok(())
    }

    pub(crate) fn resize_node(&mut self, id: &str, to: Size) -> Result<()> {
        let change = self.graph.set_node_size(id, to)?;
        self.changes.push(change);
        Ok(())
    }

    pub(crate) fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    /// Revert every change applied so far
    pub(crate) fn rollback(self) -> Result<()> {
        for change in self.changes.iter().rev() {
            self.graph.apply(&change.inverse())?;
        }
        Ok(())
    }
}
