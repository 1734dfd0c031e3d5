//! Selection set
//!
//! The selection is transient view-adjacent state: it is never serialized
//! and is always replaced as a whole.

use crate::graph::Graph;
use crate::types::{CellId, Rect};

/// Ordered, duplicate-free set of selected cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    cells: Vec<CellId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, cell: &CellId) -> bool {
        self.cells.contains(cell)
    }

    /// Selected node ids, in selection order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().filter_map(CellId::as_node)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().filter_map(CellId::as_edge)
    }

    /// Replace the whole set; returns whether it changed
    pub(crate) fn replace(&mut self, cells: impl IntoIterator<Item = CellId>) -> bool {
        let mut next: Vec<CellId> = Vec::new();
        for cell in cells {
            if !next.contains(&cell) {
                next.push(cell);
            }
        }
        if next == self.cells {
            return false;
        }
        self.cells = next;
        true
    }

    /// Empty the set; returns whether it changed
    pub(crate) fn clear(&mut self) -> bool {
        if self.cells.is_empty() {
            return false;
        }
        self.cells.clear();
        true
    }

    /// Drop cells that no longer exist in `graph`; returns whether any were dropped
    pub(crate) fn prune(&mut self, graph: &Graph) -> bool {
        let before = self.cells.len();
        self.cells.retain(|cell| graph.contains(cell));
        self.cells.len() != before
    }
}

/// Every node lying completely inside `rect` (rubber-band selection)
pub fn nodes_in_rect(graph: &Graph, rect: &Rect) -> Vec<CellId> {
    graph
        .nodes()
        .iter()
        .filter(|n| rect.contains_rect(&n.bounds()))
        .map(|n| CellId::Node(n.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::NodeType;

    #[test]
    fn test_replace_dedupes_and_reports_change() {
        let mut selection = Selection::new();
        assert!(selection.replace([CellId::node("a"), CellId::node("a"), CellId::edge("e")]));
        assert_eq!(selection.len(), 2);
        assert!(!selection.replace([CellId::node("a"), CellId::edge("e")]));
        assert_eq!(selection.node_ids().collect::<Vec<_>>(), ["a"]);
        assert_eq!(selection.edge_ids().collect::<Vec<_>>(), ["e"]);
        assert!(selection.clear());
        assert!(!selection.clear());
    }

    #[test]
    fn test_prune_removes_missing_cells() {
        let graph = GraphBuilder::new()
            .add_node("a", NodeType::Cron, (0.0, 0.0))
            .build_graph()
            .unwrap();
        let mut selection = Selection::new();
        selection.replace([CellId::node("a"), CellId::node("gone")]);
        assert!(selection.prune(&graph));
        assert_eq!(selection.cells(), [CellId::node("a")]);
        assert!(!selection.prune(&graph));
    }

    #[test]
    fn test_nodes_in_rect() {
        let graph = GraphBuilder::new()
            .add_node("a", NodeType::Webhook, (0.0, 0.0))
            .add_node("b", NodeType::Shell, (200.0, 0.0))
            .build_graph()
            .unwrap();
        let hit = nodes_in_rect(&graph, &Rect::new(-10.0, -10.0, 220.0, 100.0));
        assert_eq!(hit, vec![CellId::node("a")]);
        let all = nodes_in_rect(&graph, &Rect::new(-10.0, -10.0, 500.0, 100.0));
        assert_eq!(all.len(), 2);
    }
}
