//! FILENAME: core/pivot-layout/src/hierarchy.rs
//! Row / column header tree.
//!
//! Nodes live in a flat arena with the synthetic root at index 0. Children
//! are referenced by index, so reordering siblings never moves nodes and
//! `NodeIdx` values stay valid until the next rebuild.

use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::node::{Axis, Node, NodeIdx, ROOT_IDX};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Process-wide revision counter. Distinct hierarchies never share a value,
/// so memo tables keyed by revision cannot confuse two trees.
pub(crate) fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub struct Hierarchy {
    axis: Axis,
    nodes: Vec<Node>,
    id_index: FxHashMap<String, NodeIdx>,
    /// Children order as built, restored before every sort pass.
    base_children: Vec<Vec<NodeIdx>>,
    leaves: Vec<NodeIdx>,
    /// Key of each level below the root (`level_keys[0]` is level 1).
    level_keys: Vec<String>,
    max_level: usize,
    revision: u64,
}

impl Hierarchy {
    /// Creates a hierarchy holding only the root.
    pub fn new(axis: Axis) -> Self {
        let root = Node::root();
        let mut id_index = FxHashMap::default();
        id_index.insert(root.id.clone(), ROOT_IDX);
        Hierarchy {
            axis,
            nodes: vec![root],
            id_index,
            base_children: vec![Vec::new()],
            leaves: Vec::new(),
            level_keys: Vec::new(),
            max_level: 0,
            revision: next_revision(),
        }
    }

    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Appends `node` as the last child of `parent`.
    ///
    /// Panics on a duplicate id or an unknown parent: both mean the builder
    /// produced an inconsistent tree.
    pub fn push_node(&mut self, parent: NodeIdx, mut node: Node) -> NodeIdx {
        assert!(parent < self.nodes.len(), "parent {} out of range", parent);
        let idx = self.nodes.len();
        let previous = self.id_index.insert(node.id.clone(), idx);
        assert!(previous.is_none(), "duplicate node id '{}'", node.id);

        node.parent = Some(parent);
        node.level = self.nodes[parent].level + 1;
        node.children.clear();
        self.max_level = self.max_level.max(node.level);

        self.nodes.push(node);
        self.nodes[parent].children.push(idx);
        idx
    }

    /// Freezes the built order as the base snapshot and indexes the leaves.
    pub fn seal(&mut self) {
        self.base_children = self.nodes.iter().map(|n| n.children.clone()).collect();
        let mut level_keys: Vec<Option<String>> = vec![None; self.max_level];
        for idx in self.dfs() {
            let node = &self.nodes[idx];
            let slot = &mut level_keys[node.level - 1];
            if slot.is_none() {
                *slot = Some(node.key.clone());
            }
        }
        self.level_keys = level_keys.into_iter().map(Option::unwrap_or_default).collect();
        self.reindex_leaves();
        self.bump_revision();
    }

    // ========================================================================
    // ORDER MAINTENANCE
    // ========================================================================

    /// Puts every `children` sequence back into build order.
    pub fn restore_base_order(&mut self) {
        for (node, base) in self.nodes.iter_mut().zip(&self.base_children) {
            node.children.clone_from(base);
        }
    }

    /// Replaces the display order of `parent`'s children. The new order must
    /// be a permutation of the current children.
    pub fn set_children(&mut self, parent: NodeIdx, order: Vec<NodeIdx>) {
        debug_assert_eq!(order.len(), self.nodes[parent].children.len());
        self.nodes[parent].children = order;
    }

    /// Recomputes the leaf list and dense leaf ordinals in display order.
    pub fn reindex_leaves(&mut self) {
        for node in &mut self.nodes {
            node.leaf_index = None;
        }
        let leaves: Vec<NodeIdx> = self
            .dfs()
            .into_iter()
            .filter(|&idx| self.nodes[idx].is_leaf())
            .collect();
        for (ordinal, &idx) in leaves.iter().enumerate() {
            self.nodes[idx].leaf_index = Some(ordinal);
        }
        self.leaves = leaves;
    }

    pub fn bump_revision(&mut self) {
        self.revision = next_revision();
    }

    /// Clears every `is_collapsed` flag.
    pub fn reset_collapsed(&mut self) {
        for node in &mut self.nodes {
            node.is_collapsed = false;
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn root(&self) -> &Node {
        &self.nodes[ROOT_IDX]
    }

    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
        &mut self.nodes[idx]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[ROOT_IDX].children.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIdx> {
        self.id_index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|idx| &self.nodes[idx])
    }

    /// Leaves in display order.
    pub fn leaves(&self) -> &[NodeIdx] {
        &self.leaves
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn leaf_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.leaves.iter().map(move |&idx| &self.nodes[idx])
    }

    pub fn level_keys(&self) -> &[String] {
        &self.level_keys
    }

    /// Deepest level present (0 for a root-only tree).
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ========================================================================
    // TRAVERSAL
    // ========================================================================

    /// Strict ancestors of `idx`, nearest first, root excluded.
    pub fn ancestors(&self, idx: NodeIdx) -> Ancestors<'_> {
        Ancestors {
            hierarchy: self,
            next: self.nodes[idx].parent,
        }
    }

    /// Pre-order walk in display order, root excluded.
    pub fn dfs(&self) -> Vec<NodeIdx> {
        let mut order = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        let mut stack: Vec<NodeIdx> = self.nodes[ROOT_IDX].children.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev().copied());
        }
        order
    }

    /// Nodes at `level` in display order.
    pub fn nodes_at_level(&self, level: usize) -> Vec<NodeIdx> {
        self.dfs()
            .into_iter()
            .filter(|&idx| self.nodes[idx].level == level)
            .collect()
    }

    /// Ids of the leaves in display order.
    pub fn leaf_ids(&self) -> Vec<&str> {
        self.leaf_nodes().map(|n| n.id.as_str()).collect()
    }
}

pub struct Ancestors<'a> {
    hierarchy: &'a Hierarchy,
    next: Option<NodeIdx>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeIdx;

    fn next(&mut self) -> Option<NodeIdx> {
        let idx = self.next?;
        if idx == ROOT_IDX {
            self.next = None;
            return None;
        }
        self.next = self.hierarchy.nodes[idx].parent;
        Some(idx)
    }
}
