//! FILENAME: core/pivot-layout/src/collapse.rs
//! Collapse State Manager - which tree rows are folded.
//!
//! State is a map of explicit per-node entries plus two defaults: the global
//! `hierarchy_collapse` flag and an optional `expand_depth`. A node resolves
//! through the explicit entry first, then the flag, then the depth.

use std::cell::Cell;
use std::collections::BTreeMap;

use crate::definition::SheetOptions;
use crate::hierarchy::Hierarchy;
use crate::node::{Node, NodeIdx, ROOT_IDX};

#[derive(Debug, Clone, Default)]
pub struct CollapseState {
    collapsed_rows: BTreeMap<String, bool>,
    hierarchy_collapse: bool,
    expand_depth: Option<usize>,
    revision: u64,
    /// (state revision, hierarchy revision, effective leaf count)
    memo: Cell<Option<(u64, u64, usize)>>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &SheetOptions) -> Self {
        CollapseState {
            collapsed_rows: options.collapsed_rows.clone(),
            hierarchy_collapse: options.hierarchy_collapse,
            expand_depth: options.expand_depth,
            ..Self::default()
        }
    }

    pub fn collapsed_rows(&self) -> &BTreeMap<String, bool> {
        &self.collapsed_rows
    }

    pub fn hierarchy_collapse(&self) -> bool {
        self.hierarchy_collapse
    }

    pub fn expand_depth(&self) -> Option<usize> {
        self.expand_depth
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Upserts the explicit state of one node. Ids need not exist yet.
    pub fn set_collapsed(&mut self, id: impl Into<String>, collapsed: bool) {
        self.collapsed_rows.insert(id.into(), collapsed);
        self.touch();
    }

    /// Flips the resolved state of `id` and returns the new state.
    pub fn toggle(&mut self, hierarchy: &Hierarchy, id: &str) -> bool {
        let current = match hierarchy.get(id) {
            Some(node) => self.resolve(node),
            None => self.collapsed_rows.get(id).copied().unwrap_or(false),
        };
        self.set_collapsed(id, !current);
        !current
    }

    /// Drops every explicit entry and the expand depth, then sets the default.
    pub fn collapse_all(&mut self, collapsed: bool) {
        self.collapsed_rows.clear();
        self.expand_depth = None;
        self.hierarchy_collapse = collapsed;
        self.touch();
    }

    pub fn set_expand_depth(&mut self, depth: Option<usize>) {
        self.expand_depth = depth;
        self.touch();
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.memo.set(None);
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Resolved state of a node. Leaves and the root never collapse.
    pub fn resolve(&self, node: &Node) -> bool {
        if node.is_leaf() || node.is_root() {
            return false;
        }
        if let Some(&explicit) = self.collapsed_rows.get(&node.id) {
            return explicit;
        }
        if self.hierarchy_collapse {
            return true;
        }
        self.expand_depth.is_some_and(|depth| node.level >= depth)
    }

    pub fn is_collapsed(&self, hierarchy: &Hierarchy, idx: NodeIdx) -> bool {
        self.resolve(hierarchy.node(idx))
    }

    /// True when no strict ancestor is collapsed.
    pub fn is_visible(&self, hierarchy: &Hierarchy, idx: NodeIdx) -> bool {
        hierarchy
            .ancestors(idx)
            .all(|ancestor| !self.is_collapsed(hierarchy, ancestor))
    }

    /// `idx` itself when visible, otherwise its outermost collapsed ancestor.
    pub fn nearest_visible_ancestor(&self, hierarchy: &Hierarchy, idx: NodeIdx) -> NodeIdx {
        hierarchy
            .ancestors(idx)
            .filter(|&ancestor| self.is_collapsed(hierarchy, ancestor))
            .last()
            .unwrap_or(idx)
    }

    /// Visible nodes in display order, root excluded. Descendants of a
    /// collapsed node are skipped.
    pub fn visible_nodes(&self, hierarchy: &Hierarchy) -> Vec<NodeIdx> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeIdx> = hierarchy.node(ROOT_IDX).children.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            let node = hierarchy.node(idx);
            if !self.resolve(node) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Visible leaves and visible collapsed nodes, in display order.
    pub fn effective_leaves(&self, hierarchy: &Hierarchy) -> Vec<NodeIdx> {
        self.visible_nodes(hierarchy)
            .into_iter()
            .filter(|&idx| {
                let node = hierarchy.node(idx);
                node.is_leaf() || self.resolve(node)
            })
            .collect()
    }

    /// Memoized `effective_leaves(hierarchy).len()`.
    pub fn visible_leaf_count(&self, hierarchy: &Hierarchy) -> usize {
        if let Some((state_rev, tree_rev, count)) = self.memo.get() {
            if state_rev == self.revision && tree_rev == hierarchy.revision() {
                return count;
            }
        }
        let count = self.effective_leaves(hierarchy).len();
        self.memo.set(Some((self.revision, hierarchy.revision(), count)));
        count
    }

    /// Writes the resolved state into every node's `is_collapsed`.
    pub fn apply_to(&self, hierarchy: &mut Hierarchy) {
        for node in hierarchy.nodes_mut() {
            node.is_collapsed = self.resolve(node);
        }
    }
}
