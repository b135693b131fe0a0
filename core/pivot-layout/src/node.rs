//! FILENAME: core/pivot-layout/src/node.rs
//! PURPOSE: Header node stored in a hierarchy arena.

use std::fmt;

use dataset::{Condition, FieldValue};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Index of a node inside its hierarchy arena.
pub type NodeIdx = usize;

/// The synthetic root always sits at index 0.
pub const ROOT_IDX: NodeIdx = 0;

pub const ROOT_ID: &str = "root";

/// Joins path segments in node ids.
pub const ID_SEPARATOR: &str = "[&]";

/// Key of the synthetic measure level.
pub const EXTRA_FIELD: &str = "$$extra$$";

/// Key of table-mode row leaves.
pub const SERIES_NUMBER_FIELD: &str = "$$series_number$$";

/// Grouping path of a node. Most pivots nest only a few dimensions.
pub type NodeQuery = SmallVec<[Condition; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

/// One header cell of the row or column tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Path id, e.g. `root[&]zhejiang[&]hangzhou`.
    pub id: String,
    /// Field this node represents.
    pub key: String,
    pub value: FieldValue,
    pub label: String,
    /// Display order of the children.
    pub children: Vec<NodeIdx>,
    pub parent: Option<NodeIdx>,
    /// Depth from the root (root = 0).
    pub level: usize,
    pub is_collapsed: bool,
    /// `(field, value)` conditions from the root, measure level excluded.
    pub query: NodeQuery,
    /// Measure name for nodes at or below a measure level.
    pub measure: Option<String>,
    /// Source record of a table-mode row leaf.
    pub record_index: Option<usize>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Ordinal among the hierarchy leaves.
    pub leaf_index: Option<usize>,
}

impl Node {
    pub fn root() -> Self {
        Node::new(ROOT_ID.to_string(), ROOT_ID.to_string(), FieldValue::Empty, String::new())
    }

    pub fn new(id: String, key: String, value: FieldValue, label: String) -> Self {
        Node {
            id,
            key,
            value,
            label,
            children: Vec::new(),
            parent: None,
            level: 0,
            is_collapsed: false,
            query: SmallVec::new(),
            measure: None,
            record_index: None,
            x: f64::NAN,
            y: f64::NAN,
            width: f64::NAN,
            height: f64::NAN,
            leaf_index: None,
        }
    }

    /// Id of a child of `parent_id` holding `segment`.
    pub fn child_id(parent_id: &str, segment: &str) -> String {
        let mut id = String::with_capacity(parent_id.len() + ID_SEPARATOR.len() + segment.len());
        id.push_str(parent_id);
        id.push_str(ID_SEPARATOR);
        id.push_str(segment);
        id
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_measure(&self) -> bool {
        self.key == EXTRA_FIELD
    }

    /// Whether the last layout pass placed this node.
    pub fn has_geometry(&self) -> bool {
        !self.x.is_nan()
    }

    pub fn clear_geometry(&mut self) {
        self.x = f64::NAN;
        self.y = f64::NAN;
        self.width = f64::NAN;
        self.height = f64::NAN;
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_id() {
        let id = Node::child_id(ROOT_ID, "zhejiang");
        assert_eq!(id, "root[&]zhejiang");
        assert_eq!(Node::child_id(&id, "hangzhou"), "root[&]zhejiang[&]hangzhou");
    }

    #[test]
    fn test_new_node_has_no_geometry() {
        let node = Node::root();
        assert!(node.is_leaf());
        assert!(node.is_root());
        assert!(!node.has_geometry());
        assert!(node.width.is_nan());
    }
}
