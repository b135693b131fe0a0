//! FILENAME: core/pivot-layout/src/layout.rs
//! Layout Coordinator - assigns pixel geometry to header nodes.
//!
//! Leaf sizes are pre-computed once per pass into prefix sums
//! (`positions[i]` = start of effective leaf i, last entry = content extent),
//! so range queries during scrolling are binary searches.
//!
//! Coordinates:
//! - Row nodes: `x` inside the row header band, `y` in content space.
//! - Column nodes: `x` in content space, `y` inside the column header band.
//! - Nodes hidden under a collapsed ancestor and the root carry NaN.

use std::ops::Range;

use crate::collapse::CollapseState;
use crate::definition::{SheetOptions, Sizing};
use crate::hierarchy::Hierarchy;
use crate::log_debug;
use crate::node::{Axis, Node, NodeIdx};
use crate::viewport::ScrollOffset;

// ============================================================================
// AXIS LAYOUT
// ============================================================================

/// Leaf geometry along one axis.
#[derive(Debug, Clone)]
pub struct AxisLayout {
    pub axis: Axis,
    /// Effective leaves in display order.
    pub leaves: Vec<NodeIdx>,
    /// Prefix sums of leaf sizes, `leaves.len() + 1` entries.
    pub positions: Vec<f64>,
    /// Leading leaves exempt from scroll (as configured).
    pub frozen_count: usize,
}

impl AxisLayout {
    fn empty(axis: Axis) -> Self {
        AxisLayout {
            axis,
            leaves: Vec::new(),
            positions: vec![0.0],
            frozen_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Sum of all leaf sizes.
    pub fn content_extent(&self) -> f64 {
        self.positions.last().copied().unwrap_or(0.0)
    }

    pub fn start(&self, ordinal: usize) -> f64 {
        self.positions[ordinal]
    }

    pub fn size(&self, ordinal: usize) -> f64 {
        self.positions[ordinal + 1] - self.positions[ordinal]
    }

    /// Extent covered by a range of leaf ordinals.
    pub fn span(&self, range: &Range<usize>) -> f64 {
        if range.start >= range.end {
            return 0.0;
        }
        self.positions[range.end] - self.positions[range.start]
    }

    /// Ordinals of the leaves whose box intersects `[start, end)`.
    pub fn leaves_intersecting(&self, start: f64, end: f64) -> Range<usize> {
        let n = self.leaves.len();
        if n == 0 || end <= start {
            return 0..0;
        }
        // Leaves ending at or before `start` are out
        let first = self.positions[1..].partition_point(|&edge| edge <= start);
        // Leaves starting before `end` are in
        let last = self.positions[..n].partition_point(|&edge| edge < end);
        first..last.max(first)
    }

    /// Ordinal of the leaf covering content offset `offset`.
    pub fn leaf_at(&self, offset: f64) -> Option<usize> {
        if offset < 0.0 || offset >= self.content_extent() {
            return None;
        }
        let ordinal = self.positions[1..].partition_point(|&edge| edge <= offset);
        (ordinal < self.leaves.len()).then_some(ordinal)
    }
}

// ============================================================================
// LAYOUT RESULT
// ============================================================================

#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub rows: AxisLayout,
    pub columns: AxisLayout,
    pub row_header_width: f64,
    pub col_header_height: f64,
    pub content_width: f64,
    pub content_height: f64,
    pub frozen_row_header: bool,
}

impl LayoutResult {
    pub fn empty() -> Self {
        LayoutResult {
            rows: AxisLayout::empty(Axis::Row),
            columns: AxisLayout::empty(Axis::Column),
            row_header_width: 0.0,
            col_header_height: 0.0,
            content_width: 0.0,
            content_height: 0.0,
            frozen_row_header: true,
        }
    }

    /// Leading columns pinned during horizontal scroll. Columns only pin
    /// while the row header is frozen too.
    pub fn frozen_col_range(&self) -> Range<usize> {
        if !self.frozen_row_header {
            return 0..0;
        }
        0..self.columns.frozen_count.min(self.columns.len())
    }

    pub fn frozen_col_extent(&self) -> f64 {
        self.columns.span(&self.frozen_col_range())
    }

    /// Leading rows of `page` pinned during vertical scroll.
    pub fn frozen_row_range(&self, page: &Range<usize>) -> Range<usize> {
        let end = page.start.saturating_add(self.rows.frozen_count).min(page.end);
        page.start..end.max(page.start)
    }

    pub fn frozen_row_extent(&self, page: &Range<usize>) -> f64 {
        self.rows.span(&self.frozen_row_range(page))
    }

    /// Content-to-screen mapping for the given scroll position and page.
    pub fn screen_transform(&self, scroll: ScrollOffset, page: &Range<usize>) -> ScreenTransform {
        let frozen_rows = self.frozen_row_range(page);
        let frozen_cols = self.frozen_col_range();
        ScreenTransform {
            row_header_width: self.row_header_width,
            col_header_height: self.col_header_height,
            frozen_row_header: self.frozen_row_header,
            row_origin: self.rows.positions.get(page.start).copied().unwrap_or(0.0),
            frozen_row_end: self.rows.positions.get(frozen_rows.end).copied().unwrap_or(0.0),
            frozen_col_end: self.columns.positions.get(frozen_cols.end).copied().unwrap_or(0.0),
            scroll,
        }
    }
}

/// Maps node geometry to screen coordinates. Scroll applies only to nodes
/// outside the frozen bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    pub row_header_width: f64,
    pub col_header_height: f64,
    pub frozen_row_header: bool,
    /// Content y where the current page starts.
    pub row_origin: f64,
    /// Content y where the frozen rows of the page end.
    pub frozen_row_end: f64,
    /// Content x where the frozen columns end.
    pub frozen_col_end: f64,
    pub scroll: ScrollOffset,
}

impl ScreenTransform {
    /// Screen position of a node's top-left corner.
    pub fn to_screen(&self, axis: Axis, node: &Node) -> (f64, f64) {
        match axis {
            Axis::Row => {
                let x = if self.frozen_row_header {
                    node.x
                } else {
                    node.x - self.scroll.x
                };
                let frozen = node.y < self.frozen_row_end;
                let scroll_y = if frozen { 0.0 } else { self.scroll.y };
                (x, self.col_header_height + node.y - self.row_origin - scroll_y)
            }
            Axis::Column => {
                let frozen = self.frozen_row_header && node.x < self.frozen_col_end;
                let scroll_x = if frozen { 0.0 } else { self.scroll.x };
                (self.row_header_width + node.x - scroll_x, node.y)
            }
        }
    }
}

// ============================================================================
// LAYOUT PASS
// ============================================================================

/// Assigns geometry to every visible node of both hierarchies.
///
/// `collapse` applies to the row hierarchy only and should be `None` outside
/// tree mode.
pub fn layout(
    rows: &mut Hierarchy,
    columns: &mut Hierarchy,
    collapse: Option<&CollapseState>,
    options: &SheetOptions,
) -> LayoutResult {
    let row_header_width = rows.max_level() as f64 * options.row_header_level_width;
    let col_header_height = columns.max_level() as f64 * options.col_header_level_height;

    let available_width = (options.width - row_header_width).max(0.0);
    let available_height = (options.height - col_header_height).max(0.0);

    let row_layout = layout_axis(
        rows,
        collapse,
        options.row_sizing,
        available_height,
        options.row_header_level_width,
        options.frozen.row_count,
    );
    let col_layout = layout_axis(
        columns,
        None,
        options.col_sizing,
        available_width,
        options.col_header_level_height,
        options.frozen.col_count,
    );

    let result = LayoutResult {
        content_width: col_layout.content_extent(),
        content_height: row_layout.content_extent(),
        rows: row_layout,
        columns: col_layout,
        row_header_width,
        col_header_height,
        frozen_row_header: options.frozen.row_header,
    };

    log_debug!(
        "LAYOUT",
        "rows={} cols={} content={}x{} header={}x{}",
        result.rows.len(),
        result.columns.len(),
        result.content_width,
        result.content_height,
        result.row_header_width,
        result.col_header_height
    );
    result
}

/// Leaf sizes for one axis.
///
/// Adaptive sizing splits `available` evenly (floored to whole pixels, never
/// below `min_size`) and hands the leftover pixels to the last leaf.
pub fn leaf_sizes(count: usize, sizing: Sizing, available: f64) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    match sizing {
        Sizing::Fixed { size } => vec![size; count],
        Sizing::Adaptive { min_size } => {
            let base = (available / count as f64).floor();
            if base < min_size {
                return vec![min_size; count];
            }
            let mut sizes = vec![base; count];
            let remainder = available - base * count as f64;
            if let Some(last) = sizes.last_mut() {
                *last += remainder;
            }
            sizes
        }
    }
}

fn layout_axis(
    hierarchy: &mut Hierarchy,
    collapse: Option<&CollapseState>,
    sizing: Sizing,
    available: f64,
    band: f64,
    frozen_count: usize,
) -> AxisLayout {
    let axis = hierarchy.axis();
    let visible = match collapse {
        Some(state) => state.visible_nodes(hierarchy),
        None => hierarchy.dfs(),
    };
    let is_effective_leaf = |node: &Node| node.is_leaf() || collapse.is_some_and(|c| c.resolve(node));

    let leaves: Vec<NodeIdx> = visible
        .iter()
        .copied()
        .filter(|&idx| is_effective_leaf(hierarchy.node(idx)))
        .collect();

    let sizes = leaf_sizes(leaves.len(), sizing, available);
    let mut positions = Vec::with_capacity(sizes.len() + 1);
    let mut edge = 0.0;
    positions.push(edge);
    for size in &sizes {
        edge += size;
        positions.push(edge);
    }

    for node in hierarchy.nodes_mut() {
        node.clear_geometry();
    }

    let max_level = hierarchy.max_level();
    for (ordinal, &idx) in leaves.iter().enumerate() {
        let node = hierarchy.node_mut(idx);
        // A collapsed node stands in for its subtree and fills the deeper bands
        let bands = (max_level + 1).saturating_sub(node.level).max(1);
        let band_start = node.level.saturating_sub(1) as f64 * band;
        place(node, axis, positions[ordinal], sizes[ordinal], band_start, bands as f64 * band);
    }

    // Reverse pre-order visits descendants before their ancestors
    for &idx in visible.iter().rev() {
        let node = hierarchy.node(idx);
        if node.has_geometry() {
            continue;
        }
        let mut start = f64::INFINITY;
        let mut extent = 0.0;
        for &child in &node.children {
            let child = hierarchy.node(child);
            if !child.has_geometry() {
                continue;
            }
            let (child_start, child_size) = match axis {
                Axis::Row => (child.y, child.height),
                Axis::Column => (child.x, child.width),
            };
            start = start.min(child_start);
            extent += child_size;
        }
        if start.is_finite() {
            let band_start = node.level.saturating_sub(1) as f64 * band;
            place(hierarchy.node_mut(idx), axis, start, extent, band_start, band);
        }
    }

    AxisLayout {
        axis,
        leaves,
        positions,
        frozen_count,
    }
}

fn place(node: &mut Node, axis: Axis, main_start: f64, main_size: f64, cross_start: f64, cross_size: f64) {
    match axis {
        Axis::Row => {
            node.x = cross_start;
            node.width = cross_size;
            node.y = main_start;
            node.height = main_size;
        }
        Axis::Column => {
            node.x = main_start;
            node.width = main_size;
            node.y = cross_start;
            node.height = cross_size;
        }
    }
}
