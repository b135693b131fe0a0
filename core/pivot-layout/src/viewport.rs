//! FILENAME: core/pivot-layout/src/viewport.rs
//! Viewport/Pagination Controller - which leaves to materialize.
//!
//! Scroll offsets are relative to the scrollable region: (0, 0) shows the
//! first non-frozen row and column right after the frozen bands. Pagination
//! slices the effective row leaves; row coordinates are then relative to
//! the start of the current page.

use std::ops::Range;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::definition::Pagination;
use crate::error::LayoutError;
use crate::hierarchy::Hierarchy;
use crate::layout::{LayoutResult, ScreenTransform};
use crate::node::NodeIdx;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

impl ScrollOffset {
    pub fn new(x: f64, y: f64) -> Self {
        ScrollOffset { x, y }
    }
}

/// Output of a viewport query: what must be rendered right now.
#[derive(Debug, Clone)]
pub struct ViewportSlice {
    /// Row leaf ordinals of the current page.
    pub page: Range<usize>,
    /// Pinned row ordinals (always at the top of the page).
    pub frozen_rows: Range<usize>,
    /// Scrolled row ordinals in view.
    pub rows: Range<usize>,
    pub frozen_cols: Range<usize>,
    pub cols: Range<usize>,
    /// Row leaves to render, frozen first.
    pub row_leaves: Vec<NodeIdx>,
    pub col_leaves: Vec<NodeIdx>,
    /// Non-leaf row headers spanning the rendered leaves, outermost first.
    pub row_headers: Vec<NodeIdx>,
    pub col_headers: Vec<NodeIdx>,
    pub transform: ScreenTransform,
}

impl ViewportSlice {
    /// No data cell is in view.
    pub fn is_empty(&self) -> bool {
        self.row_leaves.is_empty() || self.col_leaves.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    width: f64,
    height: f64,
    scroll: ScrollOffset,
    pagination: Option<Pagination>,
}

impl ViewportController {
    pub fn new(width: f64, height: f64, pagination: Option<Pagination>) -> Self {
        ViewportController {
            width,
            height,
            scroll: ScrollOffset::default(),
            pagination,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn scroll(&self) -> ScrollOffset {
        self.scroll
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    // ========================================================================
    // PAGINATION
    // ========================================================================

    /// Replaces the page settings and resets scroll to the origin.
    pub fn set_pagination(&mut self, pagination: Option<Pagination>) -> Result<(), LayoutError> {
        if let Some(p) = &pagination {
            p.validate()?;
        }
        self.pagination = pagination;
        self.scroll = ScrollOffset::default();
        Ok(())
    }

    /// Ordinals of the row leaves on the current page. A page past the end
    /// is empty.
    pub fn page_range(&self, row_count: usize) -> Range<usize> {
        match self.pagination {
            None => 0..row_count,
            Some(p) => {
                let start = (p.current - 1).saturating_mul(p.page_size).min(row_count);
                let end = start.saturating_add(p.page_size).min(row_count);
                start..end
            }
        }
    }

    /// Number of pages (1 without pagination).
    pub fn page_count(&self, row_count: usize) -> usize {
        match self.pagination {
            None => 1,
            Some(p) => row_count.div_ceil(p.page_size),
        }
    }

    // ========================================================================
    // SCROLLING
    // ========================================================================

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Largest scroll offsets that still keep the viewport filled.
    pub fn max_scroll(&self, layout: &LayoutResult) -> ScrollOffset {
        let page = self.page_range(layout.rows.len());
        let page_extent = layout.rows.span(&page);
        let view_height = self.height - layout.col_header_height;
        ScrollOffset {
            x: (layout.row_header_width + layout.content_width - self.width).max(0.0),
            y: (page_extent - view_height).max(0.0),
        }
    }

    /// Clamps the scroll offsets into range. Returns true if they changed.
    pub fn clamp(&mut self, layout: &LayoutResult) -> bool {
        let max = self.max_scroll(layout);
        let clamped = ScrollOffset {
            x: clamp_axis(self.scroll.x, max.x),
            y: clamp_axis(self.scroll.y, max.y),
        };
        let changed = clamped != self.scroll;
        self.scroll = clamped;
        changed
    }

    /// Sets absolute offsets (clamped). Returns true if they changed.
    pub fn scroll_to(&mut self, layout: &LayoutResult, x: f64, y: f64) -> bool {
        let before = self.scroll;
        self.scroll = ScrollOffset::new(x, y);
        self.clamp(layout);
        self.scroll != before
    }

    pub fn scroll_by(&mut self, layout: &LayoutResult, dx: f64, dy: f64) -> bool {
        let target = (self.scroll.x + dx, self.scroll.y + dy);
        self.scroll_to(layout, target.0, target.1)
    }

    // ========================================================================
    // QUERY
    // ========================================================================

    /// Leaves and headers intersecting the viewport at the current scroll.
    pub fn visible(&self, layout: &LayoutResult, rows: &Hierarchy, columns: &Hierarchy) -> ViewportSlice {
        let page = self.page_range(layout.rows.len());
        let transform = layout.screen_transform(self.scroll, &page);

        // Rows: the window is measured from the start of the page
        let view_height = (self.height - layout.col_header_height).max(0.0);
        let pinned_rows = layout.frozen_row_range(&page);
        let origin = layout.rows.positions.get(page.start).copied().unwrap_or(0.0);
        let frozen_height = layout.rows.span(&pinned_rows);
        let frozen_rows = fitting(
            layout.rows.leaves_intersecting(origin, origin + view_height),
            &pinned_rows,
        );
        let scrolled_rows = fitting(
            layout.rows.leaves_intersecting(
                origin + frozen_height + self.scroll.y,
                origin + view_height + self.scroll.y,
            ),
            &(pinned_rows.end..page.end),
        );

        // Columns: an unfrozen row header scrolls away ahead of the columns
        let view_width = self.width - layout.row_header_width;
        let pinned_cols = layout.frozen_col_range();
        let frozen_width = layout.columns.span(&pinned_cols);
        let lead = if layout.frozen_row_header {
            0.0
        } else {
            layout.row_header_width
        };
        let frozen_cols = fitting(layout.columns.leaves_intersecting(0.0, view_width), &pinned_cols);
        let scrolled_cols = fitting(
            layout.columns.leaves_intersecting(
                frozen_width + self.scroll.x - lead,
                view_width + self.scroll.x,
            ),
            &(pinned_cols.end..layout.columns.len()),
        );

        let row_leaves: Vec<NodeIdx> = frozen_rows
            .clone()
            .chain(scrolled_rows.clone())
            .map(|i| layout.rows.leaves[i])
            .collect();
        let col_leaves: Vec<NodeIdx> = frozen_cols
            .clone()
            .chain(scrolled_cols.clone())
            .map(|i| layout.columns.leaves[i])
            .collect();

        ViewportSlice {
            row_headers: spanning_headers(rows, &row_leaves),
            col_headers: spanning_headers(columns, &col_leaves),
            page,
            frozen_rows,
            rows: scrolled_rows,
            frozen_cols,
            cols: scrolled_cols,
            row_leaves,
            col_leaves,
            transform,
        }
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

/// Intersection of two ordinal ranges.
fn fitting(found: Range<usize>, allowed: &Range<usize>) -> Range<usize> {
    let start = found.start.max(allowed.start);
    let end = found.end.min(allowed.end);
    start..end.max(start)
}

/// Ancestors of `leaves` (root excluded), each once, outermost first.
fn spanning_headers(hierarchy: &Hierarchy, leaves: &[NodeIdx]) -> Vec<NodeIdx> {
    let mut seen: FxHashSet<NodeIdx> = FxHashSet::default();
    let mut headers = Vec::new();
    for &leaf in leaves {
        let mut path: Vec<NodeIdx> = hierarchy.ancestors(leaf).collect();
        path.reverse();
        for idx in path {
            if seen.insert(idx) {
                headers.push(idx);
            }
        }
    }
    headers
}
