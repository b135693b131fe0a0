//! FILENAME: core/pivot-layout/src/engine.rs
//! Pivot layout engine - owns the state and sequences the pipeline.
//!
//! dataset + fields -> builder -> sort -> collapse -> layout -> viewport
//!
//! Every mutation runs to completion before returning. Rebuilds construct
//! the new hierarchies into locals first, so a failed rebuild leaves the
//! previous state untouched.

use dataset::Dataset;

use crate::builder::build_hierarchies;
use crate::collapse::CollapseState;
use crate::definition::{
    DataConfig, HierarchyType, Pagination, SheetMode, SheetOptions, SizingKind, SortMethod,
    SortParam,
};
use crate::error::LayoutError;
use crate::events::{EventListener, EventRegistry, LayoutEvent, LayoutEventKind, SubscriptionId};
use crate::hierarchy::Hierarchy;
use crate::layout::{layout, LayoutResult};
use crate::node::{Node, EXTRA_FIELD, SERIES_NUMBER_FIELD};
use crate::sort::{apply_sort, apply_table_sort, effective_params};
use crate::viewport::{ScrollOffset, ViewportController, ViewportSlice};
use crate::{log_debug, log_warn};

pub struct PivotLayoutEngine {
    dataset: Dataset,
    config: DataConfig,
    options: SheetOptions,
    rows: Hierarchy,
    columns: Hierarchy,
    collapse: CollapseState,
    layout: LayoutResult,
    viewport: ViewportController,
    events: EventRegistry,
}

impl PivotLayoutEngine {
    pub fn new(dataset: Dataset, config: DataConfig, options: SheetOptions) -> Result<Self, LayoutError> {
        options.validate()?;
        let (rows, columns) = prepare(&dataset, &config, options.mode)?;
        let mut engine = PivotLayoutEngine {
            collapse: CollapseState::from_options(&options),
            viewport: ViewportController::new(options.width, options.height, options.pagination),
            layout: LayoutResult::empty(),
            events: EventRegistry::new(),
            dataset,
            config,
            options,
            rows,
            columns,
        };
        engine.sync_collapse_flags();
        engine.relayout();
        Ok(engine)
    }

    // ========================================================================
    // STRUCTURE
    // ========================================================================

    /// Rebuilds both hierarchies from the current dataset and configuration.
    pub fn render(&mut self) -> Result<(), LayoutError> {
        let (rows, columns) = prepare(&self.dataset, &self.config, self.options.mode)?;
        self.install(rows, columns);
        Ok(())
    }

    pub fn set_data_config(&mut self, config: DataConfig) -> Result<(), LayoutError> {
        let (rows, columns) = prepare(&self.dataset, &config, self.options.mode)?;
        self.config = config;
        self.install(rows, columns);
        Ok(())
    }

    pub fn set_dataset(&mut self, dataset: Dataset) -> Result<(), LayoutError> {
        let (rows, columns) = prepare(&dataset, &self.config, self.options.mode)?;
        self.dataset = dataset;
        self.install(rows, columns);
        Ok(())
    }

    /// Replaces all sheet options. Collapse state is reset from the new
    /// options; a mode change rebuilds the hierarchies.
    pub fn set_options(&mut self, options: SheetOptions) -> Result<(), LayoutError> {
        options.validate()?;
        let rebuilt = if options.mode != self.options.mode {
            Some(prepare(&self.dataset, &self.config, options.mode)?)
        } else {
            None
        };
        let pagination_changed = options.pagination != self.options.pagination;
        let mut viewport = self.viewport.clone();
        viewport.resize(options.width, options.height);
        if pagination_changed {
            viewport.set_pagination(options.pagination)?;
        }

        self.viewport = viewport;
        self.collapse = CollapseState::from_options(&options);
        self.options = options;
        match rebuilt {
            Some((rows, columns)) => self.install(rows, columns),
            None => {
                self.sync_collapse_flags();
                self.relayout();
            }
        }
        if pagination_changed {
            self.emit_pagination_changed();
        }
        Ok(())
    }

    fn install(&mut self, rows: Hierarchy, columns: Hierarchy) {
        self.rows = rows;
        self.columns = columns;
        self.sync_collapse_flags();
        self.events.emit(&LayoutEvent::HierarchyRebuilt {
            rows: &self.rows,
            columns: &self.columns,
        });
        self.relayout();
    }

    fn relayout(&mut self) {
        self.events.emit(&LayoutEvent::BeforeLayout {
            rows: &self.rows,
            columns: &self.columns,
        });

        let collapse = if self.options.is_tree() {
            Some(&self.collapse)
        } else {
            None
        };
        self.layout = layout(&mut self.rows, &mut self.columns, collapse, &self.options);

        if self.viewport.clamp(&self.layout) {
            log_debug!(
                "VIEWPORT",
                "scroll clamped to ({}, {})",
                self.viewport.scroll().x,
                self.viewport.scroll().y
            );
            self.emit_scroll_changed();
        }

        self.events.emit(&LayoutEvent::AfterLayout {
            rows: &self.rows,
            columns: &self.columns,
            layout: &self.layout,
        });
    }

    // ========================================================================
    // SORTING
    // ========================================================================

    /// Replaces the sort parameters and re-sorts both hierarchies from their
    /// build order.
    pub fn set_sort_params(&mut self, params: Vec<SortParam>) -> Result<(), LayoutError> {
        for param in &params {
            param.validate()?;
        }
        self.config.sort_params = params;
        sort_both(
            &mut self.rows,
            &mut self.columns,
            &self.config.sort_params,
            &self.dataset,
            self.options.mode,
        );
        self.sync_collapse_flags();
        self.relayout();

        self.events.emit(&LayoutEvent::SortChanged {
            rows: &self.rows,
            columns: &self.columns,
            sort_params: &self.config.sort_params,
        });
        Ok(())
    }

    /// Sorts the innermost row dimension by the measure under a column
    /// node. Replaces any earlier param for that dimension and returns the
    /// param that was applied.
    pub fn group_sort_by_method(
        &mut self,
        method: SortMethod,
        column_node_id: &str,
    ) -> Result<SortParam, LayoutError> {
        let node = self
            .columns
            .get(column_node_id)
            .ok_or_else(|| LayoutError::UnknownNode(column_node_id.to_string()))?;
        let field = self
            .rows
            .level_keys()
            .iter()
            .rev()
            .find(|key| key.as_str() != EXTRA_FIELD && key.as_str() != SERIES_NUMBER_FIELD)
            .cloned()
            .ok_or_else(|| LayoutError::InvalidOption {
                name: "groupSort",
                reason: "no row dimension to sort".to_string(),
            })?;

        let param = SortParam {
            sort_field_id: field,
            sort_method: method,
            sort_by: None,
            sort_by_measure: Some(node.measure.clone().unwrap_or_else(|| node.value.to_string())),
            query: Some(node.query.to_vec()),
        };
        param.validate()?;

        let mut params = self.config.sort_params.clone();
        params.retain(|p| p.sort_field_id != param.sort_field_id);
        params.push(param.clone());
        self.set_sort_params(params)?;
        Ok(param)
    }

    // ========================================================================
    // COLLAPSE
    // ========================================================================

    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) {
        self.collapse.set_collapsed(id, collapsed);
        self.after_collapse_change();
    }

    /// Flips one row node and returns its new state.
    pub fn toggle_collapsed(&mut self, id: &str) -> bool {
        let collapsed = self.collapse.toggle(&self.rows, id);
        self.after_collapse_change();
        collapsed
    }

    /// Clears every per-node entry and sets the default for all nodes.
    pub fn collapse_all(&mut self, collapsed: bool) {
        self.collapse.collapse_all(collapsed);
        self.after_collapse_change();
    }

    pub fn set_expand_depth(&mut self, depth: Option<usize>) {
        self.collapse.set_expand_depth(depth);
        self.after_collapse_change();
    }

    fn after_collapse_change(&mut self) {
        self.options.collapsed_rows = self.collapse.collapsed_rows().clone();
        self.options.hierarchy_collapse = self.collapse.hierarchy_collapse();
        self.options.expand_depth = self.collapse.expand_depth();
        self.sync_collapse_flags();
        if self.options.is_tree() {
            self.relayout();
        }

        self.events.emit(&LayoutEvent::CollapseChanged {
            rows: &self.rows,
            collapsed_rows: self.collapse.collapsed_rows(),
            hierarchy_collapse: self.collapse.hierarchy_collapse(),
        });
    }

    fn sync_collapse_flags(&mut self) {
        if self.options.is_tree() {
            self.collapse.apply_to(&mut self.rows);
        } else {
            self.rows.reset_collapsed();
        }
    }

    /// Whether a row node is shown. Outside tree mode every node is.
    pub fn is_row_visible(&self, id: &str) -> Option<bool> {
        let idx = self.rows.index_of(id)?;
        Some(!self.options.is_tree() || self.collapse.is_visible(&self.rows, idx))
    }

    /// The node itself if visible, else its outermost collapsed ancestor.
    pub fn nearest_visible_row(&self, id: &str) -> Option<&Node> {
        let idx = self.rows.index_of(id)?;
        if !self.options.is_tree() {
            return Some(self.rows.node(idx));
        }
        Some(self.rows.node(self.collapse.nearest_visible_ancestor(&self.rows, idx)))
    }

    // ========================================================================
    // VIEWPORT
    // ========================================================================

    /// Changes the page and resets scroll to the origin.
    pub fn set_pagination(&mut self, pagination: Option<Pagination>) -> Result<(), LayoutError> {
        self.viewport.set_pagination(pagination)?;
        self.options.pagination = pagination;
        log_debug!("VIEWPORT", "pagination {:?}, scroll reset", pagination);
        self.emit_pagination_changed();
        Ok(())
    }

    /// Returns true when the offsets changed.
    pub fn scroll_to(&mut self, x: f64, y: f64) -> bool {
        let changed = self.viewport.scroll_to(&self.layout, x, y);
        if changed {
            self.emit_scroll_changed();
        }
        changed
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) -> bool {
        let changed = self.viewport.scroll_by(&self.layout, dx, dy);
        if changed {
            self.emit_scroll_changed();
        }
        changed
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), LayoutError> {
        let mut options = self.options.clone();
        options.width = width;
        options.height = height;
        options.validate()?;

        self.options = options;
        self.viewport.resize(width, height);
        log_debug!("VIEWPORT", "resized to {}x{}", width, height);
        self.relayout();
        Ok(())
    }

    /// What must be rendered at the current scroll position and page.
    pub fn visible(&self) -> ViewportSlice {
        self.viewport.visible(&self.layout, &self.rows, &self.columns)
    }

    pub fn page_count(&self) -> usize {
        self.viewport.page_count(self.layout.rows.len())
    }

    fn emit_scroll_changed(&mut self) {
        self.events.emit(&LayoutEvent::ScrollChanged {
            rows: &self.rows,
            columns: &self.columns,
            scroll: self.viewport.scroll(),
        });
    }

    fn emit_pagination_changed(&mut self) {
        let page_count = self.page_count();
        self.events.emit(&LayoutEvent::PaginationChanged {
            rows: &self.rows,
            pagination: self.viewport.pagination(),
            page_count,
        });
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    pub fn subscribe(&mut self, listener: EventListener) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn subscribe_to(&mut self, kind: LayoutEventKind, listener: EventListener) -> SubscriptionId {
        self.events.subscribe_to(kind, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn data_config(&self) -> &DataConfig {
        &self.config
    }

    pub fn options(&self) -> &SheetOptions {
        &self.options
    }

    pub fn rows(&self) -> &Hierarchy {
        &self.rows
    }

    pub fn columns(&self) -> &Hierarchy {
        &self.columns
    }

    pub fn collapse_state(&self) -> &CollapseState {
        &self.collapse
    }

    pub fn layout(&self) -> &LayoutResult {
        &self.layout
    }

    pub fn scroll(&self) -> ScrollOffset {
        self.viewport.scroll()
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.viewport.pagination()
    }

    pub fn content_width(&self) -> f64 {
        self.layout.content_width
    }

    pub fn content_height(&self) -> f64 {
        self.layout.content_height
    }

    /// Row nodes in display order, optionally restricted to one level.
    pub fn row_nodes(&self, level: Option<usize>) -> Vec<&Node> {
        nodes_of(&self.rows, level)
    }

    pub fn column_nodes(&self, level: Option<usize>) -> Vec<&Node> {
        nodes_of(&self.columns, level)
    }

    /// Row leaves shown (visible leaves plus collapsed tree nodes).
    pub fn visible_row_count(&self) -> usize {
        if self.options.is_tree() {
            self.collapse.visible_leaf_count(&self.rows)
        } else {
            self.rows.leaf_count()
        }
    }

    pub fn is_pivot_mode(&self) -> bool {
        self.options.mode == SheetMode::Pivot
    }

    pub fn is_table_mode(&self) -> bool {
        self.options.mode == SheetMode::Table
    }

    pub fn is_hierarchy_tree_type(&self) -> bool {
        self.options.hierarchy_type == HierarchyType::Tree
    }

    pub fn is_frozen_row_header(&self) -> bool {
        self.options.frozen.row_header
    }

    /// Horizontal scrolling moves the row header along with the cells.
    pub fn is_scroll_contains_row_header(&self) -> bool {
        !self.is_frozen_row_header()
    }

    pub fn is_value_in_cols(&self) -> bool {
        self.config.fields.value_in_cols
    }

    /// Column sizing policy.
    pub fn layout_sizing_type(&self) -> SizingKind {
        self.options.col_sizing.kind()
    }
}

impl std::fmt::Debug for PivotLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PivotLayoutEngine")
            .field("mode", &self.options.mode)
            .field("rows", &self.rows.leaf_count())
            .field("columns", &self.columns.leaf_count())
            .field("scroll", &self.viewport.scroll())
            .finish()
    }
}

// ============================================================================
// PIPELINE HELPERS
// ============================================================================

/// Builds and sorts both hierarchies without touching engine state.
fn prepare(
    dataset: &Dataset,
    config: &DataConfig,
    mode: SheetMode,
) -> Result<(Hierarchy, Hierarchy), LayoutError> {
    let (mut rows, mut columns) = build_hierarchies(dataset, config, mode)?;
    sort_both(&mut rows, &mut columns, &config.sort_params, dataset, mode);
    Ok((rows, columns))
}

/// Table mode sorts record rows by field value; its column level lists the
/// fields themselves and keeps the configured order.
fn sort_both(
    rows: &mut Hierarchy,
    columns: &mut Hierarchy,
    params: &[SortParam],
    dataset: &Dataset,
    mode: SheetMode,
) {
    let applied = match mode {
        SheetMode::Pivot => {
            let mut applied = apply_sort(rows, params, dataset);
            applied.extend(apply_sort(columns, params, dataset));
            applied
        }
        SheetMode::Table => apply_table_sort(rows, params, dataset),
    };
    for param in effective_params(params) {
        if !applied.contains(&param.sort_field_id) {
            log_warn!("SORT", "no level for '{}' on either axis, ignored", param.sort_field_id);
        }
    }
}

fn nodes_of(hierarchy: &Hierarchy, level: Option<usize>) -> Vec<&Node> {
    let indices = match level {
        Some(level) => hierarchy.nodes_at_level(level),
        None => hierarchy.dfs(),
    };
    indices.into_iter().map(|idx| hierarchy.node(idx)).collect()
}
