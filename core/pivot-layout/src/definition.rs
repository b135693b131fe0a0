//! FILENAME: core/pivot-layout/src/definition.rs
//! Layout Definition - The serializable configuration.
//!
//! This module contains the types that DESCRIBE a pivot sheet:
//! - `DataConfig`: which fields go where and how groups are sorted
//! - `SheetOptions`: mode, sizing, freezing, pagination and collapse state
//!
//! Both parse from camelCase JSON, fill unspecified options with defaults
//! and are checked eagerly by `validate()`.

use std::collections::BTreeMap;

use dataset::Condition;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::node::EXTRA_FIELD;

// ============================================================================
// FIELDS
// ============================================================================

/// Dimension and measure placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fields {
    /// Row dimensions, outermost first. May contain `$$extra$$` to place
    /// the measure level explicitly.
    pub rows: Vec<String>,
    /// Column dimensions, outermost first. In table mode, the displayed columns.
    pub columns: Vec<String>,
    /// Measures.
    pub values: Vec<String>,
    /// Measure level goes on the column axis when true.
    pub value_in_cols: bool,
}

impl Default for Fields {
    fn default() -> Self {
        Fields {
            rows: Vec::new(),
            columns: Vec::new(),
            values: Vec::new(),
            value_in_cols: true,
        }
    }
}

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMethod {
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
    #[serde(alias = "CUSTOM")]
    Custom,
}

/// Sort request for the sibling groups of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortParam {
    pub sort_field_id: String,
    pub sort_method: SortMethod,
    /// Explicit value order for `Custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<Vec<String>>,
    /// Sort by this measure's aggregate instead of the node value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by_measure: Option<String>,
    /// Extra conditions appended to each node's path for the measure lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Vec<Condition>>,
}

impl SortParam {
    pub fn new(field: impl Into<String>, method: SortMethod) -> Self {
        SortParam {
            sort_field_id: field.into(),
            sort_method: method,
            sort_by: None,
            sort_by_measure: None,
            query: None,
        }
    }

    pub fn custom<I, S>(field: impl Into<String>, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut param = SortParam::new(field, SortMethod::Custom);
        param.sort_by = Some(order.into_iter().map(Into::into).collect());
        param
    }

    pub fn by_measure(mut self, measure: impl Into<String>) -> Self {
        self.sort_by_measure = Some(measure.into());
        self
    }

    pub fn with_query(mut self, query: Vec<Condition>) -> Self {
        self.query = Some(query);
        self
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.sort_method == SortMethod::Custom && self.sort_by.is_none() {
            return Err(LayoutError::MissingCustomOrder(self.sort_field_id.clone()));
        }
        Ok(())
    }
}

// ============================================================================
// DATA CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataConfig {
    pub fields: Fields,
    pub sort_params: Vec<SortParam>,
}

impl DataConfig {
    pub fn new(rows: &[&str], columns: &[&str], values: &[&str]) -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        DataConfig {
            fields: Fields {
                rows: owned(rows),
                columns: owned(columns),
                values: owned(values),
                value_in_cols: true,
            },
            sort_params: Vec::new(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        let config: DataConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything that does not need the dataset schema.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let in_rows = self.fields.rows.iter().filter(|f| *f == EXTRA_FIELD).count();
        let in_cols = self.fields.columns.iter().filter(|f| *f == EXTRA_FIELD).count();
        if in_rows + in_cols > 1 {
            return Err(LayoutError::DuplicateMeasureLevel);
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for field in self.fields.rows.iter().chain(&self.fields.columns) {
            if field == EXTRA_FIELD {
                continue;
            }
            if !seen.insert(field.as_str()) {
                return Err(LayoutError::DuplicateField(field.clone()));
            }
        }

        let mut measures: FxHashSet<&str> = FxHashSet::default();
        for measure in &self.fields.values {
            if !measures.insert(measure.as_str()) {
                return Err(LayoutError::DuplicateField(measure.clone()));
            }
        }

        for param in &self.sort_params {
            param.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// SHEET OPTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetMode {
    #[default]
    Pivot,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyType {
    #[default]
    Grid,
    Tree,
}

/// Leaf sizing policy along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Sizing {
    /// Every leaf gets `size`.
    Fixed { size: f64 },
    /// Leaves share the available extent evenly, never below `min_size`.
    Adaptive {
        #[serde(rename = "minSize", default)]
        min_size: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingKind {
    Fixed,
    Adaptive,
}

impl Sizing {
    pub fn kind(&self) -> SizingKind {
        match self {
            Sizing::Fixed { .. } => SizingKind::Fixed,
            Sizing::Adaptive { .. } => SizingKind::Adaptive,
        }
    }

    fn validate(&self, name: &'static str) -> Result<(), LayoutError> {
        match *self {
            Sizing::Fixed { size } if !(size.is_finite() && size > 0.0) => {
                Err(LayoutError::InvalidOption {
                    name,
                    reason: format!("size {} must be finite and positive", size),
                })
            }
            Sizing::Adaptive { min_size } => non_negative(name, min_size),
            Sizing::Fixed { .. } => Ok(()),
        }
    }
}

/// Frozen header bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrozenOptions {
    /// Row header stays put during horizontal scroll.
    pub row_header: bool,
    /// Leading rows of each page exempt from vertical scroll.
    pub row_count: usize,
    /// Leading columns exempt from horizontal scroll.
    pub col_count: usize,
}

impl Default for FrozenOptions {
    fn default() -> Self {
        FrozenOptions {
            row_header: true,
            row_count: 0,
            col_count: 0,
        }
    }
}

/// Page of row leaves to show. `current` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn new(current: usize, page_size: usize) -> Self {
        Pagination { current, page_size }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.current == 0 || self.page_size == 0 {
            return Err(LayoutError::InvalidPagination {
                current: self.current,
                page_size: self.page_size,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SheetOptions {
    /// Sheet width in pixels, headers included.
    pub width: f64,
    /// Sheet height in pixels, headers included.
    pub height: f64,
    pub mode: SheetMode,
    pub hierarchy_type: HierarchyType,
    pub row_sizing: Sizing,
    pub col_sizing: Sizing,
    /// Width of one row header band (one per row level).
    pub row_header_level_width: f64,
    /// Height of one column header band (one per column level).
    pub col_header_level_height: f64,
    pub frozen: FrozenOptions,
    pub pagination: Option<Pagination>,
    /// Explicit per-node collapse state (tree mode).
    pub collapsed_rows: BTreeMap<String, bool>,
    /// Default collapse state for nodes without an explicit entry.
    pub hierarchy_collapse: bool,
    /// Nodes at or below this level start collapsed.
    pub expand_depth: Option<usize>,
}

impl Default for SheetOptions {
    fn default() -> Self {
        SheetOptions {
            width: 600.0,
            height: 480.0,
            mode: SheetMode::Pivot,
            hierarchy_type: HierarchyType::Grid,
            row_sizing: Sizing::Fixed { size: 30.0 },
            col_sizing: Sizing::Adaptive { min_size: 96.0 },
            row_header_level_width: 96.0,
            col_header_level_height: 30.0,
            frozen: FrozenOptions::default(),
            pagination: None,
            collapsed_rows: BTreeMap::new(),
            hierarchy_collapse: false,
            expand_depth: None,
        }
    }
}

impl SheetOptions {
    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        let options: SheetOptions = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        non_negative("width", self.width)?;
        non_negative("height", self.height)?;
        non_negative("rowHeaderLevelWidth", self.row_header_level_width)?;
        non_negative("colHeaderLevelHeight", self.col_header_level_height)?;
        self.row_sizing.validate("rowSizing")?;
        self.col_sizing.validate("colSizing")?;
        if let Some(pagination) = &self.pagination {
            pagination.validate()?;
        }
        Ok(())
    }

    pub fn is_tree(&self) -> bool {
        self.hierarchy_type == HierarchyType::Tree
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), LayoutError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidOption {
            name,
            reason: format!("{} must be a finite, non-negative number", value),
        })
    }
}
