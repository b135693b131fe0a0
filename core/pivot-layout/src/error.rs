//! FILENAME: core/pivot-layout/src/error.rs

use dataset::DatasetError;
use thiserror::Error;

use crate::node::Axis;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Unknown {axis} field: {field}")]
    UnknownField { axis: Axis, field: String },

    #[error("Unknown measure: {0}")]
    UnknownMeasure(String),

    #[error("Field '{0}' is used more than once across rows and columns")]
    DuplicateField(String),

    #[error("The measure level may appear in only one field list, once")]
    DuplicateMeasureLevel,

    #[error("Invalid option '{name}': {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("Invalid pagination: current={current}, page_size={page_size}")]
    InvalidPagination { current: usize, page_size: usize },

    #[error("Custom sort on '{0}' needs a sort_by list")]
    MissingCustomOrder(String),

    #[error("Node not found: {0}")]
    UnknownNode(String),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
