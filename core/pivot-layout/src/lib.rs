//! FILENAME: core/pivot-layout/src/lib.rs
//! Layout & hierarchy subsystem for pivot grids.
//!
//! Converts a flat dataset plus a row/column field layout into two
//! header trees, sorts and folds them, assigns pixel geometry and exposes a
//! virtualization-friendly view for scrolling and pagination.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the sheet IS)
//! - `builder` / `hierarchy` / `node`: Header trees (WHAT we group)
//! - `sort` / `collapse`: User ordering and folding state
//! - `layout` / `viewport`: Geometry and the rendered slice (WHAT we display)
//! - `engine`: Sequences the pipeline and emits `events`

pub mod logging;

pub mod builder;
pub mod collapse;
pub mod definition;
pub mod engine;
pub mod error;
pub mod events;
pub mod hierarchy;
pub mod layout;
pub mod node;
pub mod sort;
pub mod viewport;

pub use builder::{build_hierarchies, resolve_levels, Level};
pub use collapse::CollapseState;
pub use definition::*;
pub use engine::PivotLayoutEngine;
pub use error::LayoutError;
pub use events::{EventListener, EventRegistry, LayoutEvent, LayoutEventKind, SubscriptionId};
pub use hierarchy::Hierarchy;
pub use layout::{layout, leaf_sizes, AxisLayout, LayoutResult, ScreenTransform};
pub use node::{
    Axis, Node, NodeIdx, NodeQuery, EXTRA_FIELD, ID_SEPARATOR, ROOT_ID, ROOT_IDX,
    SERIES_NUMBER_FIELD,
};
pub use sort::{apply_sort, apply_table_sort, effective_params};
pub use viewport::{ScrollOffset, ViewportController, ViewportSlice};
