//! FILENAME: core/dataset/src/lib.rs
//! In-memory dataset shared by the pivot layout subsystem.
//!
//! Layers:
//! - `value`: Field values (hashable, totally ordered)
//! - `store`: Interned fields and records
//! - `aggregate`: Measure aggregation functions
//! - `query`: Aggregated lookups by grouping path

pub mod aggregate;
pub mod error;
pub mod query;
pub mod store;
pub mod value;

pub use aggregate::{Accumulator, AggregationType};
pub use error::DatasetError;
pub use query::{Condition, MeasureQuery};
pub use store::{Dataset, FieldIndex, FieldStore, Record, ValueId, VALUE_ID_EMPTY};
pub use value::{FieldValue, OrderedFloat};
