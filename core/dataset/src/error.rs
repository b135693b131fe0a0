//! FILENAME: core/dataset/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dataset JSON must be an array of row objects")]
    NotAnArray,

    #[error("Row {0} is not a JSON object")]
    RowNotObject(usize),
}
