// Storage-layer errors. Everything here is fatal for the run; the driver
// does not retry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage configuration: {0}")]
    InvalidConfig(String),

    #[error("storage operation failed: {0}")]
    Storage(#[from] opendal::Error),

    #[error("failed to decode {path}: {detail}")]
    Decode { path: String, detail: String },

    #[error("unsupported value in {path}, field '{field}': {detail}")]
    UnsupportedValue {
        path: String,
        field: String,
        detail: String,
    },

    #[error("column '{column}' mixes {found} values with {expected}")]
    ColumnType {
        column: String,
        expected: String,
        found: String,
    },

    #[error("partition key '{field}' {detail}")]
    PartitionKey { field: String, detail: String },

    #[error("arrow conversion failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet encoding failed: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
