// Pipeline error taxonomy.
//
// Every error here is fatal for the run: the driver performs no retries,
// and recovery means the calling scheduler re-runs the whole partition.

use thiserror::Error;

/// Errors raised by the pipeline stages and driver.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or inconsistent invocation parameter; raised before any
    /// stage runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A field the projection needs cannot be produced from the record.
    #[error("schema error on field '{field}': {detail}")]
    Schema { field: String, detail: String },

    /// A predicate clause met a value type it cannot compare.
    #[error("predicate evaluation failed on field '{field}': {detail}")]
    Predicate { field: String, detail: String },

    /// The source collaborator failed while materializing the table.
    #[error("source collaborator failed: {0}")]
    Source(#[source] anyhow::Error),

    /// The sink collaborator failed while publishing partitions.
    #[error("sink collaborator failed: {0}")]
    Sink(#[source] anyhow::Error),
}

impl PipelineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn schema(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub fn predicate(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Predicate {
            field: field.into(),
            detail: detail.into(),
        }
    }
}
