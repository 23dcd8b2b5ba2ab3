// datalink-core - Pure pipeline logic for partitioned event-log exports.
//
// This crate contains the processing stages that turn one day of raw event
// records into a finalized, partition-ready record stream: window
// resolution, schema normalization, row filtering, and field remapping,
// composed by a single driver parameterized by job data instead of per-job
// code. No I/O lives here; reading tables and writing partitions happen
// behind the RecordSource and PartitionSink traits.

pub mod driver;
pub mod error;
pub mod filter;
pub mod job;
pub mod normalize;
pub mod project;
pub mod record;
pub mod window;

pub use driver::{
    run_job, JobContext, JobState, PartitionSink, RecordSource, RunMode, RunReport, SinkReport,
};
pub use error::PipelineError;
pub use filter::{filter_records, Predicate};
pub use job::{ColumnSpec, FilterSpec, JobSpec, RecodeRule, RequiredSchema};
pub use normalize::{normalize, normalize_record};
pub use project::{project, project_record};
pub use record::{Record, Value};
pub use window::{resolve_window, DateKey};
