// datalink - Daily batch export of raw event tables to partitioned Parquet
//
// This crate only wires the pieces together: configuration selects a job,
// the store crate provides the source and sink, and the core driver runs
// the staged pipeline.

mod init;

pub use init::init_tracing;

use anyhow::Result;
use chrono::Utc;

use datalink_config::RuntimeConfig;
use datalink_core::{run_job, DateKey, JobContext, RunMode, RunReport};
use datalink_store::{build_operator, Compression, JsonlTableSource, ParquetPartitionWriter};

/// Run one configured job end to end.
///
/// `window_override` replaces the clock-derived window; it is the re-run
/// path for recovering a missed or bad day.
pub async fn run(
    config: &RuntimeConfig,
    job_name: &str,
    mode: RunMode,
    window_override: Option<DateKey>,
) -> Result<RunReport> {
    let job = config.job(job_name)?;
    let spec = job.to_spec(job_name);

    let operator = build_operator(&config.storage)?;
    let table = config.table_path(&job.source_table)?;
    let source = JsonlTableSource::new(operator.clone(), table);
    let compression: Compression = job.compression.parse()?;
    let sink = ParquetPartitionWriter::new(operator, job.sink_path.as_str(), compression);

    let ctx = JobContext {
        spec: &spec,
        source: &source,
        sink: &sink,
        now: Utc::now(),
        timezone: config.time.offset()?,
        window_override,
    };

    Ok(run_job(&ctx, mode).await?)
}
