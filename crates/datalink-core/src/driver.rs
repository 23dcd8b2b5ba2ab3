// Pipeline driver: sequences the staged export for one job. The stages
// themselves are pure; the driver owns collaborator I/O, state reporting,
// and the test-mode short circuit.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, error, info};

use crate::error::PipelineError;
use crate::filter::{filter_records, Predicate};
use crate::job::JobSpec;
use crate::normalize::normalize;
use crate::project::project;
use crate::record::Record;
use crate::window::{resolve_window, DateKey};

/// Producer of raw input records for one run.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn scan(&self) -> anyhow::Result<Vec<Record>>;
}

/// Consumer of the remapped output, partitioned by the given keys.
#[async_trait]
pub trait PartitionSink: Send + Sync {
    async fn write(
        &self,
        records: &[Record],
        partition_keys: &[String],
    ) -> anyhow::Result<SinkReport>;
}

/// What a sink did with one batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkReport {
    pub partitions: usize,
    pub rows: usize,
    pub bytes_written: u64,
}

/// Whether a run emits output or stops after the transform stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Load,
    Test,
}

impl RunMode {
    /// The literal flag value "test" selects a dry run; anything else,
    /// including no flag at all, loads.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("test") => Self::Test,
            _ => Self::Load,
        }
    }

    pub fn is_test(self) -> bool {
        matches!(self, Self::Test)
    }
}

/// Stages a run passes through, in order. Terminal states are `Emitted`,
/// `Skipped`, and `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Configured,
    WindowResolved,
    Normalized,
    Filtered,
    Remapped,
    Emitted,
    Skipped,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configured => "configured",
            Self::WindowResolved => "window_resolved",
            Self::Normalized => "normalized",
            Self::Filtered => "filtered",
            Self::Remapped => "remapped",
            Self::Emitted => "emitted",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one run needs: the spec, both collaborators, and the clock.
pub struct JobContext<'a> {
    pub spec: &'a JobSpec,
    pub source: &'a dyn RecordSource,
    pub sink: &'a dyn PartitionSink,
    /// Wall clock the window is derived from.
    pub now: DateTime<Utc>,
    /// Business timezone the lag is applied in.
    pub timezone: FixedOffset,
    /// Re-run escape hatch: process this window instead of deriving one.
    pub window_override: Option<DateKey>,
}

/// Outcome summary of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub job: String,
    pub window: DateKey,
    pub state: JobState,
    pub rows_scanned: usize,
    pub rows_emitted: usize,
    pub partitions_written: usize,
    pub bytes_written: u64,
}

/// Run one job end to end. Any stage error aborts the run; nothing is
/// retried and no partial output is rolled back beyond what the sink's
/// own overwrite semantics provide.
pub async fn run_job(ctx: &JobContext<'_>, mode: RunMode) -> Result<RunReport, PipelineError> {
    match drive(ctx, mode).await {
        Ok(report) => Ok(report),
        Err(e) => {
            error!(
                job = %ctx.spec.name,
                state = %JobState::Failed,
                error = %e,
                "pipeline run failed"
            );
            Err(e)
        }
    }
}

async fn drive(ctx: &JobContext<'_>, mode: RunMode) -> Result<RunReport, PipelineError> {
    let spec = ctx.spec;
    spec.validate()?;
    debug!(job = %spec.name, state = %JobState::Configured, "spec validated");

    let window = match &ctx.window_override {
        Some(window) => window.clone(),
        None => resolve_window(ctx.now, ctx.timezone, spec.lag_days),
    };
    debug!(
        job = %spec.name,
        state = %JobState::WindowResolved,
        window = %window,
        "target window resolved"
    );

    let scanned = ctx.source.scan().await.map_err(PipelineError::Source)?;
    let rows_scanned = scanned.len();

    let required = spec.required_schema();
    let normalized: Vec<Record> = normalize(scanned, &required).collect();
    debug!(
        job = %spec.name,
        state = %JobState::Normalized,
        rows = normalized.len(),
        "schema normalized"
    );

    let predicate = Predicate::new(&spec.window_field, window.clone(), &spec.filter);
    let kept: Vec<Record> = filter_records(normalized, &predicate).collect::<Result<_, _>>()?;
    debug!(
        job = %spec.name,
        state = %JobState::Filtered,
        rows = kept.len(),
        "rows filtered"
    );

    let rows: Vec<Record> = project(kept, &spec.columns, &spec.recode).collect::<Result<_, _>>()?;
    debug!(
        job = %spec.name,
        state = %JobState::Remapped,
        rows = rows.len(),
        "fields remapped"
    );

    if mode.is_test() {
        info!(
            job = %spec.name,
            state = %JobState::Skipped,
            window = %window,
            rows = rows.len(),
            "test mode, emission skipped"
        );
        return Ok(RunReport {
            job: spec.name.clone(),
            window,
            state: JobState::Skipped,
            rows_scanned,
            rows_emitted: rows.len(),
            partitions_written: 0,
            bytes_written: 0,
        });
    }

    let sink_report = ctx
        .sink
        .write(&rows, &spec.partition_keys)
        .await
        .map_err(PipelineError::Sink)?;
    info!(
        job = %spec.name,
        state = %JobState::Emitted,
        window = %window,
        rows = sink_report.rows,
        partitions = sink_report.partitions,
        bytes = sink_report.bytes_written,
        "partitions emitted"
    );

    Ok(RunReport {
        job: spec.name.clone(),
        window,
        state: JobState::Emitted,
        rows_scanned,
        rows_emitted: sink_report.rows,
        partitions_written: sink_report.partitions,
        bytes_written: sink_report.bytes_written,
    })
}
