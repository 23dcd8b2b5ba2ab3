// End-to-end runs against a filesystem-backed temp root: seed JSONL
// fixtures, load the config, run a job, read the emitted Parquet back.

use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, StringArray};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use datalink_config::RuntimeConfig;
use datalink_core::{DateKey, JobState, RunMode};

fn seed_events(root: &Path) {
    let lines = concat!(
        "{\"dt\":\"20240301\",\"request_id\":\"r-1\",\"api\":\"application\",\"message\":\"coupon_draw\",\"ua\":\"ios\"}\n",
        "{\"dt\":\"20240301\",\"request_id\":\"r-2\",\"api\":\"application\",\"message\":\"touch\"}\n",
        "{\"dt\":\"20240229\",\"request_id\":\"r-3\",\"api\":\"application\",\"message\":\"touch\"}\n",
    );
    let path = root.join("raw/apiserver/2024-03-01.jsonl");
    fs::create_dir_all(path.parent().expect("fixture path has no parent"))
        .expect("Failed to create fixture dir");
    fs::write(path, lines).expect("Failed to write fixture");
}

fn write_config(root: &Path) -> PathBuf {
    let content = format!(
        r#"
[storage]
backend = "fs"
fs = {{ path = "{root}" }}

[log]
level = "info"
format = "text"

[catalog.tables]
apiserver_logs = "raw/apiserver"

[jobs.apiserver]
source_table = "apiserver_logs"
sink_path = "link/apiserver_events"
columns = [
    "request_id",
    "ua",
    "dt",
    {{ source = "message", output = "ev" }},
]

[jobs.apiserver.filter]
identifier = "request_id"
equals = {{ api = "application" }}
one_of = {{ message = ["touch", "coupon_draw", "screen_imp"] }}

[jobs.apiserver.recode.ev]
coupon_draw = "coupon_get_imp"
"#,
        root = root.display()
    );

    let path = root.join("datalink.toml");
    fs::write(&path, content).expect("Failed to write config");
    path
}

fn window() -> Option<DateKey> {
    Some(DateKey::parse("20240301").expect("Failed to parse window"))
}

fn read_strings(path: &Path, column: usize) -> Vec<Option<String>> {
    let file = File::open(path).expect("Failed to open parquet file");
    let batch = ParquetRecordBatchReaderBuilder::try_new(file)
        .expect("Failed to open parquet reader")
        .build()
        .expect("Failed to build parquet reader")
        .next()
        .expect("parquet file should contain at least one batch")
        .expect("Failed to read record batch");

    let array = batch
        .column(column)
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("expected a string column");
    (0..array.len())
        .map(|i| {
            if array.is_null(i) {
                None
            } else {
                Some(array.value(i).to_string())
            }
        })
        .collect()
}

#[tokio::test]
async fn test_load_run_emits_partitioned_parquet() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = dir.path();
    seed_events(root);
    let config = RuntimeConfig::load_from_path(write_config(root)).expect("Failed to load config");

    let report = datalink::run(&config, "apiserver", RunMode::Load, window())
        .await
        .expect("Failed to run job");

    assert_eq!(report.state, JobState::Emitted);
    assert_eq!(report.rows_scanned, 3);
    assert_eq!(report.rows_emitted, 2);
    assert_eq!(report.partitions_written, 2);

    // The coupon_draw row landed under its recoded partition value
    let coupon = root.join("link/apiserver_events/dt=20240301/ev=coupon_get_imp/part-00000.parquet");
    assert_eq!(read_strings(&coupon, 0), vec![Some("r-1".to_string())]);
    assert_eq!(read_strings(&coupon, 1), vec![Some("ios".to_string())]);

    // The touch row had no ua field; normalization null-filled it
    let touch = root.join("link/apiserver_events/dt=20240301/ev=touch/part-00000.parquet");
    assert_eq!(read_strings(&touch, 0), vec![Some("r-2".to_string())]);
    assert_eq!(read_strings(&touch, 1), vec![None]);

    // Partition key columns live in the path, not the file
    let file = File::open(&touch).expect("Failed to open parquet file");
    let reader = ParquetRecordBatchReaderBuilder::try_new(file).expect("Failed to open reader");
    let names: Vec<&str> = reader
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    assert_eq!(names, vec!["request_id", "ua"]);

    // The out-of-window day was never written
    assert!(!root.join("link/apiserver_events/dt=20240229").exists());
}

#[tokio::test]
async fn test_test_mode_writes_nothing() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = dir.path();
    seed_events(root);
    let config = RuntimeConfig::load_from_path(write_config(root)).expect("Failed to load config");

    let report = datalink::run(&config, "apiserver", RunMode::Test, window())
        .await
        .expect("Failed to run job");

    assert_eq!(report.state, JobState::Skipped);
    assert_eq!(report.rows_emitted, 2);
    assert_eq!(report.partitions_written, 0);
    assert!(!root.join("link").exists());
}

#[tokio::test]
async fn test_rerun_replaces_partition() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = dir.path();
    seed_events(root);
    let config = RuntimeConfig::load_from_path(write_config(root)).expect("Failed to load config");

    datalink::run(&config, "apiserver", RunMode::Load, window())
        .await
        .expect("Failed to run job");

    // A stale object from an earlier run shape
    let partition = root.join("link/apiserver_events/dt=20240301/ev=touch");
    fs::write(partition.join("stale-0001.parquet"), b"old").expect("Failed to seed stale object");

    datalink::run(&config, "apiserver", RunMode::Load, window())
        .await
        .expect("Failed to re-run job");

    assert!(!partition.join("stale-0001.parquet").exists());
    assert_eq!(
        read_strings(&partition.join("part-00000.parquet"), 0),
        vec![Some("r-2".to_string())]
    );
}

#[tokio::test]
async fn test_unknown_job_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = dir.path();
    seed_events(root);
    let config = RuntimeConfig::load_from_path(write_config(root)).expect("Failed to load config");

    let err = datalink::run(&config, "missing", RunMode::Load, window())
        .await
        .expect_err("expected unknown-job error");
    assert!(err.to_string().contains("apiserver"));
}
