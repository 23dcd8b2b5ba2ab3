// Configuration validation
//
// Validates that required fields are present and values are sensible
// before any storage client is built or any record is scanned.

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

const SUPPORTED_COMPRESSION: &[&str] = &["gzip", "snappy", "zstd", "none"];

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_storage_config(&config.storage)?;
    validate_log_config(&config.log)?;

    // Fails early on a malformed offset instead of at window resolution
    config.time.offset()?;

    if config.jobs.is_empty() {
        bail!("No jobs configured; at least one [jobs.<name>] table is required");
    }

    for (name, job) in &config.jobs {
        validate_job_config(config, name, job)?;
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    match config.backend {
        StorageBackend::Fs => {
            let fs = config
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("fs storage backend requires 'fs' configuration"))?;

            if fs.path.is_empty() {
                bail!("storage.fs.path must not be empty");
            }
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("s3 storage backend requires 's3' configuration"))?;

            if s3.bucket.is_empty() {
                bail!("storage.s3.bucket is required for S3 backend");
            }

            if s3.region.is_empty() {
                bail!("storage.s3.region is required for S3 backend");
            }
        }
    }

    Ok(())
}

fn validate_log_config(config: &LogConfig) -> Result<()> {
    if config.level.is_empty() {
        bail!("log.level must not be empty");
    }

    Ok(())
}

fn validate_job_config(config: &RuntimeConfig, name: &str, job: &JobConfig) -> Result<()> {
    if config.catalog.tables.get(&job.source_table).is_none() {
        bail!(
            "jobs.{}.source_table '{}' is not in [catalog.tables]",
            name,
            job.source_table
        );
    }

    if job.sink_path.is_empty() {
        bail!("jobs.{}.sink_path must not be empty", name);
    }

    if !SUPPORTED_COMPRESSION.contains(&job.compression.as_str()) {
        bail!(
            "jobs.{}.compression '{}' is not supported. Supported: {}",
            name,
            job.compression,
            SUPPORTED_COMPRESSION.join(", ")
        );
    }

    if job.lag_days == 0 {
        warn!(
            job = name,
            "lag_days is 0; the job will export the current, still-accumulating day"
        );
    }

    // Spec-level consistency: columns, partition keys, recode targets
    job.to_spec(name).validate()?;

    Ok(())
}
