// datalink-config - Runtime configuration for the export pipeline
//
// Supports configuration from multiple sources:
// 1. Config file path from DATALINK_CONFIG env var
// 2. Config file contents from DATALINK_CONFIG_CONTENT env var
// 3. Default config file locations (./datalink.toml, ./config.toml)
//
// Jobs are pure data: every export variant is a [jobs.<name>] table, and
// the same driver runs whichever one is selected.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use datalink_core::{ColumnSpec, FilterSpec, JobSpec, RecodeRule};

mod sources;
mod validation;

/// Main runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub storage: StorageConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub time: TimeConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    pub jobs: BTreeMap<String, JobConfig>,
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    S3,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "s3" | "aws" => Ok(StorageBackend::S3),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: fs, s3", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Business-time configuration. Window arithmetic happens in this offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    pub timezone_offset: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            timezone_offset: "+09:00".to_string(),
        }
    }
}

impl TimeConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        self.timezone_offset
            .parse::<FixedOffset>()
            .with_context(|| format!("Invalid time.timezone_offset: {}", self.timezone_offset))
    }
}

/// Source table catalog: logical table name to prefix under the storage root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub tables: BTreeMap<String, String>,
}

/// One export job, fully described as data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Catalog table the job scans.
    pub source_table: String,
    /// Prefix under the storage root the partitions land in.
    pub sink_path: String,

    #[serde(default = "default_lag_days")]
    pub lag_days: u32,

    #[serde(default = "default_window_field")]
    pub window_field: String,

    #[serde(default = "default_partition_keys")]
    pub partition_keys: Vec<String>,

    #[serde(default = "default_compression")]
    pub compression: String,

    pub columns: Vec<ColumnEntry>,

    #[serde(default)]
    pub filter: FilterEntry,

    #[serde(default)]
    pub recode: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_lag_days() -> u32 {
    1
}

fn default_window_field() -> String {
    "dt".to_string()
}

fn default_partition_keys() -> Vec<String> {
    vec!["dt".to_string(), "ev".to_string()]
}

fn default_compression() -> String {
    "gzip".to_string()
}

/// Column list entry: a bare string selects a field under its own name,
/// a table renames it on the way out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnEntry {
    Name(String),
    Renamed { source: String, output: String },
}

/// Row-filter clauses. Maps are keyed by field name; field order in the
/// compiled predicate follows the map's sorted order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default)]
    pub equals: BTreeMap<String, String>,

    #[serde(default)]
    pub one_of: BTreeMap<String, Vec<String>>,
}

impl JobConfig {
    /// Lower this job description into the driver's spec form.
    pub fn to_spec(&self, name: &str) -> JobSpec {
        let columns = self
            .columns
            .iter()
            .map(|entry| match entry {
                ColumnEntry::Name(name) => ColumnSpec::named(name),
                ColumnEntry::Renamed { source, output } => ColumnSpec::renamed(source, output),
            })
            .collect();

        let filter = FilterSpec {
            identifier: self.filter.identifier.clone(),
            equals: self
                .filter
                .equals
                .iter()
                .map(|(field, literal)| (field.clone(), literal.clone()))
                .collect(),
            one_of: self
                .filter
                .one_of
                .iter()
                .map(|(field, accepted)| (field.clone(), accepted.clone()))
                .collect(),
        };

        let recode = self
            .recode
            .iter()
            .map(|(field, map)| RecodeRule {
                field: field.clone(),
                map: map.iter().map(|(from, to)| (from.clone(), to.clone())).collect(),
            })
            .collect();

        JobSpec {
            name: name.to_string(),
            lag_days: self.lag_days,
            window_field: self.window_field.clone(),
            columns,
            filter,
            recode,
            partition_keys: self.partition_keys.clone(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the standard sources.
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from a specific file path (for the CLI --config flag).
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Look up one job by name.
    pub fn job(&self, name: &str) -> Result<&JobConfig> {
        self.jobs.get(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown job: {}. Configured jobs: {}",
                name,
                self.job_names().collect::<Vec<_>>().join(", ")
            )
        })
    }

    pub fn job_names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    /// Resolve a job's source table through the catalog.
    pub fn table_path(&self, table: &str) -> Result<&str> {
        self.catalog
            .tables
            .get(table)
            .map(String::as_str)
            .ok_or_else(|| anyhow::anyhow!("Unknown source table: {}", table))
    }
}
