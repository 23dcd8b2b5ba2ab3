// Partitioned Parquet sink
//
// Groups the batch by partition key values, then replaces each touched
// partition directory wholesale: delete the prefix, write one fresh data
// file. Re-running a window is therefore idempotent. Partitions that do
// not appear in the batch are left alone.
//
// Partition key values live in the directory path only; the data file
// carries the remaining columns.

use std::collections::BTreeMap;

use async_trait::async_trait;
use opendal::Operator;
use tracing::{debug, info};

use datalink_core::{PartitionSink, Record, SinkReport, Value};

use crate::batch::records_to_arrow;
use crate::encoding::{write_parquet, Compression};
use crate::error::{Result, StoreError};
use crate::partition::{partition_dir, partition_file};

pub struct ParquetPartitionWriter {
    op: Operator,
    base: String,
    compression: Compression,
}

impl ParquetPartitionWriter {
    pub fn new(op: Operator, base: impl Into<String>, compression: Compression) -> Self {
        Self {
            op,
            base: base.into(),
            compression,
        }
    }

    async fn write_partitions(
        &self,
        records: &[Record],
        partition_keys: &[String],
    ) -> Result<SinkReport> {
        if records.is_empty() {
            debug!(base = %self.base, "no rows to emit");
            return Ok(SinkReport::default());
        }

        let data_fields: Vec<String> = records[0]
            .field_names()
            .filter(|name| !partition_keys.iter().any(|key| key == name))
            .map(str::to_string)
            .collect();
        if data_fields.is_empty() {
            return Err(StoreError::InvalidConfig(
                "every output field is a partition key; nothing to write".to_string(),
            ));
        }

        let mut groups: BTreeMap<Vec<(String, String)>, Vec<Record>> = BTreeMap::new();
        for record in records {
            let key = partition_values(record, partition_keys)?;
            groups.entry(key).or_default().push(record.clone());
        }

        let mut report = SinkReport::default();
        for (key, rows) in &groups {
            let dir = partition_dir(&self.base, key);
            self.clear_partition(&dir).await?;

            let batch = records_to_arrow(rows, &data_fields)?;
            let bytes = write_parquet(&batch, self.compression)?;
            let file = partition_file(&dir);
            let size = bytes.len() as u64;
            self.op.write(&file, bytes).await?;

            info!(path = %file, rows = rows.len(), bytes = size, "wrote partition");
            report.partitions += 1;
            report.rows += rows.len();
            report.bytes_written += size;
        }

        Ok(report)
    }

    async fn clear_partition(&self, dir: &str) -> Result<()> {
        let prefix = format!("{}/", dir);
        match self.op.remove_all(&prefix).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PartitionSink for ParquetPartitionWriter {
    async fn write(
        &self,
        records: &[Record],
        partition_keys: &[String],
    ) -> anyhow::Result<SinkReport> {
        Ok(self.write_partitions(records, partition_keys).await?)
    }
}

fn partition_values(
    record: &Record,
    partition_keys: &[String],
) -> Result<Vec<(String, String)>> {
    partition_keys
        .iter()
        .map(|key| match record.get(key) {
            Some(Value::Str(s)) => Ok((key.clone(), s.clone())),
            Some(Value::Null) | None => Err(StoreError::PartitionKey {
                field: key.clone(),
                detail: "is null; cannot derive a partition path".to_string(),
            }),
            Some(other) => Err(StoreError::PartitionKey {
                field: key.clone(),
                detail: format!("must be a string, found {}", other.type_name()),
            }),
        })
        .collect()
}
