// JSONL table source
//
// Scans every `.jsonl` object under a table prefix and decodes each line
// into a record. Only null, string, and integer scalars are accepted;
// anything else in the input is a decode error, not a silent coercion.

use async_trait::async_trait;
use opendal::Operator;
use tracing::{debug, warn};

use datalink_core::{Record, RecordSource, Value};

use crate::error::{Result, StoreError};

pub struct JsonlTableSource {
    op: Operator,
    prefix: String,
}

impl JsonlTableSource {
    pub fn new(op: Operator, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { op, prefix }
    }

    async fn scan_table(&self) -> Result<Vec<Record>> {
        let entries = match self.op.list_with(&self.prefix).recursive(true).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => {
                warn!(prefix = %self.prefix, "source table prefix does not exist; scanning nothing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        let mut files = 0usize;
        for entry in entries {
            if !entry.path().ends_with(".jsonl") {
                continue;
            }
            let data = self.op.read(entry.path()).await?;
            decode_lines(entry.path(), &data.to_vec(), &mut records)?;
            files += 1;
        }

        debug!(
            prefix = %self.prefix,
            files,
            rows = records.len(),
            "scanned source table"
        );
        Ok(records)
    }
}

#[async_trait]
impl RecordSource for JsonlTableSource {
    async fn scan(&self) -> anyhow::Result<Vec<Record>> {
        Ok(self.scan_table().await?)
    }
}

fn decode_lines(path: &str, data: &[u8], out: &mut Vec<Record>) -> Result<()> {
    let text = std::str::from_utf8(data).map_err(|e| StoreError::Decode {
        path: path.to_string(),
        detail: e.to_string(),
    })?;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(line).map_err(|e| StoreError::Decode {
                path: path.to_string(),
                detail: format!("line {}: {}", lineno + 1, e),
            })?;

        let mut record = Record::with_capacity(object.len());
        for (name, value) in object {
            let value = decode_value(path, &name, value)?;
            record.set(&name, value);
        }
        out.push(record);
    }

    Ok(())
}

fn decode_value(path: &str, field: &str, value: serde_json::Value) -> Result<Value> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::String(s) => Ok(Value::Str(s)),
        serde_json::Value::Number(n) => n.as_i64().map(Value::Int).ok_or_else(|| {
            StoreError::UnsupportedValue {
                path: path.to_string(),
                field: field.to_string(),
                detail: format!("non-integer number {}", n),
            }
        }),
        serde_json::Value::Bool(_) => Err(unsupported(path, field, "boolean")),
        serde_json::Value::Array(_) => Err(unsupported(path, field, "array")),
        serde_json::Value::Object(_) => Err(unsupported(path, field, "object")),
    }
}

fn unsupported(path: &str, field: &str, kind: &str) -> StoreError {
    StoreError::UnsupportedValue {
        path: path.to_string(),
        field: field.to_string(),
        detail: format!("unsupported JSON type: {}", kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opendal::services;

    fn memory_op() -> Operator {
        Operator::new(services::Memory::default())
            .expect("Failed to create memory operator")
            .finish()
    }

    #[tokio::test]
    async fn test_scan_decodes_jsonl_objects() {
        let op = memory_op();
        op.write(
            "raw/events/2024/03/01.jsonl",
            b"{\"dt\":\"20240301\",\"request_id\":\"r-1\",\"status\":200}\n\n{\"dt\":\"20240301\",\"request_id\":null}\n".to_vec(),
        )
        .await
        .expect("Failed to seed object");
        op.write("raw/events/readme.txt", b"not data".to_vec())
            .await
            .expect("Failed to seed object");

        let source = JsonlTableSource::new(op, "raw/events");
        let records = source.scan().await.expect("Failed to scan");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("dt"), Some(&Value::from("20240301")));
        assert_eq!(records[0].get("status"), Some(&Value::from(200i64)));
        assert_eq!(records[1].get("request_id"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_missing_prefix_scans_nothing() {
        let source = JsonlTableSource::new(memory_op(), "raw/absent");
        let records = source.scan().await.expect("Failed to scan");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_line_is_a_decode_error() {
        let op = memory_op();
        op.write("raw/events/bad.jsonl", b"{\"dt\":\"20240301\"}\nnot json\n".to_vec())
            .await
            .expect("Failed to seed object");

        let source = JsonlTableSource::new(op, "raw/events");
        assert!(source.scan().await.is_err());
    }

    #[tokio::test]
    async fn test_nested_value_is_rejected() {
        let op = memory_op();
        op.write(
            "raw/events/nested.jsonl",
            b"{\"dt\":\"20240301\",\"payload\":{\"a\":1}}\n".to_vec(),
        )
        .await
        .expect("Failed to seed object");

        let source = JsonlTableSource::new(op, "raw/events");
        let err = source.scan().await.expect_err("expected decode failure");
        assert!(err.to_string().contains("payload"));
    }

    #[test]
    fn test_float_is_rejected() {
        let mut out = Vec::new();
        let result = decode_lines("x.jsonl", b"{\"score\":1.5}", &mut out);
        assert!(matches!(
            result,
            Err(StoreError::UnsupportedValue { .. })
        ));
    }
}
