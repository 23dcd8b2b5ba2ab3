// Record-to-Arrow conversion
//
// Each column's Arrow type is inferred from the values it actually holds.
// A column must stay one scalar type across the batch; mixing types is an
// error rather than a silent cast. All-null columns fall back to Utf8.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, Int64Builder, RecordBatch, StringBuilder, TimestampMicrosecondBuilder,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};

use datalink_core::{Record, Value};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Str,
    Int,
    Ts,
}

impl ColumnKind {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Str(_) => Some(ColumnKind::Str),
            Value::Int(_) => Some(ColumnKind::Int),
            Value::Ts(_) => Some(ColumnKind::Ts),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ColumnKind::Str => "string",
            ColumnKind::Int => "integer",
            ColumnKind::Ts => "timestamp",
        }
    }
}

/// Convert records into one RecordBatch holding the given fields, in order.
/// Fields absent from a record become nulls.
pub fn records_to_arrow(records: &[Record], fields: &[String]) -> Result<RecordBatch> {
    let mut arrow_fields = Vec::with_capacity(fields.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(fields.len());

    for field in fields {
        let kind = infer_column_kind(records, field)?;
        let (data_type, array) = build_column(records, field, kind);
        arrow_fields.push(Field::new(field, data_type, true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(arrow_fields));
    Ok(RecordBatch::try_new(schema, arrays)?)
}

fn infer_column_kind(records: &[Record], field: &str) -> Result<ColumnKind> {
    let mut inferred: Option<ColumnKind> = None;
    for record in records {
        let Some(value) = record.get(field) else {
            continue;
        };
        let Some(kind) = ColumnKind::of(value) else {
            continue;
        };
        match inferred {
            None => inferred = Some(kind),
            Some(existing) if existing == kind => {}
            Some(existing) => {
                return Err(StoreError::ColumnType {
                    column: field.to_string(),
                    expected: existing.name().to_string(),
                    found: kind.name().to_string(),
                });
            }
        }
    }
    // All-null columns still need a concrete Arrow type
    Ok(inferred.unwrap_or(ColumnKind::Str))
}

fn build_column(records: &[Record], field: &str, kind: ColumnKind) -> (DataType, ArrayRef) {
    let rows = records.len();
    match kind {
        ColumnKind::Str => {
            let mut builder = StringBuilder::with_capacity(rows, rows * 16);
            for record in records {
                match record.get(field) {
                    Some(Value::Str(s)) => builder.append_value(s),
                    _ => builder.append_null(),
                }
            }
            (DataType::Utf8, Arc::new(builder.finish()) as ArrayRef)
        }
        ColumnKind::Int => {
            let mut builder = Int64Builder::with_capacity(rows);
            for record in records {
                match record.get(field) {
                    Some(Value::Int(i)) => builder.append_value(*i),
                    _ => builder.append_null(),
                }
            }
            (DataType::Int64, Arc::new(builder.finish()) as ArrayRef)
        }
        ColumnKind::Ts => {
            let mut builder =
                TimestampMicrosecondBuilder::with_capacity(rows).with_timezone("UTC");
            for record in records {
                match record.get(field) {
                    Some(Value::Ts(ts)) => builder.append_value(ts.timestamp_micros()),
                    _ => builder.append_null(),
                }
            }
            (
                DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
                Arc::new(builder.finish()) as ArrayRef,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray};
    use chrono::{TimeZone, Utc};

    fn record(fields: &[(&str, Value)]) -> Record {
        let mut r = Record::new();
        for (name, value) in fields {
            r.set(*name, value.clone());
        }
        r
    }

    #[test]
    fn test_string_and_int_columns() {
        let records = vec![
            record(&[("ev", Value::from("touch")), ("count", Value::from(3i64))]),
            record(&[("ev", Value::Null), ("count", Value::from(7i64))]),
        ];
        let fields = vec!["ev".to_string(), "count".to_string()];

        let batch = records_to_arrow(&records, &fields).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 2);

        let ev = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(ev.value(0), "touch");
        assert!(ev.is_null(1));

        let count = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(count.value(1), 7);
    }

    #[test]
    fn test_timestamp_column_is_utc_micros() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap();
        let records = vec![record(&[("at", Value::from(ts))])];
        let fields = vec!["at".to_string()];

        let batch = records_to_arrow(&records, &fields).unwrap();
        assert_eq!(
            batch.schema().field(0).data_type(),
            &DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
        );
    }

    #[test]
    fn test_all_null_column_falls_back_to_utf8() {
        let records = vec![record(&[("ev", Value::Null)]), record(&[])];
        let fields = vec!["ev".to_string()];

        let batch = records_to_arrow(&records, &fields).unwrap();
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        assert_eq!(batch.column(0).null_count(), 2);
    }

    #[test]
    fn test_absent_field_becomes_null() {
        let records = vec![
            record(&[("ev", Value::from("touch"))]),
            record(&[("other", Value::from("x"))]),
        ];
        let fields = vec!["ev".to_string()];

        let batch = records_to_arrow(&records, &fields).unwrap();
        let ev = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(ev.value(0), "touch");
        assert!(ev.is_null(1));
    }

    #[test]
    fn test_mixed_types_are_rejected() {
        let records = vec![
            record(&[("ev", Value::from("touch"))]),
            record(&[("ev", Value::from(1i64))]),
        ];
        let fields = vec!["ev".to_string()];

        let err = records_to_arrow(&records, &fields).unwrap_err();
        assert!(matches!(err, StoreError::ColumnType { .. }));
    }
}
