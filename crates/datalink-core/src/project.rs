// Projection and recode: shrink each surviving record to the configured
// output columns, renaming on the way, then rewrite flagged literals.

use crate::error::PipelineError;
use crate::job::{ColumnSpec, RecodeRule};
use crate::record::{Record, Value};

/// Project one record to the output shape and apply the recode rules.
///
/// Every source column must exist on the record; the normalizer has already
/// null-filled the required schema, so an absent field here means the stages
/// were run out of order or the spec is inconsistent.
pub fn project_record(
    record: &Record,
    columns: &[ColumnSpec],
    recode: &[RecodeRule],
) -> Result<Record, PipelineError> {
    let mut out = Record::with_capacity(columns.len());
    for column in columns {
        match record.get(&column.source) {
            Some(value) => out.set(&column.output, value.clone()),
            None => {
                return Err(PipelineError::schema(
                    &column.source,
                    "source field absent; record was not normalized against this schema",
                ));
            }
        }
    }

    for rule in recode {
        if let Some(slot) = out.get_mut(&rule.field) {
            let replacement = match slot {
                Value::Str(current) => rule
                    .map
                    .iter()
                    .find(|(from, _)| from.as_str() == current.as_str())
                    .map(|(_, to)| to.clone()),
                _ => None,
            };
            if let Some(to) = replacement {
                *slot = Value::Str(to);
            }
        }
    }

    Ok(out)
}

/// Stream adapter over [`project_record`].
pub fn project<'a, I>(
    records: I,
    columns: &'a [ColumnSpec],
    recode: &'a [RecodeRule],
) -> impl Iterator<Item = Result<Record, PipelineError>> + 'a
where
    I: IntoIterator<Item = Record> + 'a,
{
    records
        .into_iter()
        .map(move |record| project_record(&record, columns, recode))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::named("request_id"),
            ColumnSpec::renamed("message", "ev"),
            ColumnSpec::named("dt"),
        ]
    }

    fn recode() -> Vec<RecodeRule> {
        vec![RecodeRule {
            field: "ev".to_string(),
            map: vec![("coupon_draw".to_string(), "coupon_get_imp".to_string())],
        }]
    }

    fn source_record(message: Value) -> Record {
        let mut r = Record::new();
        r.set("request_id", Value::from("r-1"));
        r.set("message", message);
        r.set("dt", Value::from("20240301"));
        r.set("debug_flag", Value::from(1i64));
        r
    }

    #[test]
    fn test_projects_and_renames_in_order() {
        let out = project_record(&source_record(Value::from("touch")), &columns(), &[])
            .expect("Failed to project");
        let names: Vec<&str> = out.field_names().collect();
        assert_eq!(names, vec!["request_id", "ev", "dt"]);
        assert_eq!(out.get("ev"), Some(&Value::from("touch")));
        assert!(out.get("debug_flag").is_none());
    }

    #[test]
    fn test_recode_rewrites_matching_literal() {
        let out = project_record(&source_record(Value::from("coupon_draw")), &columns(), &recode())
            .expect("Failed to project");
        assert_eq!(out.get("ev"), Some(&Value::from("coupon_get_imp")));
    }

    #[test]
    fn test_recode_leaves_other_literals_alone() {
        let out = project_record(&source_record(Value::from("screen_imp")), &columns(), &recode())
            .expect("Failed to project");
        assert_eq!(out.get("ev"), Some(&Value::from("screen_imp")));
    }

    #[test]
    fn test_recode_skips_null() {
        let out = project_record(&source_record(Value::Null), &columns(), &recode())
            .expect("Failed to project");
        assert_eq!(out.get("ev"), Some(&Value::Null));
    }

    #[test]
    fn test_projection_is_deterministic() {
        let record = source_record(Value::from("coupon_draw"));
        let first = project_record(&record, &columns(), &recode()).expect("Failed to project");
        let second = project_record(&record, &columns(), &recode()).expect("Failed to project");
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_source_field_is_schema_error() {
        let mut r = Record::new();
        r.set("request_id", Value::from("r-1"));
        let err = project_record(&r, &columns(), &[]).expect_err("expected schema error");
        assert!(matches!(err, PipelineError::Schema { .. }));
    }

    #[test]
    fn test_stream_adapter() {
        let records = vec![
            source_record(Value::from("coupon_draw")),
            source_record(Value::from("touch")),
        ];
        let columns = columns();
        let recode = recode();
        let out: Result<Vec<Record>, PipelineError> =
            project(records, &columns, &recode).collect();
        let out = out.expect("Failed to project");
        assert_eq!(out[0].get("ev"), Some(&Value::from("coupon_get_imp")));
        assert_eq!(out[1].get("ev"), Some(&Value::from("touch")));
    }
}
