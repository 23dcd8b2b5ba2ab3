// Schema normalization: guarantee every required source field exists on
// every record, null-filling the absent ones. Downstream stages can then
// read fields without caring which upstream producer wrote the record.

use crate::job::RequiredSchema;
use crate::record::{Record, Value};

/// Null-fill one record against the required schema. Fields already present
/// keep their values; extra fields are carried through untouched.
pub fn normalize_record(mut record: Record, required: &RequiredSchema) -> Record {
    for name in required.iter() {
        if !record.contains(name) {
            record.set(name, Value::Null);
        }
    }
    record
}

/// Lazily normalize a stream of records.
pub fn normalize<'a, I>(records: I, required: &'a RequiredSchema) -> impl Iterator<Item = Record> + 'a
where
    I: IntoIterator<Item = Record> + 'a,
{
    records
        .into_iter()
        .map(move |record| normalize_record(record, required))
}
