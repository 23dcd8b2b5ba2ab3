// Row filter: a conjunctive predicate compiled from the job's filter spec
// plus the resolved window. Null never equals anything, so records missing
// a constrained field drop out instead of erroring.

use crate::error::PipelineError;
use crate::job::FilterSpec;
use crate::record::{Record, Value};
use crate::window::DateKey;

/// Compiled row predicate for one run. Clauses are evaluated in a fixed
/// order and short-circuit on the first non-match.
#[derive(Debug, Clone)]
pub struct Predicate {
    window_field: String,
    window: DateKey,
    identifier: Option<String>,
    equals: Vec<(String, String)>,
    one_of: Vec<(String, Vec<String>)>,
}

impl Predicate {
    pub fn new(window_field: &str, window: DateKey, filter: &FilterSpec) -> Self {
        Self {
            window_field: window_field.to_string(),
            window,
            identifier: filter.identifier.clone(),
            equals: filter.equals.clone(),
            one_of: filter.one_of.clone(),
        }
    }

    /// The window this predicate selects.
    pub fn window(&self) -> &DateKey {
        &self.window
    }

    /// Evaluate the full conjunction against one record.
    ///
    /// Absent fields and explicit nulls compare as null: the clause fails
    /// and the record is dropped. A non-string value in a constrained field
    /// is a hard error, since every clause compares against string literals.
    pub fn matches(&self, record: &Record) -> Result<bool, PipelineError> {
        match string_field(record, &self.window_field)? {
            Some(v) if v == self.window.as_str() => {}
            _ => return Ok(false),
        }

        if let Some(field) = &self.identifier {
            match string_field(record, field)? {
                Some(v) if !v.is_empty() => {}
                _ => return Ok(false),
            }
        }

        for (field, literal) in &self.equals {
            match string_field(record, field)? {
                Some(v) if v == literal.as_str() => {}
                _ => return Ok(false),
            }
        }

        for (field, accepted) in &self.one_of {
            match string_field(record, field)? {
                Some(v) if accepted.iter().any(|a| a.as_str() == v) => {}
                _ => return Ok(false),
            }
        }

        Ok(true)
    }
}

fn string_field<'r>(record: &'r Record, field: &str) -> Result<Option<&'r str>, PipelineError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Str(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(PipelineError::predicate(
            field,
            format!("expected string, found {}", other.type_name()),
        )),
    }
}

/// Apply the predicate to a stream, keeping matches and surfacing the first
/// evaluation error.
pub fn filter_records<'a, I>(
    records: I,
    predicate: &'a Predicate,
) -> impl Iterator<Item = Result<Record, PipelineError>> + 'a
where
    I: IntoIterator<Item = Record> + 'a,
{
    records
        .into_iter()
        .filter_map(move |record| match predicate.matches(&record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        })
}
