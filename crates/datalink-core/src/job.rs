// Job specification: the data that distinguishes one export variant from
// another. One driver, many specs.

use crate::error::PipelineError;

/// One output column: value read from `source`, emitted as `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub source: String,
    pub output: String,
}

impl ColumnSpec {
    /// Identity column: same name on both sides.
    pub fn named(name: &str) -> Self {
        Self {
            source: name.to_string(),
            output: name.to_string(),
        }
    }

    /// Renamed column.
    pub fn renamed(source: &str, output: &str) -> Self {
        Self {
            source: source.to_string(),
            output: output.to_string(),
        }
    }
}

/// Row-filter clauses beyond the window match.
///
/// Fields referenced here do not have to appear in the column list; an
/// unselected field that is absent from a record evaluates as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// Field that must hold a non-empty string for a row to survive.
    pub identifier: Option<String>,
    /// Exact-equality clauses, all of which must hold.
    pub equals: Vec<(String, String)>,
    /// Whitelist clauses: the field value must be one of the literals.
    pub one_of: Vec<(String, Vec<String>)>,
}

/// Literal-to-literal substitution on one output field, applied after
/// projection.
#[derive(Debug, Clone, PartialEq)]
pub struct RecodeRule {
    pub field: String,
    pub map: Vec<(String, String)>,
}

/// Ordered set of source-side fields the normalizer guarantees present.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredSchema {
    fields: Vec<String>,
}

impl RequiredSchema {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Everything that parameterizes one pipeline run. Immutable once built.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub name: String,
    /// Days subtracted from "today" in the business timezone to pick the
    /// target window.
    pub lag_days: u32,
    /// Source field holding the 8-digit partition date.
    pub window_field: String,
    /// Ordered projection: source field to output field.
    pub columns: Vec<ColumnSpec>,
    pub filter: FilterSpec,
    pub recode: Vec<RecodeRule>,
    /// Output fields the sink partitions by, in path order.
    pub partition_keys: Vec<String>,
}

impl JobSpec {
    /// Source-side fields the normalizer must guarantee.
    pub fn required_schema(&self) -> RequiredSchema {
        RequiredSchema::new(self.columns.iter().map(|c| c.source.clone()).collect())
    }

    /// Output field names in emission order.
    pub fn output_fields(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.output.clone()).collect()
    }

    /// Spec consistency checks that must hold before any stage runs.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.columns.is_empty() {
            return Err(PipelineError::configuration(format!(
                "job '{}' selects no columns",
                self.name
            )));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            if seen.contains(&column.output.as_str()) {
                return Err(PipelineError::configuration(format!(
                    "job '{}' emits duplicate output field '{}'",
                    self.name, column.output
                )));
            }
            seen.push(column.output.as_str());
        }

        if !self.columns.iter().any(|c| c.source == self.window_field) {
            return Err(PipelineError::configuration(format!(
                "job '{}' window field '{}' is not a selected source column",
                self.name, self.window_field
            )));
        }

        if self.partition_keys.is_empty() {
            return Err(PipelineError::configuration(format!(
                "job '{}' declares no partition keys",
                self.name
            )));
        }
        for (i, key) in self.partition_keys.iter().enumerate() {
            if !seen.contains(&key.as_str()) {
                return Err(PipelineError::configuration(format!(
                    "job '{}' partition key '{}' is not an output field",
                    self.name, key
                )));
            }
            if self.partition_keys[..i].contains(key) {
                return Err(PipelineError::configuration(format!(
                    "job '{}' repeats partition key '{}'",
                    self.name, key
                )));
            }
        }

        for rule in &self.recode {
            if !seen.contains(&rule.field.as_str()) {
                return Err(PipelineError::configuration(format!(
                    "job '{}' recodes '{}', which is not an output field",
                    self.name, rule.field
                )));
            }
        }

        Ok(())
    }
}
