// Target window resolution.
//
// The window is the date partition a run targets: current wall-clock time
// shifted into the business timezone, minus a fixed lag of full days,
// formatted as an 8-digit YYYYMMDD key.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use crate::error::PipelineError;

/// Validated 8-digit YYYYMMDD partition date key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateKey(String);

impl DateKey {
    /// Parse an operator-supplied key. Rejects anything that is not a real
    /// calendar date in YYYYMMDD form.
    pub fn parse(s: &str) -> Result<Self, PipelineError> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PipelineError::configuration(format!(
                "invalid date key '{s}': expected 8 digits (YYYYMMDD)"
            )));
        }
        NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|e| {
            PipelineError::configuration(format!("invalid date key '{s}': {e}"))
        })?;
        Ok(DateKey(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the target window for a run.
///
/// `now` is shifted into the business timezone, then `lag_days` full days
/// are subtracted. Lag is unsigned; a negative lag is unrepresentable.
pub fn resolve_window(now: DateTime<Utc>, timezone: FixedOffset, lag_days: u32) -> DateKey {
    let local = now.with_timezone(&timezone);
    let target = local - Duration::days(i64::from(lag_days));
    DateKey(target.format("%Y%m%d").to_string())
}
