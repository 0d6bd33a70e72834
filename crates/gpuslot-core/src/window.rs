//! Half-open time windows and timestamp parsing

use crate::{SlotError, SlotResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// A non-empty half-open interval `[start, end)` of absolute instants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    pub(crate) start: DateTime<Utc>,
    pub(crate) end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting `start >= end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> SlotResult<Self> {
        if start >= end {
            return Err(SlotError::Validation(format!(
                "start_time must be before end_time (got {} .. {})",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from ISO-8601 strings
    pub fn parse(start: &str, end: &str) -> SlotResult<Self> {
        let start = parse_instant("start_time", start)?;
        let end = parse_instant("end_time", end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Two windows overlap iff `s1 < e2 && s2 < e1`; touching windows do not
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `instant` lies in `[start, end)`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Parse an RFC 3339 timestamp and normalize it to UTC.
///
/// Timestamps without an offset are rejected instead of being read as local
/// time.
pub fn parse_instant(field: &str, value: &str) -> SlotResult<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SlotError::Validation(format!("{} is required", field)));
    }

    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) if looks_naive(value) => Err(SlotError::Validation(format!(
            "{} '{}' has no timezone offset (expected e.g. 2025-01-01T10:00:00Z)",
            field, value
        ))),
        Err(e) => Err(SlotError::Validation(format!(
            "{} '{}' is not a valid ISO-8601 timestamp: {}",
            field, value, e
        ))),
    }
}

fn looks_naive(value: &str) -> bool {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}
