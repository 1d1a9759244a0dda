//! Half-open time intervals and query ranges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AvailabilityError, Result};

/// A `[start, end)` interval in UTC.
///
/// Construct with [`TimeInterval::new`] to have `start <= end` checked. The fields stay
/// public so that deserialized or hand-built values can still be fed to the calculator,
/// which validates its inputs before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Build an interval, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(AvailabilityError::InvertedInterval {
                index: 0,
                start,
                end,
            });
        }
        Ok(Self { start, end })
    }

    /// Length of the interval in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when the two half-open intervals share at least one instant.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Trim this interval to `range`. Returns `None` when nothing of it lies inside.
    ///
    /// A zero-length interval sitting inside the range is kept as-is.
    pub fn clip_to(&self, range: &QueryRange) -> Option<TimeInterval> {
        let start = self.start.max(range.time_min);
        let end = self.end.min(range.time_max);
        if start > end {
            return None;
        }
        Some(TimeInterval { start, end })
    }
}

/// The `[time_min, time_max]` window an availability query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRange {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
}

impl QueryRange {
    pub fn new(time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Result<Self> {
        let range = Self { time_min, time_max };
        range.validate()?;
        Ok(range)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.time_min > self.time_max {
            return Err(AvailabilityError::InvalidRange {
                time_min: self.time_min,
                time_max: self.time_max,
            });
        }
        Ok(())
    }

    pub fn as_interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.time_min,
            end: self.time_max,
        }
    }
}
