//! Combined busy/free view of a single query range.
//!
//! This is what callers print or serialize: the merged busy blocks next to the free
//! slots they leave, both clipped to the same window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::freebusy::{compute_free_slots, merge_busy_intervals};
use crate::interval::{QueryRange, TimeInterval};

/// Busy and free intervals for one query range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub range: QueryRange,
    /// Merged busy blocks (sorted by start, non-overlapping).
    pub busy: Vec<TimeInterval>,
    /// Gaps between busy blocks within the range.
    pub free: Vec<TimeInterval>,
}

impl AvailabilityReport {
    /// Total free time in minutes.
    pub fn free_minutes(&self) -> i64 {
        self.free.iter().map(TimeInterval::duration_minutes).sum()
    }

    /// Total busy time in minutes, counting overlapping meetings once.
    pub fn busy_minutes(&self) -> i64 {
        self.busy.iter().map(TimeInterval::duration_minutes).sum()
    }

    /// Free slots lasting at least `min_duration_minutes`.
    pub fn free_at_least(&self, min_duration_minutes: i64) -> Vec<TimeInterval> {
        self.free
            .iter()
            .filter(|slot| slot.duration_minutes() >= min_duration_minutes)
            .copied()
            .collect()
    }
}

/// Build an [`AvailabilityReport`] for a sorted busy list.
pub fn availability_report(
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
    busy: &[TimeInterval],
) -> Result<AvailabilityReport> {
    let range = QueryRange::new(time_min, time_max)?;
    Ok(AvailabilityReport {
        range,
        busy: merge_busy_intervals(time_min, time_max, busy)?,
        free: compute_free_slots(time_min, time_max, busy)?,
    })
}
