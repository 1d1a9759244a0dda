//! Compute free time slots from a sorted busy list.
//!
//! Busy intervals arrive in chronological order (the free/busy endpoint of a calendar
//! API guarantees this) and are not re-sorted here. They are clipped to the query range,
//! then a single pass advances a cursor over them and emits the gaps.

use chrono::{DateTime, Utc};

use crate::error::{AvailabilityError, Result};
use crate::interval::{QueryRange, TimeInterval};

/// Check that every interval has `start <= end` and that starts never decrease.
pub fn validate_busy(busy: &[TimeInterval]) -> Result<()> {
    for (index, interval) in busy.iter().enumerate() {
        if interval.start > interval.end {
            return Err(AvailabilityError::InvertedInterval {
                index,
                start: interval.start,
                end: interval.end,
            });
        }
    }
    if let Some(index) = busy
        .windows(2)
        .position(|pair| pair[1].start < pair[0].start)
    {
        return Err(AvailabilityError::Unsorted { index: index + 1 });
    }
    Ok(())
}

/// Clip to the range, dropping anything outside it and anything left with zero length.
///
/// Clipping preserves start order, so the result is still sorted.
fn clip_busy(range: &QueryRange, busy: &[TimeInterval]) -> Vec<TimeInterval> {
    busy.iter()
        .filter_map(|interval| interval.clip_to(range))
        .filter(|interval| !interval.is_empty())
        .collect()
}

/// Free intervals inside `[time_min, time_max]` not covered by any busy interval.
///
/// `busy` must be sorted ascending by start. Overlapping and adjacent busy intervals
/// collapse; no zero-length gap is ever emitted. Busy intervals reaching outside the
/// range are clipped to it first, so a meeting that runs past `time_max` still leaves
/// the gap before it intact.
///
/// # Errors
/// [`AvailabilityError::InvalidRange`] when `time_min > time_max`,
/// [`AvailabilityError::InvertedInterval`] or [`AvailabilityError::Unsorted`] for a
/// malformed busy list.
pub fn compute_free_slots(
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
    busy: &[TimeInterval],
) -> Result<Vec<TimeInterval>> {
    let range = QueryRange::new(time_min, time_max)?;
    validate_busy(busy)?;

    let (last_end, mut free) = clip_busy(&range, busy).into_iter().fold(
        (range.time_min, Vec::new()),
        |(last_end, mut free), interval| {
            if last_end < interval.start {
                free.push(TimeInterval {
                    start: last_end,
                    end: interval.start,
                });
            }
            // max() keeps the cursor from moving backwards on nested intervals.
            (last_end.max(interval.end), free)
        },
    );

    if last_end < range.time_max {
        free.push(TimeInterval {
            start: last_end,
            end: range.time_max,
        });
    }

    Ok(free)
}

/// Merge overlapping or adjacent busy intervals, clipped to the range.
///
/// Returns a sorted, non-overlapping list: the complement of [`compute_free_slots`]
/// within the range.
pub fn merge_busy_intervals(
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
    busy: &[TimeInterval],
) -> Result<Vec<TimeInterval>> {
    let range = QueryRange::new(time_min, time_max)?;
    validate_busy(busy)?;

    let mut merged: Vec<TimeInterval> = Vec::new();
    for interval in clip_busy(&range, busy) {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                last.end = last.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }

    Ok(merged)
}

/// Earliest gap of `min_duration_minutes` or longer, if any.
///
/// Same validation and clipping as [`compute_free_slots`]; `Ok(None)` means every gap
/// in the range is shorter.
pub fn find_first_free_slot(
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
    busy: &[TimeInterval],
    min_duration_minutes: i64,
) -> Result<Option<TimeInterval>> {
    Ok(compute_free_slots(time_min, time_max, busy)?
        .into_iter()
        .find(|slot| slot.duration_minutes() >= min_duration_minutes))
}
