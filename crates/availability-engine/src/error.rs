//! Error types for availability-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Precondition violations detected before a free-slot computation runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AvailabilityError {
    #[error("Invalid query range: time_min {time_min} is after time_max {time_max}")]
    InvalidRange {
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    },

    /// A busy interval whose start lies after its end.
    #[error("Inverted busy interval at index {index}: start {start} is after end {end}")]
    InvertedInterval {
        index: usize,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The busy list is not sorted ascending by start; `index` is the first offender.
    #[error("Busy intervals not sorted by start at index {index}")]
    Unsorted { index: usize },

    #[error("Invalid timestamp '{input}': {reason}")]
    InvalidTimestamp { input: String, reason: String },
}

pub type Result<T> = std::result::Result<T, AvailabilityError>;
