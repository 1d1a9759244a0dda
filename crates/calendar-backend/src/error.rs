//! Error types for calendar backend operations.

use availability_engine::AvailabilityError;
use thiserror::Error;

/// Errors raised while talking to the calendar API or handling credentials.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport failure (connection, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Calendar API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    /// The free/busy response did not contain usable data for the calendar.
    #[error("Free/busy query failed for calendar '{calendar_id}': {reason}")]
    FreeBusy { calendar_id: String, reason: String },

    /// A caller-supplied value (timestamp, duration) could not be used.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),
}

/// Convenience alias used throughout calendar-backend.
pub type Result<T> = std::result::Result<T, BackendError>;
