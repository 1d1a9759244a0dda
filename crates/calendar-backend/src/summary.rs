//! Compact event summaries: name, start and end only.

use serde::{Deserialize, Serialize};

use crate::models::Event;

pub const UNTITLED: &str = "No Title";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub summary: String,
    /// `dateTime` for timed events, `date` for all-day events, as sent by the API.
    pub start: String,
    pub end: String,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            summary: event
                .summary
                .clone()
                .unwrap_or_else(|| UNTITLED.to_string()),
            start: event.start.raw().unwrap_or_default().to_string(),
            end: event.end.raw().unwrap_or_default().to_string(),
        }
    }
}

pub fn summarize_events(events: &[Event]) -> Vec<EventSummary> {
    events.iter().map(EventSummary::from).collect()
}
