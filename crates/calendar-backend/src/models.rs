//! Wire types for the Google Calendar v3 REST API.
//!
//! Only the fields this crate reads or writes are modelled; everything else in the
//! API's JSON is ignored on deserialization.

use std::collections::HashMap;

use availability_engine::{parse_timestamp, TimeInterval};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Start or end of an event. Timed events carry `dateTime`, all-day events `date`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// `dateTime` if present, otherwise `date`.
    pub fn raw(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }

    /// The instant this value denotes, normalized to UTC.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.raw().and_then(|s| parse_timestamp(s).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
}

impl Attendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            response_status: None,
        }
    }
}

/// A calendar event as returned by `events.list` / `events.insert`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: EventDateTime,
    #[serde(default)]
    pub end: EventDateTime,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub html_link: Option<String>,
}

/// Response body of `events.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<Event>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Request body of `events.insert`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Vec<Attendee>,
}

/// Parameters of an `events.list` call.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub calendar_id: String,
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyRequest {
    pub time_min: String,
    pub time_max: String,
    pub time_zone: String,
    pub items: Vec<FreeBusyItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FreeBusyItem {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FreeBusyResponse {
    #[serde(default)]
    pub calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FreeBusyCalendar {
    #[serde(default)]
    pub busy: Vec<BusyPeriod>,
    #[serde(default)]
    pub errors: Vec<FreeBusyErrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusyPeriod {
    pub start: String,
    pub end: String,
}

impl BusyPeriod {
    /// Normalize both bounds to UTC.
    pub fn to_interval(&self) -> availability_engine::error::Result<TimeInterval> {
        TimeInterval::new(parse_timestamp(&self.start)?, parse_timestamp(&self.end)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FreeBusyErrorEntry {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub reason: String,
}
