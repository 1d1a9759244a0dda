//! High-level calendar operations with sensible defaults.
//!
//! `CalendarService` is what an application talks to: it resolves default windows and
//! durations, normalizes user-supplied timestamps in the configured timezone, and hands
//! the busy list from the backend to the availability engine.

use availability_engine::{
    availability_report, compute_free_slots, format_timestamp, AvailabilityReport, QueryRange,
    TimeInterval,
};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use crate::client::CalendarBackend;
use crate::config::BackendConfig;
use crate::error::{BackendError, Result};
use crate::models::{Attendee, Event, EventDateTime, EventQuery, NewEvent};
use crate::summary::{summarize_events, EventSummary};

/// Calendar new events are written to, whatever calendar is configured for reads.
pub const PRIMARY_CALENDAR: &str = "primary";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;
pub const DEFAULT_MAX_RESULTS: u32 = 20;
pub const DEFAULT_DURATION_MINUTES: i64 = 30;

/// Optional parameters of [`CalendarService::get_events`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRequest {
    /// Defaults to seven days before `now`.
    pub time_min: Option<DateTime<Utc>>,
    /// Defaults to `now`.
    pub time_max: Option<DateTime<Utc>>,
    pub calendar_id: Option<String>,
    pub max_results: Option<u32>,
}

impl EventRequest {
    /// Fill in defaults relative to `now`.
    pub fn resolve(&self, now: DateTime<Utc>, default_calendar: &str) -> EventQuery {
        EventQuery {
            calendar_id: self
                .calendar_id
                .clone()
                .unwrap_or_else(|| default_calendar.to_string()),
            time_min: self
                .time_min
                .unwrap_or(now - Duration::days(DEFAULT_LOOKBACK_DAYS)),
            time_max: self.time_max.unwrap_or(now),
            max_results: self.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        }
    }
}

/// Parameters of [`CalendarService::create_event`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateEventRequest {
    pub summary: String,
    /// ISO 8601; a value without offset is read in the service's timezone.
    pub start_time: String,
    pub duration_minutes: i64,
    pub description: String,
    pub attendees: Vec<String>,
}

impl CreateEventRequest {
    pub fn new(summary: impl Into<String>, start_time: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            start_time: start_time.into(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            description: String::new(),
            attendees: Vec::new(),
        }
    }
}

pub struct CalendarService<B> {
    backend: B,
    timezone: Tz,
    calendar_id: String,
}

impl<B: CalendarBackend> CalendarService<B> {
    pub fn new(backend: B, timezone: Tz, calendar_id: impl Into<String>) -> Self {
        Self {
            backend,
            timezone,
            calendar_id: calendar_id.into(),
        }
    }

    pub fn from_config(backend: B, config: &BackendConfig) -> Result<Self> {
        Ok(Self::new(backend, config.tz()?, config.calendar_id.clone()))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Events in the requested window (default: the past week), at most 20 by default.
    pub async fn get_events(&self, request: &EventRequest) -> Result<Vec<Event>> {
        let query = request.resolve(Utc::now(), &self.calendar_id);
        self.backend.list_events(&query).await
    }

    /// Build the insert payload: start normalized to UTC, end = start + duration.
    pub fn build_event(&self, request: &CreateEventRequest) -> Result<NewEvent> {
        if request.duration_minutes <= 0 {
            return Err(BackendError::InvalidInput(format!(
                "duration must be positive, got {} minutes",
                request.duration_minutes
            )));
        }
        let start = parse_in_zone(&request.start_time, self.timezone)?;
        let end = Duration::try_minutes(request.duration_minutes)
            .and_then(|length| start.checked_add_signed(length))
            .ok_or_else(|| {
                BackendError::InvalidInput(format!(
                    "duration of {} minutes is out of range",
                    request.duration_minutes
                ))
            })?;
        let zone = self.timezone.name().to_string();

        Ok(NewEvent {
            summary: request.summary.clone(),
            description: request.description.clone(),
            start: EventDateTime {
                date_time: Some(format_timestamp(&start)),
                date: None,
                time_zone: Some(zone.clone()),
            },
            end: EventDateTime {
                date_time: Some(format_timestamp(&end)),
                date: None,
                time_zone: Some(zone),
            },
            attendees: request.attendees.iter().map(Attendee::new).collect(),
        })
    }

    /// Create an event on the user's primary calendar, notifying all attendees.
    pub async fn create_event(&self, request: &CreateEventRequest) -> Result<Event> {
        let event = self.build_event(request)?;
        self.backend.insert_event(PRIMARY_CALENDAR, &event).await
    }

    /// Free intervals of `calendar_id` (default: the service's calendar) in the range.
    pub async fn get_free_availability(
        &self,
        time_min: &str,
        time_max: &str,
        calendar_id: Option<&str>,
    ) -> Result<Vec<TimeInterval>> {
        let (range, busy) = self.fetch_busy(time_min, time_max, calendar_id).await?;
        Ok(compute_free_slots(range.time_min, range.time_max, &busy)?)
    }

    /// Busy blocks and free slots for the range.
    pub async fn availability_report(
        &self,
        time_min: &str,
        time_max: &str,
        calendar_id: Option<&str>,
    ) -> Result<AvailabilityReport> {
        let (range, busy) = self.fetch_busy(time_min, time_max, calendar_id).await?;
        Ok(availability_report(range.time_min, range.time_max, &busy)?)
    }

    pub fn get_event_summaries(&self, events: &[Event]) -> Vec<EventSummary> {
        summarize_events(events)
    }

    async fn fetch_busy(
        &self,
        time_min: &str,
        time_max: &str,
        calendar_id: Option<&str>,
    ) -> Result<(QueryRange, Vec<TimeInterval>)> {
        let range = QueryRange::new(
            parse_in_zone(time_min, self.timezone)?,
            parse_in_zone(time_max, self.timezone)?,
        )?;
        let calendar_id = calendar_id.unwrap_or(&self.calendar_id);
        let busy = self
            .backend
            .busy_intervals(calendar_id, &range, self.timezone.name())
            .await?;
        Ok((range, busy))
    }
}

/// Parse a timestamp, reading offset-less values as wall-clock time in `zone`.
///
/// Values carrying `Z` or an explicit offset are taken as-is. A wall-clock time that
/// falls in a DST gap is rejected; an ambiguous one resolves to the earlier instant.
pub fn parse_in_zone(input: &str, zone: Tz) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| {
            BackendError::InvalidInput(format!("unrecognised timestamp: {input}"))
        })?;

    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            BackendError::InvalidInput(format!(
                "{input} does not exist in {} (DST gap)",
                zone.name()
            ))
        })
}
