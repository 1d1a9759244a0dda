//! Google Calendar v3 REST client.

use async_trait::async_trait;
use availability_engine::{format_timestamp, QueryRange, TimeInterval};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::TokenSource;
use crate::error::{BackendError, Result};
use crate::models::{
    Event, EventList, EventQuery, FreeBusyItem, FreeBusyRequest, FreeBusyResponse, NewEvent,
};

/// The remote calendar operations the service layer depends on.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    /// Single (non-recurring-master) events in the query window, ordered by start time.
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>>;

    /// Insert an event and notify its attendees.
    async fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> Result<Event>;

    /// Busy intervals of one calendar within `range`, normalized to UTC and in the
    /// chronological order the API returns them.
    async fn busy_intervals(
        &self,
        calendar_id: &str,
        range: &QueryRange,
        time_zone: &str,
    ) -> Result<Vec<TimeInterval>>;
}

/// [`CalendarBackend`] over the Google Calendar REST API.
pub struct GoogleCalendarClient<T> {
    http: Client,
    api_base: String,
    tokens: T,
}

impl<T: TokenSource> GoogleCalendarClient<T> {
    pub fn new(api_base: impl Into<String>, tokens: T) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    /// `api_base` followed by the given path segments, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| BackendError::Config(format!("invalid API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| {
                BackendError::Config(format!("API base URL cannot be a base: {}", self.api_base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turn a non-success response into [`BackendError::Api`].
async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    warn!(status = status.as_u16(), "calendar_api_error");
    Err(BackendError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl<T: TokenSource> CalendarBackend for GoogleCalendarClient<T> {
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>> {
        let url = self.endpoint(&["calendars", &query.calendar_id, "events"])?;
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[
                ("timeMin", format_timestamp(&query.time_min)),
                ("timeMax", format_timestamp(&query.time_max)),
                ("maxResults", query.max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await?;

        let list: EventList = check_status(response).await?.json().await?;
        debug!(
            calendar_id = %query.calendar_id,
            count = list.items.len(),
            has_more = list.next_page_token.is_some(),
            "events_listed"
        );
        Ok(list.items)
    }

    async fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> Result<Event> {
        let url = self.endpoint(&["calendars", calendar_id, "events"])?;
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .query(&[("sendUpdates", "all")])
            .json(event)
            .send()
            .await?;

        let created: Event = check_status(response).await?.json().await?;
        info!(
            calendar_id,
            event_id = created.id.as_deref().unwrap_or_default(),
            html_link = created.html_link.as_deref().unwrap_or_default(),
            "event_created"
        );
        Ok(created)
    }

    async fn busy_intervals(
        &self,
        calendar_id: &str,
        range: &QueryRange,
        time_zone: &str,
    ) -> Result<Vec<TimeInterval>> {
        let url = self.endpoint(&["freeBusy"])?;
        let token = self.tokens.access_token().await?;
        let body = FreeBusyRequest {
            time_min: format_timestamp(&range.time_min),
            time_max: format_timestamp(&range.time_max),
            time_zone: time_zone.to_string(),
            items: vec![FreeBusyItem {
                id: calendar_id.to_string(),
            }],
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let mut freebusy: FreeBusyResponse = check_status(response).await?.json().await?;

        let calendar = freebusy
            .calendars
            .remove(calendar_id)
            .ok_or_else(|| BackendError::FreeBusy {
                calendar_id: calendar_id.to_string(),
                reason: "calendar missing from response".to_string(),
            })?;

        if !calendar.errors.is_empty() {
            let reason = calendar
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.domain, e.reason))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(BackendError::FreeBusy {
                calendar_id: calendar_id.to_string(),
                reason,
            });
        }

        let busy = calendar
            .busy
            .iter()
            .map(|period| period.to_interval())
            .collect::<availability_engine::error::Result<Vec<_>>>()?;
        debug!(calendar_id, count = busy.len(), "busy_intervals_fetched");
        Ok(busy)
    }
}
