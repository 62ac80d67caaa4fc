//! Listing upcoming events.
//!
//! One bounded, read-only query: the first page of at most
//! [`MAX_UPCOMING_EVENTS`] single-occurrence events on the primary calendar,
//! starting now, ordered by start time.

use std::io::Write;

use chrono::{DateTime, Utc};
use tracing::debug;
use upnext_core::CalendarEvent;

use crate::authorizer::{AuthorizedClient, BoxFuture};
use crate::error::AuthResult;

/// Hard cap on the number of listed events.
pub const MAX_UPCOMING_EVENTS: usize = 10;

/// Identifier of the user's primary calendar.
pub const PRIMARY_CALENDAR: &str = "primary";

/// Result ordering requested from the calendar service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// Ascending start time. Requires single events.
    StartTime,
}

impl OrderBy {
    /// The API parameter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartTime => "startTime",
        }
    }
}

/// Parameters of an event list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub calendar_id: String,
    /// Lower bound (exclusive) for an event's end time.
    pub time_min: DateTime<Utc>,
    pub max_results: usize,
    /// Expand recurring events into single instances.
    pub single_events: bool,
    pub order_by: OrderBy,
}

impl EventQuery {
    /// The upcoming-events query as of `now`.
    pub fn upcoming(now: DateTime<Utc>) -> Self {
        Self {
            calendar_id: PRIMARY_CALENDAR.to_string(),
            time_min: now,
            max_results: MAX_UPCOMING_EVENTS,
            single_events: true,
            order_by: OrderBy::StartTime,
        }
    }
}

/// Remote calendar query collaborator.
pub trait EventSource: Send + Sync {
    /// Returns the first page of events matching `query`, in service order.
    /// An empty calendar is `Ok(vec![])`, never an error.
    fn list_events<'a>(
        &'a self,
        auth: &'a AuthorizedClient,
        query: &'a EventQuery,
    ) -> BoxFuture<'a, AuthResult<Vec<CalendarEvent>>>;
}

/// Lists upcoming events and echoes them to a console sink.
#[derive(Debug)]
pub struct EventLister<S> {
    source: S,
}

impl<S: EventSource> EventLister<S> {
    /// Creates a lister over `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the event source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Lists events starting from the current instant.
    pub async fn list_upcoming<W: Write>(
        &self,
        auth: &AuthorizedClient,
        out: &mut W,
    ) -> AuthResult<Vec<CalendarEvent>> {
        self.list_upcoming_at(auth, Utc::now(), out).await
    }

    /// Lists events starting from `now`.
    ///
    /// Writes `No upcoming events found.` or a header followed by one
    /// `<start> - <summary>` line per event. Console write failures are
    /// ignored; query failures are returned.
    pub async fn list_upcoming_at<W: Write>(
        &self,
        auth: &AuthorizedClient,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> AuthResult<Vec<CalendarEvent>> {
        let query = EventQuery::upcoming(now);
        let mut events = self.source.list_events(auth, &query).await?;
        events.truncate(query.max_results);
        debug!(count = events.len(), calendar = %query.calendar_id, "listed upcoming events");

        if events.is_empty() {
            let _ = writeln!(out, "No upcoming events found.");
            return Ok(events);
        }

        let _ = writeln!(out, "Upcoming events:");
        for event in &events {
            let _ = writeln!(out, "{}", event);
        }
        Ok(events)
    }
}
