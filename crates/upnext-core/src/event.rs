//! Calendar event projection.
//!
//! [`CalendarEvent`] is the read-only view over whatever the remote calendar
//! returns: a start (either a specific instant or an all-day date) and a
//! summary. Nothing else is kept.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Start of a calendar event.
///
/// Timed events keep the UTC offset the provider reported so they render the
/// way the provider sent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventStart {
    /// A specific point in time.
    DateTime(DateTime<FixedOffset>),
    /// An all-day event date.
    Date(NaiveDate),
    /// Whatever the provider sent when it is neither of the above. Printed
    /// verbatim.
    Unparsed(String),
}

impl EventStart {
    /// Parses an RFC 3339 date-time.
    pub fn parse_date_time(value: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(value).map(Self::DateTime)
    }

    /// Parses a `YYYY-MM-DD` date.
    pub fn parse_date(value: &str) -> Result<Self, chrono::ParseError> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map(Self::Date)
    }
}

impl fmt::Display for EventStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Unparsed(raw) => f.write_str(raw),
        }
    }
}

/// An upcoming event as listed on the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// When the event starts.
    pub start: EventStart,
    /// The event title. Empty when the provider sent none.
    pub summary: String,
}

impl CalendarEvent {
    /// Creates a new event.
    pub fn new(start: EventStart, summary: impl Into<String>) -> Self {
        Self {
            start,
            summary: summary.into(),
        }
    }
}

/// Renders as `<start> - <summary>`.
impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_utc_date_time() {
        let start = EventStart::parse_date_time("2024-03-15T10:00:00Z").unwrap();
        assert!(matches!(start, EventStart::DateTime(_)));
        insta::assert_snapshot!(start.to_string(), @"2024-03-15T10:00:00Z");
    }

    #[test]
    fn offset_is_preserved() {
        let start = EventStart::parse_date_time("2024-03-15T10:00:00+01:00").unwrap();
        insta::assert_snapshot!(start.to_string(), @"2024-03-15T10:00:00+01:00");
    }

    #[test]
    fn parse_all_day() {
        let start = EventStart::parse_date("2024-03-15").unwrap();
        assert!(matches!(start, EventStart::Date(_)));
        assert_eq!(start.to_string(), "2024-03-15");
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(EventStart::parse_date_time("tomorrow").is_err());
        assert!(EventStart::parse_date("2024-13-01").is_err());
    }

    #[test]
    fn console_line() {
        let event = CalendarEvent::new(
            EventStart::parse_date_time("2024-03-15T10:00:00Z").unwrap(),
            "Standup",
        );
        insta::assert_snapshot!(event.to_string(), @"2024-03-15T10:00:00Z - Standup");

        let all_day = CalendarEvent::new(EventStart::parse_date("2024-03-16").unwrap(), "Offsite");
        insta::assert_snapshot!(all_day.to_string(), @"2024-03-16 - Offsite");
    }

    #[test]
    fn unparsed_start_is_printed_verbatim() {
        let event = CalendarEvent::new(EventStart::Unparsed("2024-03-16T25:00".into()), "Odd");
        insta::assert_snapshot!(event.to_string(), @"2024-03-16T25:00 - Odd");
    }

    #[test]
    fn console_line_without_summary() {
        let event = CalendarEvent::new(EventStart::parse_date("2024-03-16").unwrap(), "");
        assert_eq!(event.to_string(), "2024-03-16 - ");
    }

    #[test]
    fn serde_roundtrip_keeps_variant() {
        let event = CalendarEvent::new(EventStart::parse_date("2024-03-16").unwrap(), "Offsite");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["start"]["type"], "Date");
        let back: CalendarEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
