//! Core types: calendar events, console rendering, tracing

pub mod event;
pub mod tracing;

pub use event::{CalendarEvent, EventStart};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
