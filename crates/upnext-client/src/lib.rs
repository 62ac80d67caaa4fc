//! Command-line interface for listing upcoming Google Calendar events.
//!
//! This crate provides the `upnext` binary.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
