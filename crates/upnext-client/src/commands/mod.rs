//! Subcommand implementations.

pub mod auth;
pub mod config;
pub mod events;
