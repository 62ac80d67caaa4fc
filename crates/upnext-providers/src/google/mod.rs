//! Google collaborators for the authorizer and the event lister.
//!
//! - [`LoopbackFlow`] runs the OAuth 2.0 PKCE consent in a browser and
//!   receives the redirect on a `127.0.0.1` listener.
//! - [`GoogleCalendarClient`] mints access tokens from the refresh token and
//!   queries Calendar API v3.
//!
//! # Example
//!
//! ```ignore
//! use upnext_providers::google::{GoogleCalendarClient, GoogleConfig, LoopbackFlow};
//! use upnext_providers::{AuthConfig, Authorizer, EventLister};
//!
//! let config = GoogleConfig::new();
//! let authorizer = Authorizer::new(AuthConfig::default(), LoopbackFlow::new(config.clone())?);
//! let mut out = std::io::stdout();
//! let client = authorizer.authorize(&mut out).await?;
//!
//! let lister = EventLister::new(GoogleCalendarClient::new(&config)?);
//! lister.list_upcoming(&client, &mut out).await?;
//! ```

mod client;
mod config;
mod oauth;

pub use client::GoogleCalendarClient;
pub use config::{CALENDAR_API_BASE, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GoogleConfig};
pub use oauth::{LoopbackFlow, PkceFlow, TokenEndpoint, TokenError};
