//! Authorization and event listing for a personal Google Calendar.
//!
//! - [`CredentialStore`] - The `authorized_user` credential file
//! - [`Authorizer`] - Cached credential first, interactive consent otherwise
//! - [`EventLister`] - Up to ten upcoming events on the primary calendar
//! - [`google`] - The Google implementations of [`InteractiveFlow`] and
//!   [`EventSource`]
//!
//! # Architecture
//!
//! ```text
//!  provisioning file        credential file
//!         │                   ▲        │
//!         ▼                   │ save   │ load
//! ┌────────────────┐   ┌──────┴────────▼──┐
//! │ InteractiveFlow│◀──│    Authorizer    │
//! └────────────────┘   └────────┬─────────┘
//!                               │ AuthorizedClient
//!                               ▼
//!                      ┌──────────────────┐   ┌─────────────┐
//!                      │   EventLister    │──▶│ EventSource │
//!                      └──────────────────┘   └─────────────┘
//! ```

pub mod authorizer;
pub mod credentials;
pub mod error;
pub mod events;
pub mod google;
pub mod provisioning;
pub mod tokens;

// Re-export main types at crate root
pub use authorizer::{AuthConfig, AuthOrigin, AuthorizedClient, Authorizer, BoxFuture, InteractiveFlow};
pub use credentials::{AUTHORIZED_USER, CredentialRecord, CredentialStore};
pub use error::{AuthError, AuthResult, BoxError, ErrorCategory};
pub use events::{EventLister, EventQuery, EventSource, MAX_UPCOMING_EVENTS, OrderBy, PRIMARY_CALENDAR};
pub use provisioning::{ClientSecretEntry, ClientSecretRecord, OAuthCredentials};
pub use tokens::{AccessToken, TokenGrant};
