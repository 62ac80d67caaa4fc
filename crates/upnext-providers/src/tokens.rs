//! Short-lived OAuth tokens.
//!
//! Access tokens are kept in memory only. The credential file stores the
//! refresh token, from which a new access token is minted on each run.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Seconds shaved off the advertised lifetime so a token is not used right
/// at its expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A bearer token for API requests.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The token value.
    pub token: String,

    /// When the token stops being accepted, if known.
    pub expires_at: Option<DateTime<Utc>>,

    /// The scopes the token was granted for.
    pub scopes: Vec<String>,
}

impl AccessToken {
    /// Creates a token from an endpoint response.
    pub fn new(token: impl Into<String>, expires_in_secs: Option<i64>, scopes: Vec<String>) -> Self {
        let expires_at = expires_in_secs
            .map(|secs| Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_MARGIN_SECS));

        Self {
            token: token.into(),
            expires_at,
            scopes,
        }
    }

    /// Returns true if the token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }

    /// Returns true if the token covers every scope in `required`.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }
}

/// Everything a token endpoint handed back.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access: AccessToken,
    /// Only issued for offline access on first consent.
    pub refresh_token: Option<String>,
}

/// Response body of an OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Space-separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Converts into a grant, falling back to `requested` when the endpoint
    /// does not echo the granted scopes.
    pub(crate) fn into_grant(self, requested: &[String]) -> TokenGrant {
        let scopes = match self.scope {
            Some(scope) => scope.split_whitespace().map(String::from).collect(),
            None => requested.to_vec(),
        };
        TokenGrant {
            access: AccessToken::new(self.access_token, self.expires_in, scopes),
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
        }
    }
}
