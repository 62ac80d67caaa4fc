//! Google Calendar API client.
//!
//! Fetches a single page of events from `calendars/{id}/events`, minting an
//! access token from the client's refresh token when it holds no live one.

use chrono::SecondsFormat;
use serde::Deserialize;
use tracing::{debug, warn};
use upnext_core::{CalendarEvent, EventStart};

use crate::authorizer::{AuthorizedClient, BoxFuture};
use crate::error::{AuthError, AuthResult};
use crate::events::{EventQuery, EventSource};

use super::config::GoogleConfig;
use super::oauth::TokenEndpoint;

/// Google Calendar API client.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
    endpoint: TokenEndpoint,
}

impl GoogleCalendarClient {
    /// Creates a client from `config`.
    pub fn new(config: &GoogleConfig) -> reqwest::Result<Self> {
        let http_client = config.http_client()?;
        Ok(Self {
            endpoint: TokenEndpoint::with_client(http_client.clone(), &config.token_url),
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Returns a bearer token for `auth`, refreshing if needed.
    async fn bearer_token(&self, auth: &AuthorizedClient) -> AuthResult<String> {
        if let Some(token) = auth.access_token() {
            return Ok(token.token.clone());
        }

        let refresh_token = auth
            .refresh_token()
            .ok_or_else(|| AuthError::remote_query("no usable access or refresh token"))?;

        debug!("minting access token from refresh token");
        let token = self
            .endpoint
            .refresh_access_token(auth.credentials(), refresh_token)
            .await
            .map_err(|e| {
                AuthError::remote_query(format!("failed to refresh access token: {}", e))
                    .with_source(e)
            })?;
        Ok(token.token)
    }

    /// Fetches the first page of events matching `query`.
    pub async fn fetch_events(
        &self,
        auth: &AuthorizedClient,
        query: &EventQuery,
    ) -> AuthResult<Vec<CalendarEvent>> {
        let token = self.bearer_token(auth).await?;
        let url = format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(&query.calendar_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .query(&build_query_parameters(query))
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    format!("connection failed: {}", e)
                } else {
                    format!("request failed: {}", e)
                };
                AuthError::remote_query(message).with_source(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body = response.text().await.map_err(|e| {
            AuthError::remote_query(format!("failed to read response: {}", e)).with_source(e)
        })?;
        let events = parse_event_list(&body)?;

        debug!("fetched {} events from calendar {}", events.len(), query.calendar_id);
        Ok(events)
    }
}

impl EventSource for GoogleCalendarClient {
    fn list_events<'a>(
        &'a self,
        auth: &'a AuthorizedClient,
        query: &'a EventQuery,
    ) -> BoxFuture<'a, AuthResult<Vec<CalendarEvent>>> {
        Box::pin(self.fetch_events(auth, query))
    }
}

/// Builds the `events.list` query string.
fn build_query_parameters(query: &EventQuery) -> Vec<(&'static str, String)> {
    vec![
        (
            "timeMin",
            query.time_min.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        ("maxResults", query.max_results.to_string()),
        ("singleEvents", query.single_events.to_string()),
        ("orderBy", query.order_by.as_str().to_string()),
    ]
}

fn status_error(status: reqwest::StatusCode, body: &str) -> AuthError {
    let message = match status {
        reqwest::StatusCode::UNAUTHORIZED => "access token expired or invalid".to_string(),
        reqwest::StatusCode::FORBIDDEN => "access denied to calendar".to_string(),
        reqwest::StatusCode::NOT_FOUND => "calendar not found".to_string(),
        reqwest::StatusCode::TOO_MANY_REQUESTS => "rate limit exceeded".to_string(),
        s if s.is_server_error() => format!("server error ({})", s),
        s => format!("API error ({}): {}", s, body),
    };
    AuthError::remote_query(message)
}

/// Parses an `events.list` response body.
fn parse_event_list(body: &str) -> AuthResult<Vec<CalendarEvent>> {
    let response: EventListResponse = serde_json::from_str(body).map_err(|e| {
        AuthError::remote_query(format!("failed to parse response: {}", e)).with_source(e)
    })?;

    Ok(response
        .items
        .into_iter()
        .map(ApiEvent::into_event)
        .collect())
}

/// Response from the events.list API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

/// Event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    start: Option<ApiEventTime>,
}

/// Event time from the API. `dateTime` for timed events, `date` for all-day.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date_time: Option<String>,
    date: Option<String>,
}

impl ApiEvent {
    /// Every event is kept. A start that does not parse is carried as the
    /// raw string the service sent.
    fn into_event(self) -> CalendarEvent {
        let id = self.id.unwrap_or_default();
        let start = self.start.unwrap_or_default();

        let start = match (start.date_time, start.date) {
            (Some(dt), _) => EventStart::parse_date_time(&dt).unwrap_or_else(|e| {
                warn!("event {}: failed to parse start time: {}", id, e);
                EventStart::Unparsed(dt)
            }),
            (None, Some(date)) => EventStart::parse_date(&date).unwrap_or_else(|e| {
                warn!("event {}: failed to parse start date: {}", id, e);
                EventStart::Unparsed(date)
            }),
            (None, None) => {
                warn!("event {} has no start time", id);
                EventStart::Unparsed(String::new())
            }
        };

        CalendarEvent::new(start, self.summary.unwrap_or_default())
    }
}
