//! The default command: authorize, then list upcoming events.

use std::io::Write;

use upnext_core::CalendarEvent;
use upnext_providers::google::GoogleCalendarClient;
use upnext_providers::{Authorizer, EventLister, EventSource, InteractiveFlow};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Builds a lister backed by the Calendar API.
pub fn google_lister(config: &ClientConfig) -> ClientResult<EventLister<GoogleCalendarClient>> {
    let client = GoogleCalendarClient::new(&config.to_google_config())
        .map_err(|e| ClientError::Http(e.to_string()))?;
    Ok(EventLister::new(client))
}

/// Authorizes and prints up to ten upcoming events.
pub async fn run<F, S, W>(
    authorizer: &Authorizer<F>,
    lister: &EventLister<S>,
    out: &mut W,
) -> ClientResult<Vec<CalendarEvent>>
where
    F: InteractiveFlow,
    S: EventSource,
    W: Write,
{
    let client = authorizer.authorize(out).await?;
    Ok(lister.list_upcoming(&client, out).await?)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use upnext_core::EventStart;
    use upnext_providers::{
        AuthConfig, AuthError, AuthResult, AuthorizedClient, BoxFuture, ErrorCategory, EventQuery,
    };

    use super::*;

    struct NoFlow;

    impl InteractiveFlow for NoFlow {
        fn authorize<'a>(
            &'a self,
            _scopes: &'a [String],
            _provisioning_path: &'a Path,
        ) -> BoxFuture<'a, AuthResult<AuthorizedClient>> {
            Box::pin(async { Err(AuthError::interactive("consent declined")) })
        }
    }

    struct CannedSource {
        events: Vec<CalendarEvent>,
        calls: AtomicUsize,
    }

    impl EventSource for CannedSource {
        fn list_events<'a>(
            &'a self,
            _auth: &'a AuthorizedClient,
            _query: &'a EventQuery,
        ) -> BoxFuture<'a, AuthResult<Vec<CalendarEvent>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let events = self.events.clone();
            Box::pin(async move { Ok(events) })
        }
    }

    fn source(events: Vec<CalendarEvent>) -> CannedSource {
        CannedSource {
            events,
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn lists_with_cached_credential() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("token.json"),
            r#"{"type":"authorized_user","client_id":"A","client_secret":"B","refresh_token":"R"}"#,
        )
        .unwrap();

        let authorizer = Authorizer::new(AuthConfig::in_dir(dir.path()), NoFlow);
        let lister = EventLister::new(source(vec![CalendarEvent::new(
            EventStart::parse_date("2024-06-01").unwrap(),
            "Picnic",
        )]));

        let mut out = Vec::new();
        let events = run(&authorizer, &lister, &mut out).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Existing credentials found and loaded.\nUpcoming events:\n2024-06-01 - Picnic\n"
        );
    }

    #[tokio::test]
    async fn failed_authorization_skips_listing() {
        let dir = tempfile::tempdir().unwrap();
        let authorizer = Authorizer::new(AuthConfig::in_dir(dir.path()), NoFlow);
        let lister = EventLister::new(source(vec![]));

        let mut out = Vec::new();
        let err = run(&authorizer, &lister, &mut out).await.unwrap_err();
        match err {
            ClientError::Auth(e) => assert_eq!(e.category(), ErrorCategory::InteractiveFlow),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(lister.source().calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("token.json").exists());
    }
}
