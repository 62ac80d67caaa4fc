//! Authorization: cached credential first, interactive consent otherwise.
//!
//! ```text
//! Authorizer::authorize()
//!   ├─ CredentialStore::load() ── hit ──▶ AuthorizedClient (no network)
//!   └─ miss ─▶ InteractiveFlow::authorize(scopes, provisioning file)
//!               └─ refresh token? ─ yes ─▶ CredentialStore::persist_refresh_token()
//! ```
//!
//! The interactive flow is an opaque collaborator. A cached credential is
//! trusted as-is; whether its refresh token still works is only discovered
//! when it is first used.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::{debug, info, warn};

use crate::credentials::{CredentialRecord, CredentialStore};
use crate::error::AuthResult;
use crate::provisioning::OAuthCredentials;
use crate::tokens::{AccessToken, TokenGrant};

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Scopes and file locations used by the [`Authorizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Permissions requested during consent.
    pub scopes: Vec<String>,
    /// Client identity issued by the provider (read-only).
    pub provisioning_path: PathBuf,
    /// Where the `authorized_user` record is cached.
    pub credential_path: PathBuf,
}

impl AuthConfig {
    /// Read-only access to calendars and their events.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar.readonly";

    /// File name of the provisioning file in the program directory.
    pub const PROVISIONING_FILE_NAME: &'static str = "credentials_google_calendar.json";

    /// File name of the credential file in the program directory.
    pub const CREDENTIAL_FILE_NAME: &'static str = "token.json";

    /// Creates a configuration with the default scope.
    pub fn new(provisioning_path: impl Into<PathBuf>, credential_path: impl Into<PathBuf>) -> Self {
        Self {
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
            provisioning_path: provisioning_path.into(),
            credential_path: credential_path.into(),
        }
    }

    /// Places both files in `dir` under their default names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(Self::PROVISIONING_FILE_NAME),
            dir.join(Self::CREDENTIAL_FILE_NAME),
        )
    }

    /// Directory containing the running executable, or `.` if unknown.
    pub fn program_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Sets the scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }
        if self.scopes.iter().any(|s| s.trim().is_empty()) {
            return Err("OAuth scopes must not be blank".to_string());
        }
        if self.provisioning_path == self.credential_path {
            return Err("provisioning and credential files must differ".to_string());
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::in_dir(Self::program_dir())
    }
}

/// How an [`AuthorizedClient`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOrigin {
    /// Rebuilt from the credential file.
    Cached,
    /// Returned by the interactive flow during this run.
    Interactive,
}

/// Capability to attach credentials to outbound API calls.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    credentials: OAuthCredentials,
    refresh_token: Option<String>,
    access_token: Option<AccessToken>,
    origin: AuthOrigin,
}

impl AuthorizedClient {
    /// Wraps a cached credential. No network access happens here.
    pub fn from_record(record: &CredentialRecord) -> Self {
        Self {
            credentials: record.credentials(),
            refresh_token: Some(record.refresh_token.clone()),
            access_token: None,
            origin: AuthOrigin::Cached,
        }
    }

    /// Wraps the tokens obtained by an interactive flow.
    pub fn from_grant(credentials: OAuthCredentials, grant: TokenGrant) -> Self {
        Self {
            credentials,
            refresh_token: grant.refresh_token,
            access_token: Some(grant.access),
            origin: AuthOrigin::Interactive,
        }
    }

    /// The client identity used to mint tokens.
    pub fn credentials(&self) -> &OAuthCredentials {
        &self.credentials
    }

    /// The long-lived refresh token, if one was issued.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// An access token that can be used right away, if any.
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref().filter(|t| !t.is_expired())
    }

    /// Returns true if the client carries any usable token.
    pub fn has_credentials(&self) -> bool {
        self.refresh_token.is_some() || self.access_token().is_some()
    }

    /// Where this client came from.
    pub fn origin(&self) -> AuthOrigin {
        self.origin
    }
}

/// Interactive authorization collaborator.
///
/// Implementations block on user consent (typically in a browser) and return
/// a client holding the new tokens. Redirect handling and code exchange are
/// entirely theirs.
pub trait InteractiveFlow: Send + Sync {
    /// Runs the flow for `scopes` using the client identity in
    /// `provisioning_path`.
    fn authorize<'a>(
        &'a self,
        scopes: &'a [String],
        provisioning_path: &'a Path,
    ) -> BoxFuture<'a, AuthResult<AuthorizedClient>>;
}

/// Produces an [`AuthorizedClient`], from cache when possible.
#[derive(Debug)]
pub struct Authorizer<F> {
    config: AuthConfig,
    store: CredentialStore,
    flow: F,
}

impl<F: InteractiveFlow> Authorizer<F> {
    /// Creates an authorizer over the files named in `config`.
    pub fn new(config: AuthConfig, flow: F) -> Self {
        let store = CredentialStore::new(&config.credential_path, &config.provisioning_path);
        Self {
            config,
            store,
            flow,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Returns the credential store.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Returns the cached client, or runs the interactive flow.
    ///
    /// Progress lines are written to `out`. Errors from the flow or from
    /// persisting its result are returned unchanged; nothing is retried.
    pub async fn authorize<W: Write>(&self, out: &mut W) -> AuthResult<AuthorizedClient> {
        if let Some(record) = self.store.load() {
            let _ = writeln!(out, "Existing credentials found and loaded.");
            return Ok(AuthorizedClient::from_record(&record));
        }

        let _ = writeln!(out, "No existing token found. Proceeding to authenticate...");
        self.run_flow(out).await
    }

    /// Runs the interactive flow even if a credential is cached.
    pub async fn reauthorize<W: Write>(&self, out: &mut W) -> AuthResult<AuthorizedClient> {
        debug!("ignoring cached credential at {}", self.store.path().display());
        self.run_flow(out).await
    }

    async fn run_flow<W: Write>(&self, out: &mut W) -> AuthResult<AuthorizedClient> {
        info!(scopes = ?self.config.scopes, "starting interactive authorization");

        let client = self
            .flow
            .authorize(&self.config.scopes, &self.config.provisioning_path)
            .await?;

        match client.refresh_token() {
            Some(refresh_token) => {
                self.store.persist_refresh_token(refresh_token)?;
                let _ = writeln!(out, "Token saved to {}", self.store.path().display());
            }
            None => {
                warn!("no refresh token issued, credential not persisted");
            }
        }

        let _ = writeln!(out, "Authorization complete.");
        Ok(client)
    }
}
