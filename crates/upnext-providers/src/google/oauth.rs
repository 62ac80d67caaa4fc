//! OAuth 2.0 authorization-code flow with PKCE and a loopback redirect.
//!
//! # Flow Overview
//!
//! 1. Read the client identity from the provisioning file
//! 2. Generate a code verifier, its SHA-256 challenge and a random state
//! 3. Bind a listener on `127.0.0.1` and open the consent page
//! 4. Google redirects the browser to `/callback?code=..&state=..`
//! 5. Exchange the code (with the verifier) for access and refresh tokens
//!
//! The consent URL asks for offline access with a forced consent prompt so a
//! refresh token is issued every time.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::authorizer::{AuthorizedClient, BoxFuture, InteractiveFlow};
use crate::error::{AuthError, AuthResult};
use crate::provisioning::{ClientSecretRecord, OAuthCredentials};
use crate::tokens::{AccessToken, TokenGrant, TokenResponse};

use super::config::GoogleConfig;

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Interval between accept attempts while waiting for the browser.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Read timeout for a single callback connection.
const CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Path the browser is redirected to.
const CALLBACK_PATH: &str = "/callback";

/// Failure talking to the token endpoint.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The request could not be sent or the body not read.
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with an error status.
    #[error("token endpoint returned {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The endpoint answered with an unexpected body.
    #[error("invalid token response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Client for the OAuth token endpoint.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    http_client: reqwest::Client,
    token_url: String,
}

impl TokenEndpoint {
    /// Creates an endpoint client from `config`.
    pub fn new(config: &GoogleConfig) -> reqwest::Result<Self> {
        Ok(Self::with_client(config.http_client()?, &config.token_url))
    }

    /// Creates an endpoint client using an existing HTTP client.
    pub fn with_client(http_client: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            http_client,
            token_url: token_url.into(),
        }
    }

    /// Exchanges an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        credentials: &OAuthCredentials,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> Result<TokenGrant, TokenError> {
        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let grant = self.post_form(&params).await?.into_grant(scopes);
        info!(
            refresh_token = grant.refresh_token.is_some(),
            "exchanged authorization code"
        );
        Ok(grant)
    }

    /// Mints a new access token from a refresh token.
    pub async fn refresh_access_token(
        &self,
        credentials: &OAuthCredentials,
        refresh_token: &str,
    ) -> Result<AccessToken, TokenError> {
        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let grant = self.post_form(&params).await?.into_grant(&[]);
        debug!("refreshed access token");
        Ok(grant.access)
    }

    async fn post_form(&self, params: &[(&str, &str)]) -> Result<TokenResponse, TokenError> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TokenError::Rejected { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// PKCE flow state and utilities.
///
/// Implements RFC 7636 (Proof Key for Code Exchange).
#[derive(Debug)]
pub struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 hash of verifier, base64url encoded).
    pub challenge: String,
    /// Random state for CSRF protection.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new PKCE flow with random verifier and state.
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(16),
        }
    }

    /// Computes the S256 challenge for a code verifier.
    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the consent page URL.
    pub fn build_auth_url(
        &self,
        auth_url: &str,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            auth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Query parameters of a redirect to [`CALLBACK_PATH`].
#[derive(Debug, Default, PartialEq, Eq)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl CallbackParams {
    /// Parses a request target. Returns `None` for any other path.
    fn parse(target: &str) -> Option<Self> {
        let url = url::Url::parse("http://127.0.0.1").ok()?.join(target).ok()?;
        if url.path() != CALLBACK_PATH {
            return None;
        }

        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        Some(params)
    }

    fn is_success(&self) -> bool {
        self.error.is_none() && self.code.is_some()
    }

    /// Checks the outcome against the expected state.
    fn into_code(self, expected_state: &str) -> AuthResult<String> {
        if let Some(error) = self.error {
            return Err(AuthError::interactive(format!(
                "authorization denied: {}",
                error
            )));
        }
        let code = self
            .code
            .ok_or_else(|| AuthError::interactive("missing authorization code in callback"))?;
        if self.state.as_deref() != Some(expected_state) {
            return Err(AuthError::interactive(
                "OAuth state mismatch - possible CSRF attack",
            ));
        }
        Ok(code)
    }
}

/// Browser-based consent with a loopback redirect.
#[derive(Debug, Clone)]
pub struct LoopbackFlow {
    config: GoogleConfig,
    endpoint: TokenEndpoint,
}

impl LoopbackFlow {
    /// Creates a flow using `config`.
    pub fn new(config: GoogleConfig) -> reqwest::Result<Self> {
        let endpoint = TokenEndpoint::new(&config)?;
        Ok(Self { config, endpoint })
    }

    async fn run(&self, scopes: &[String], provisioning_path: &Path) -> AuthResult<AuthorizedClient> {
        let credentials = ClientSecretRecord::from_file(provisioning_path)?.credentials();
        let pkce = PkceFlow::new();

        let (listener, port) = Self::bind_loopback_server(self.config.loopback_port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);
        let auth_url = pkce.build_auth_url(
            &self.config.auth_url,
            &credentials.client_id,
            &redirect_uri,
            scopes,
        );
        debug!("authorization URL: {}", auth_url);

        if self.config.open_browser {
            info!("opening browser for consent");
            if let Err(e) = open::that(&auth_url) {
                warn!("failed to open browser: {}", e);
                eprintln!("\nPlease open this URL in your browser:\n\n{}\n", auth_url);
            }
        } else {
            eprintln!("\nPlease open this URL in your browser:\n\n{}\n", auth_url);
        }

        let timeout = self.config.callback_timeout;
        let params = tokio::task::spawn_blocking(move || Self::wait_for_callback(listener, timeout))
            .await
            .map_err(|e| AuthError::interactive("callback listener stopped").with_source(e))??;
        let code = params.into_code(&pkce.state)?;

        info!("received authorization code, exchanging for tokens");
        let grant = self
            .endpoint
            .exchange_code(&credentials, &code, &pkce.verifier, &redirect_uri, scopes)
            .await
            .map_err(|e| {
                AuthError::interactive(format!("token exchange failed: {}", e)).with_source(e)
            })?;

        Self::check_granted_scopes(&grant, scopes)?;
        Ok(AuthorizedClient::from_grant(credentials, grant))
    }

    /// Fails if the user unticked any requested scope on the consent page.
    fn check_granted_scopes(grant: &TokenGrant, scopes: &[String]) -> AuthResult<()> {
        if grant.access.has_scopes(scopes) {
            return Ok(());
        }
        Err(AuthError::interactive(format!(
            "consent did not grant all requested scopes (granted: {})",
            grant.access.scopes.join(" ")
        )))
    }

    /// Binds the first free port in `port_range` on `127.0.0.1`.
    fn bind_loopback_server(port_range: (u16, u16)) -> AuthResult<(TcpListener, u16)> {
        for port in port_range.0..=port_range.1 {
            match TcpListener::bind(("127.0.0.1", port)) {
                Ok(listener) => {
                    debug!("bound loopback server on port {}", port);
                    return Ok((listener, port));
                }
                Err(e) => debug!("port {} unavailable: {}", port, e),
            }
        }
        Err(AuthError::interactive(format!(
            "no available port in range {}-{}",
            port_range.0, port_range.1
        )))
    }

    /// Accepts connections until the redirect arrives or `timeout` elapses.
    fn wait_for_callback(listener: TcpListener, timeout: Duration) -> AuthResult<CallbackParams> {
        listener.set_nonblocking(true).map_err(|e| {
            AuthError::interactive("failed to configure loopback listener").with_source(e)
        })?;
        let deadline = Instant::now() + timeout;

        loop {
            if Instant::now() >= deadline {
                return Err(AuthError::interactive("OAuth callback timeout"));
            }

            match listener.accept() {
                Ok((stream, peer)) => {
                    debug!("callback connection from {}", peer);
                    if let Some(params) = Self::handle_callback(stream) {
                        return Ok(params);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
    }

    /// Answers one HTTP request. Returns the parameters if it was the
    /// redirect, `None` for anything else (favicon, stray requests, garbage).
    fn handle_callback(mut stream: TcpStream) -> Option<CallbackParams> {
        let _ = stream.set_nonblocking(false);
        let _ = stream.set_read_timeout(Some(CALLBACK_READ_TIMEOUT));

        let mut request_line = String::new();
        BufReader::new(&stream).read_line(&mut request_line).ok()?;

        // GET /callback?code=...&state=... HTTP/1.1
        let mut parts = request_line.split_whitespace();
        let params = match (parts.next(), parts.next()) {
            (Some("GET"), Some(target)) => CallbackParams::parse(target),
            _ => None,
        };

        let response = match &params {
            None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            Some(p) if p.is_success() => {
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
                <html><body><h1>Authorization Successful</h1>\
                <p>You can close this window and return to the terminal.</p></body></html>"
            }
            Some(_) => {
                "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
                <html><body><h1>Authorization Failed</h1>\
                <p>You can close this window.</p></body></html>"
            }
        };
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();

        params
    }
}

impl InteractiveFlow for LoopbackFlow {
    fn authorize<'a>(
        &'a self,
        scopes: &'a [String],
        provisioning_path: &'a Path,
    ) -> BoxFuture<'a, AuthResult<AuthorizedClient>> {
        Box::pin(self.run(scopes, provisioning_path))
    }
}
