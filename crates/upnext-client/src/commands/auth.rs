//! Authentication commands.

use std::io::Write;

use tracing::info;
use upnext_providers::google::LoopbackFlow;
use upnext_providers::{AuthOrigin, AuthorizedClient, Authorizer, CredentialStore, InteractiveFlow};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Builds an authorizer backed by the browser consent flow.
pub fn google_authorizer(config: &ClientConfig) -> ClientResult<Authorizer<LoopbackFlow>> {
    let auth_config = config.to_auth_config();
    auth_config.validate().map_err(ClientError::Config)?;

    let google_config = config.to_google_config();
    google_config.validate().map_err(ClientError::Config)?;

    let flow = LoopbackFlow::new(google_config).map_err(|e| ClientError::Http(e.to_string()))?;
    Ok(Authorizer::new(auth_config, flow))
}

/// Authorizes without listing events.
///
/// With `force` the interactive flow runs even if a credential is cached.
pub async fn run<F: InteractiveFlow, W: Write>(
    authorizer: &Authorizer<F>,
    force: bool,
    out: &mut W,
) -> ClientResult<AuthorizedClient> {
    let client = if force {
        authorizer.reauthorize(out).await?
    } else {
        authorizer.authorize(out).await?
    };

    if client.origin() == AuthOrigin::Cached {
        let _ = writeln!(out, "Use --force to re-authenticate.");
    }
    info!(origin = ?client.origin(), "authorization finished");
    Ok(client)
}

/// Deletes the cached credential.
///
/// Like every authorization console line, the outcome message is
/// best-effort.
pub fn logout<W: Write>(config: &ClientConfig, out: &mut W) -> ClientResult<()> {
    let auth_config = config.to_auth_config();
    let store = CredentialStore::new(&auth_config.credential_path, &auth_config.provisioning_path);

    if store.clear()? {
        let _ = writeln!(out, "Removed {}", store.path().display());
    } else {
        let _ = writeln!(out, "No credential file at {}", store.path().display());
    }
    Ok(())
}
