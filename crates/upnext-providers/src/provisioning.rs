//! Provisioning file: the client identity issued by the API provider.
//!
//! The file is downloaded from the provider's console and is never written
//! by upnext. It holds either an `installed` (desktop) or a `web` section;
//! `installed` wins when both are present. Fields other than `client_id` and
//! `client_secret` (redirect URIs, endpoints, project id) are kept opaque.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// OAuth 2.0 client identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

/// One section of the provisioning file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecretEntry {
    pub client_id: String,
    pub client_secret: String,
    /// Everything else in the section, uninterpreted.
    #[serde(flatten)]
    pub redirect_config: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecretEntry>,
    web: Option<ClientSecretEntry>,
}

/// The parsed provisioning file, tagged by application type.
#[derive(Debug, Clone)]
pub enum ClientSecretRecord {
    /// Desktop ("installed") application.
    Installed(ClientSecretEntry),
    /// Web application.
    Web(ClientSecretEntry),
}

impl ClientSecretRecord {
    /// Reads and parses the provisioning file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AuthError::provisioning(path, format!("failed to read file: {}", e)).with_source(e)
        })?;
        let record = Self::from_json(&content).map_err(|e| AuthError::provisioning(path, e))?;
        debug!(kind = record.kind(), "loaded provisioning file {}", path.display());
        Ok(record)
    }

    /// Parses provisioning JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: ClientSecretFile =
            serde_json::from_str(json).map_err(|e| format!("failed to parse JSON: {}", e))?;

        let record = match (file.installed, file.web) {
            (Some(entry), _) => Self::Installed(entry),
            (None, Some(entry)) => Self::Web(entry),
            (None, None) => {
                return Err("expected an 'installed' or 'web' section".to_string());
            }
        };

        let entry = record.entry();
        if entry.client_id.is_empty() {
            return Err(format!("'{}.client_id' is empty", record.kind()));
        }
        if entry.client_secret.is_empty() {
            return Err(format!("'{}.client_secret' is empty", record.kind()));
        }
        Ok(record)
    }

    /// Returns `"installed"` or `"web"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Installed(_) => "installed",
            Self::Web(_) => "web",
        }
    }

    fn entry(&self) -> &ClientSecretEntry {
        match self {
            Self::Installed(entry) | Self::Web(entry) => entry,
        }
    }

    /// Normalizes to the client identity.
    pub fn credentials(&self) -> OAuthCredentials {
        let entry = self.entry();
        OAuthCredentials::new(&entry.client_id, &entry.client_secret)
    }

    /// The fields of the section that upnext does not interpret.
    pub fn redirect_config(&self) -> &Map<String, Value> {
        &self.entry().redirect_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installed_section() {
        let json = r#"{
            "installed": {
                "client_id": "test-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "project_id": "my-project",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let record = ClientSecretRecord::from_json(json).unwrap();
        assert_eq!(record.kind(), "installed");
        let creds = record.credentials();
        assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
        assert!(record.redirect_config().contains_key("redirect_uris"));
        assert!(!record.redirect_config().contains_key("client_id"));
    }

    #[test]
    fn web_section() {
        let json = r#"{ "web": { "client_id": "web-id", "client_secret": "web-secret" } }"#;
        let record = ClientSecretRecord::from_json(json).unwrap();
        assert_eq!(record.kind(), "web");
        assert_eq!(record.credentials(), OAuthCredentials::new("web-id", "web-secret"));
    }

    #[test]
    fn installed_preferred_over_web() {
        let json = r#"{
            "web": { "client_id": "W", "client_secret": "WS" },
            "installed": { "client_id": "I", "client_secret": "IS" }
        }"#;
        let record = ClientSecretRecord::from_json(json).unwrap();
        assert_eq!(record.credentials(), OAuthCredentials::new("I", "IS"));
    }

    #[test]
    fn missing_sections() {
        let err = ClientSecretRecord::from_json(r#"{ "other": {} }"#).unwrap_err();
        assert!(err.contains("installed"));
    }

    #[test]
    fn empty_fields_rejected() {
        let json = r#"{ "installed": { "client_id": "", "client_secret": "s" } }"#;
        assert!(ClientSecretRecord::from_json(json).unwrap_err().contains("client_id"));
        let json = r#"{ "web": { "client_id": "id", "client_secret": "" } }"#;
        assert!(ClientSecretRecord::from_json(json).unwrap_err().contains("client_secret"));
    }

    #[test]
    fn malformed_json() {
        let err = ClientSecretRecord::from_json("not json").unwrap_err();
        assert!(err.contains("parse"));
    }

    #[test]
    fn missing_file_is_provisioning_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientSecretRecord::from_file(dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Provisioning);
    }
}
