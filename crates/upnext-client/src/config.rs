//! Client configuration.
//!
//! All settings live in an optional `config.toml` file at
//! `~/.config/upnext/config.toml` by default. Every key has a default, so an
//! empty or missing file reproduces the stock behaviour: both JSON files next
//! to the executable and read-only calendar access.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use upnext_providers::AuthConfig;
use upnext_providers::google::GoogleConfig;

/// Configuration for the upnext client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Credential files and scopes.
    pub auth: AuthSettings,

    /// Interactive consent and HTTP settings.
    pub oauth: OAuthSettings,
}

/// File locations and requested permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// OAuth client file. Defaults to the program directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_path: Option<PathBuf>,

    /// Cached credential file. Defaults to the program directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_path: Option<PathBuf>,

    /// OAuth scopes requested during consent.
    pub scopes: Vec<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            provisioning_path: None,
            credential_path: None,
            scopes: vec![AuthConfig::DEFAULT_SCOPE.to_string()],
        }
    }
}

/// Interactive consent settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    /// First and last port tried for the loopback redirect.
    pub loopback_port_range: (u16, u16),

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,

    /// How long to wait for the browser redirect, in seconds.
    pub callback_timeout_secs: u64,

    /// Launch the browser automatically.
    pub open_browser: bool,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            loopback_port_range: GoogleConfig::DEFAULT_PORT_RANGE,
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
            callback_timeout_secs: GoogleConfig::DEFAULT_CALLBACK_TIMEOUT_SECS,
            open_browser: true,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("upnext")
    }

    /// Applies file locations given on the command line.
    pub fn with_paths(
        mut self,
        provisioning_path: Option<PathBuf>,
        credential_path: Option<PathBuf>,
    ) -> Self {
        if provisioning_path.is_some() {
            self.auth.provisioning_path = provisioning_path;
        }
        if credential_path.is_some() {
            self.auth.credential_path = credential_path;
        }
        self
    }

    /// Resolves the authorizer configuration.
    ///
    /// Unset paths fall back to the default file names in the program
    /// directory.
    pub fn to_auth_config(&self) -> AuthConfig {
        let mut config = AuthConfig::default().with_scopes(self.auth.scopes.clone());
        if let Some(ref path) = self.auth.provisioning_path {
            config.provisioning_path = path.clone();
        }
        if let Some(ref path) = self.auth.credential_path {
            config.credential_path = path.clone();
        }
        config
    }

    /// Resolves the Google collaborator configuration.
    pub fn to_google_config(&self) -> GoogleConfig {
        let (start, end) = self.oauth.loopback_port_range;
        GoogleConfig::new()
            .with_timeout(Duration::from_secs(self.oauth.timeout_secs))
            .with_callback_timeout(Duration::from_secs(self.oauth.callback_timeout_secs))
            .with_loopback_port_range(start, end)
            .with_open_browser(self.oauth.open_browser)
    }

    /// Validates the resolved configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.to_auth_config().validate()?;
        self.to_google_config().validate()
    }
}
