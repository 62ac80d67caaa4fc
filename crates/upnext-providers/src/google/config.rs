//! Settings for the Google OAuth and Calendar collaborators.

use std::time::Duration;

/// Google OAuth consent page.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Endpoints, timeouts and loopback settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    /// Consent page URL.
    pub auth_url: String,

    /// Token endpoint URL.
    pub token_url: String,

    /// Calendar API base URL.
    pub api_base: String,

    /// Per-request HTTP timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,

    /// Ports tried, in order, for the loopback redirect listener.
    pub loopback_port_range: (u16, u16),

    /// How long to wait for the browser to come back.
    pub callback_timeout: Duration,

    /// Whether to launch the browser. When false the URL is only printed.
    pub open_browser: bool,
}

impl GoogleConfig {
    /// Default HTTP timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default consent wait in seconds.
    pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;

    /// Default loopback port range.
    pub const DEFAULT_PORT_RANGE: (u16, u16) = (8080, 8090);

    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            api_base: CALENDAR_API_BASE.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("upnext/{}", env!("CARGO_PKG_VERSION")),
            loopback_port_range: Self::DEFAULT_PORT_RANGE,
            callback_timeout: Duration::from_secs(Self::DEFAULT_CALLBACK_TIMEOUT_SECS),
            open_browser: true,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the consent wait.
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Sets the loopback port range.
    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    /// Enables or disables launching the browser.
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err(format!(
                "invalid loopback port range {}-{}",
                self.loopback_port_range.0, self.loopback_port_range.1
            ));
        }
        if self.loopback_port_range.0 == 0 {
            return Err("loopback port range must not include port 0".to_string());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Builds the HTTP client shared by the token endpoint and API client.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = GoogleConfig::new();
        assert_eq!(config.token_url, GOOGLE_TOKEN_URL);
        assert_eq!(config.loopback_port_range, (8080, 8090));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.open_browser);
        assert!(config.user_agent.starts_with("upnext/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_builder_methods() {
        let config = GoogleConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_callback_timeout(Duration::from_secs(10))
            .with_loopback_port_range(9000, 9010)
            .with_open_browser(false);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.callback_timeout, Duration::from_secs(10));
        assert_eq!(config.loopback_port_range, (9000, 9010));
        assert!(!config.open_browser);
        assert!(config.user_agent.starts_with("upnext/"));
    }

    #[test]
    fn config_validation() {
        assert!(GoogleConfig::new().with_loopback_port_range(9010, 9000).validate().is_err());
        assert!(GoogleConfig::new().with_loopback_port_range(0, 10).validate().is_err());
        assert!(GoogleConfig::new().with_timeout(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn http_client_builds() {
        assert!(GoogleConfig::new().http_client().is_ok());
    }
}
