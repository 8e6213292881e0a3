//! HTTP client settings

use std::time::Duration;

/// Settings for the `reqwest` transport.
///
/// Timeouts live here and nowhere else; the operations on top issue a single
/// attempt per request.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Whole-request timeout
    pub timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Value sent in the `User-Agent` header
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("secret-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Builder for ClientSettings
#[derive(Debug, Default)]
pub struct ClientSettingsBuilder {
    settings: ClientSettings,
}

impl ClientSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.settings.timeout = Duration::from_secs(timeout_secs);
        self
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout_secs: u64) -> Self {
        self.settings.connect_timeout = Duration::from_secs(timeout_secs);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.settings.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> ClientSettings {
        self.settings
    }
}
