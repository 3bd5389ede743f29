//! Session configuration
//!
//! Either built in code or loaded from the environment (`.env` is honoured).

use crate::error::{Result, WebUiError};
use std::time::Duration;

const DEFAULT_SCHEME: &str = "https";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for one [`Session`](crate::session::Session)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Host name of the server, without scheme or path
    pub host: String,
    /// `https` in production, `http` for local test servers
    pub scheme: String,
    /// Per-request timeout handed to the HTTP client
    pub timeout: Duration,
    pub user_agent: String,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            scheme: DEFAULT_SCHEME.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("webui-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Load from `WEBUI_HOST`, `WEBUI_SCHEME` and `WEBUI_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("WEBUI_HOST")
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| WebUiError::Config("WEBUI_HOST environment variable not set".into()))?;

        let mut config = Self::new(host);
        if let Some(scheme) = lookup("WEBUI_SCHEME") {
            config.scheme = scheme;
        }
        if let Some(raw) = lookup("WEBUI_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                WebUiError::Config(format!("WEBUI_TIMEOUT_SECS must be a number of seconds: {}", e))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
