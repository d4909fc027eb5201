//! Configuration for the HTTP client and the logger.
//!
//! Both structs deserialize with every field optional, so a config file only
//! needs to name what it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::log::Level;
use crate::params::HttpHeaders;

/// Configuration for `HttpClient` and the `ureq` transport it creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Overall per-request timeout applied by the transport, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Sent as `user-agent` unless the request sets one.
    pub user_agent: Option<String>,
    /// Headers merged into every request that does not already set them.
    pub default_headers: HttpHeaders,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(30_000),
            user_agent: Some(format!("courier/{}", env!("CARGO_PKG_VERSION"))),
            default_headers: HttpHeaders::new(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Default headers with the user agent folded in.
    pub(crate) fn effective_default_headers(&self) -> HttpHeaders {
        let mut headers = self.default_headers.clone();
        if let Some(ua) = &self.user_agent {
            headers.set_if_absent(crate::params::HeaderName::USER_AGENT, ua.clone());
        }
        headers
    }
}

/// Configuration for a root `Logger`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub subsystem: String,
    pub category: String,
    pub min_level: Level,
    pub assertions_enabled: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            subsystem: "app".to_string(),
            category: "default".to_string(),
            min_level: Level::Info,
            assertions_enabled: cfg!(debug_assertions),
        }
    }
}

impl LoggerConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
