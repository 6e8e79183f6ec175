//! Configuration for [`HttpClient`](crate::HttpClient).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Same cap ureq applies when reading a body without an explicit limit.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// Settings for the default transport.
///
/// Deserializes from any serde format with every field optional, so it can
/// be embedded in a larger application config:
///
/// ```
/// let config: jsonhttp::ClientConfig =
///     serde_json::from_str(r#"{"timeout_ms": 5000, "user_agent": "billing/1.0"}"#).unwrap();
/// assert_eq!(config.timeout(), Some(std::time::Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Upper bound on a whole round trip, in milliseconds. A context deadline
    /// that is sooner takes precedence.
    pub timeout_ms: Option<u64>,

    /// Sent as `user-agent` unless the request sets its own.
    pub user_agent: Option<String>,

    /// 200 bodies larger than this fail with a transport error. Other bodies
    /// are cut to this length.
    pub max_body_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            user_agent: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = limit;
        self
    }
}
