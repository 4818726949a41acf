//! Configuration types for the AbraFlexi client.

use std::fmt;
use std::time::Duration;
use url::Url;

/// Default request timeout, matching the server-side default of five minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// How requests authenticate against the server.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP Basic authentication.
    Basic { login: String, password: String },
    /// Existing session, sent in the `X-authSessionId` header.
    Session(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { login, .. } => f
                .debug_struct("Basic")
                .field("login", login)
                .field("password", &"<redacted>")
                .finish(),
            Self::Session(_) => f.debug_tuple("Session").field(&"<redacted>").finish(),
        }
    }
}

impl Credentials {
    /// Short description safe for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Basic { login, .. } => format!("username/password ({})", login),
            Self::Session(_) => "session id".to_string(),
        }
    }
}

/// Configuration for the AbraFlexi client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the AbraFlexi server.
    pub base_url: Url,
    /// Company (database) identifier.
    pub company: String,
    /// Authentication.
    pub credentials: Credentials,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry configuration.
    pub retry_config: RetryConfig,
}

impl ClientConfig {
    /// Create a new configuration with default timeout and retries.
    pub fn new(base_url: Url, company: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url,
            company: company.into(),
            credentials,
            timeout: DEFAULT_TIMEOUT,
            retry_config: RetryConfig::default(),
        }
    }
}

/// Configuration for retry behavior of read requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// HTTP status codes to retry on.
    pub retry_on_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            retry_on_status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate backoff duration for a given attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status_codes.contains(&status)
    }
}
