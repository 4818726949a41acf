//! Main client for the AbraFlexi REST API.

use crate::api::{CompanyApi, ReadOnlyEvidence, ReadWriteEvidence};
use crate::config::{ClientConfig, Credentials, RetryConfig, DEFAULT_TIMEOUT};
use crate::error::{AbraFlexiError, AbraFlexiResult};
use crate::transport::HttpTransport;
use abraflexi_core::Evidence;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Client bound to one AbraFlexi server and company.
#[derive(Debug, Clone)]
pub struct AbraFlexiClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl AbraFlexiClient {
    /// Create a new client builder.
    pub fn builder() -> AbraFlexiClientBuilder {
        AbraFlexiClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> AbraFlexiResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Read-only handle for an evidence.
    pub fn read_only(&self, evidence: Evidence) -> ReadOnlyEvidence<'_> {
        ReadOnlyEvidence::new(self, evidence)
    }

    /// Read-write handle for an evidence.
    pub fn read_write(&self, evidence: Evidence) -> ReadWriteEvidence<'_> {
        ReadWriteEvidence::new(self, evidence)
    }

    /// Get the company API.
    pub fn company(&self) -> CompanyApi<'_> {
        CompanyApi::new(self)
    }
}

/// Builder for creating an AbraFlexiClient.
pub struct AbraFlexiClientBuilder {
    base_url: Option<String>,
    company: Option<String>,
    credentials: Option<Credentials>,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl AbraFlexiClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            company: None,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            retry_config: RetryConfig::default(),
        }
    }

    /// Set the base URL of the AbraFlexi server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the company identifier.
    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Set the credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Authenticate with login and password.
    pub fn basic_auth(self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials(Credentials::Basic {
            login: login.into(),
            password: password.into(),
        })
    }

    /// Authenticate with an existing session id.
    pub fn session_id(self, session_id: impl Into<String>) -> Self {
        self.credentials(Credentials::Session(session_id.into()))
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Build the client.
    pub fn build(self) -> AbraFlexiResult<AbraFlexiClient> {
        let base_url_str = self
            .base_url
            .ok_or_else(|| AbraFlexiError::Config("base_url is required".to_string()))?;

        let base_url = Url::parse(base_url_str.trim())?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(AbraFlexiError::Config(format!(
                "Only HTTP/HTTPS URLs are supported, got: {}",
                base_url.scheme()
            )));
        }

        let company = self
            .company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AbraFlexiError::Config("company is required".to_string()))?;

        let credentials = self
            .credentials
            .ok_or_else(|| AbraFlexiError::Config("credentials are required".to_string()))?;

        let config = ClientConfig {
            base_url,
            company,
            credentials,
            timeout: self.timeout,
            retry_config: self.retry_config,
        };

        AbraFlexiClient::from_config(config)
    }
}

impl Default for AbraFlexiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
