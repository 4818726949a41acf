//! HTTP transport layer for the AbraFlexi client.

use crate::config::{ClientConfig, Credentials};
use crate::error::{AbraFlexiError, AbraFlexiResult};
use reqwest::{header, Client, RequestBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Header carrying an existing AbraFlexi session.
pub const SESSION_HEADER: &str = "x-authsessionid";

/// HTTP transport for making API requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> AbraFlexiResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        if let Credentials::Session(ref session_id) = config.credentials {
            headers.insert(
                header::HeaderName::from_static(SESSION_HEADER),
                header::HeaderValue::from_str(session_id)
                    .map_err(|_| AbraFlexiError::Config("Invalid session id format".to_string()))?,
            );
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(concat!("abraflexi-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Build a URL by appending percent-encoded path segments to the base URL.
    pub fn build_url(&self, segments: &[&str]) -> AbraFlexiResult<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AbraFlexiError::Config(format!(
                    "Base URL cannot carry a path: {}",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.credentials {
            Credentials::Basic { login, password } => request.basic_auth(login, Some(password)),
            Credentials::Session(_) => request,
        }
    }

    /// Execute a request with retries.
    ///
    /// Only used for reads: a retried write could be applied twice.
    async fn execute_with_retry(&self, request_builder: RequestBuilder) -> AbraFlexiResult<Response> {
        let retry_config = &self.config.retry_config;
        let mut attempts = 0;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| AbraFlexiError::Config("Request cannot be cloned".to_string()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(response);
                    }

                    if attempts < retry_config.max_retries
                        && retry_config.should_retry_status(status)
                    {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            status = status,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    return Err(AbraFlexiError::from_response(status, &body));
                }
                Err(e) => {
                    if attempts < retry_config.max_retries && (e.is_timeout() || e.is_connect()) {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            error = %e,
                            "Request did not reach the server, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }
                    return Err(map_send_error(e));
                }
            }
        }
    }

    /// Execute a request exactly once.
    async fn execute_once(&self, request_builder: RequestBuilder) -> AbraFlexiResult<Response> {
        let response = request_builder.send().await.map_err(map_send_error)?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(AbraFlexiError::from_response(status, &body))
    }

    /// Execute a GET request with query parameters.
    pub async fn get_json(&self, url: Url, query: &[(&str, String)]) -> AbraFlexiResult<Value> {
        debug!(url = %url, "GET request");

        let request = self.authorize(self.client.get(url).query(query));
        let response = self.execute_with_retry(request).await?;
        read_json(response).await
    }

    /// Execute a PUT request with a JSON body.
    pub async fn put_json(&self, url: Url, body: &Value) -> AbraFlexiResult<Value> {
        debug!(url = %url, "PUT request");

        let request = self.authorize(self.client.put(url).json(body));
        let response = self.execute_once(request).await?;
        read_json(response).await
    }

    /// Execute a DELETE request.
    pub async fn delete_json(&self, url: Url) -> AbraFlexiResult<Value> {
        debug!(url = %url, "DELETE request");

        let request = self.authorize(self.client.delete(url));
        let response = self.execute_once(request).await?;
        read_json(response).await
    }
}

fn map_send_error(e: reqwest::Error) -> AbraFlexiError {
    if e.is_timeout() {
        AbraFlexiError::Timeout
    } else {
        AbraFlexiError::Http(e)
    }
}

/// Parse a response body as JSON; an empty body is `null`.
async fn read_json(response: Response) -> AbraFlexiResult<Value> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}
