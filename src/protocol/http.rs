// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport implementation.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};

use crate::error::ProtocolError;
use crate::protocol::Endpoint;

// ============================================================================
// ServerConfig - Where the server lives
// ============================================================================

/// Configuration for reaching an `OrionBLE` server.
///
/// # Examples
///
/// ```
/// use orion_ble::protocol::ServerConfig;
/// use std::time::Duration;
///
/// // Defaults: http://localhost:5249
/// let config = ServerConfig::new();
///
/// // With all options
/// let config = ServerConfig::new()
///     .with_host("192.168.1.20")
///     .with_port(8080)
///     .with_timeout(Duration::from_secs(5))
///     .with_retry_delay(Duration::from_millis(250));
/// assert_eq!(config.base_url(), "http://192.168.1.20:8080");
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    timeout: Duration,
    retry_delay: Duration,
}

impl ServerConfig {
    /// Default server host.
    pub const DEFAULT_HOST: &'static str = "localhost";
    /// Default server port.
    pub const DEFAULT_PORT: u16 = 5249;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default delay between connection attempts.
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

    /// Creates a configuration pointing at the default local server.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            timeout: Self::DEFAULT_TIMEOUT,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
        }
    }

    /// Sets the server host.
    ///
    /// A host given with an explicit `http://` or `https://` scheme keeps it.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the server port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the delay between connection attempts in
    /// [`OrionBle::wait_for_connection`](crate::OrionBle::wait_for_connection).
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the delay between connection attempts.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}:{}", self.port)
        } else {
            format!("http://{host}:{}", self.port)
        }
    }

    /// Creates an `HttpClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<HttpClient, ProtocolError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpClient {
            base_url: self.base_url(),
            client,
            timeout: self.timeout,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// HTTP client for the `OrionBLE` REST API.
///
/// Cloning is cheap; clones share the underlying connection pool.
///
/// # Examples
///
/// ```no_run
/// use orion_ble::protocol::{Endpoint, ServerConfig};
///
/// # async fn example() -> orion_ble::Result<()> {
/// let client = ServerConfig::new().into_client()?;
/// let body = client.get(&Endpoint::DiscoverDevices).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Returns the base URL of the server.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Sends a GET request and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails or the server answers
    /// with a non-success status.
    pub async fn get(&self, endpoint: &Endpoint) -> Result<String, ProtocolError> {
        let url = self.build_url(endpoint);
        tracing::debug!(url = %url, "Sending GET request");
        self.execute(self.client.get(&url)).await
    }

    /// Sends a GET request with URL-encoded query parameters.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails or the server answers
    /// with a non-success status.
    pub async fn get_with_query(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
    ) -> Result<String, ProtocolError> {
        let url = self.build_url(endpoint);
        tracing::debug!(url = %url, ?params, "Sending GET request");
        self.execute(self.client.get(&url).query(params)).await
    }

    /// Sends a POST request with a JSON body and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails or the server answers
    /// with a non-success status.
    pub async fn post_json(
        &self,
        endpoint: &Endpoint,
        body: &serde_json::Value,
    ) -> Result<String, ProtocolError> {
        let url = self.build_url(endpoint);
        tracing::debug!(url = %url, body = %body, "Sending POST request");
        self.execute(self.client.post(&url).json(body)).await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<String, ProtocolError> {
        let response = request.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProtocolError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_error(e))?;

        tracing::debug!(body = %body, "Received HTTP response");

        Ok(body)
    }

    fn map_error(&self, error: reqwest::Error) -> ProtocolError {
        if error.is_timeout() {
            ProtocolError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
        } else {
            ProtocolError::Http(error)
        }
    }
}
