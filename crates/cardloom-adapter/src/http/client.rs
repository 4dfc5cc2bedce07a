/*
[INPUT]:  HTTP configuration (base URL, timeouts, credentials)
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::http::{CardloomError, Result};
use crate::types::{ErrorBody, Task};

/// Base URL for the Cardloom BaaS
const DEFAULT_BASE_URL: &str = "https://api.cardloom.app";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Credentials for authenticated requests
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
    /// Task resources owned by anyone else are rejected on receipt
    pub user_id: String,
}

/// Main HTTP client for the Cardloom API
#[derive(Debug)]
pub struct CardloomClient {
    http_client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl CardloomClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a new client against a specific deployment (or a mock server)
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
            credentials: None,
        })
    }

    /// Set credentials for authenticated requests
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Get credentials if set
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint)?)
    }

    /// Build a request carrying the bearer token; fails without credentials
    pub(crate) fn authed_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            CardloomError::Authorization("no credentials configured".to_string())
        })?;
        let url = self.url(endpoint)?;
        Ok(self
            .http_client
            .request(method, url)
            .bearer_auth(&credentials.access_token))
    }

    /// Reject a task that does not belong to the configured user
    pub(crate) fn ensure_owner(&self, task: Task) -> Result<Task> {
        match &self.credentials {
            Some(credentials) if credentials.user_id != task.user_id => {
                Err(CardloomError::Authorization(format!("task {}", task.id)))
            }
            _ => Ok(task),
        }
    }

    /// Send a request and decode a JSON body, mapping non-2xx statuses to typed errors
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "api response");

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|error| error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(CardloomError::api_error(status, message));
        }

        serde_json::from_slice(&body)
            .map_err(|err| CardloomError::InvalidResponse(format!("{url}: {err}")))
    }
}
