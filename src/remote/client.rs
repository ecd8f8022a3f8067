//! Thin REST client for the audience-management API.

use std::fmt;
use std::time::Duration;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretBox};
use url::Url;

use crate::config::Config;
use crate::error::{ConsoleError, Result};

use super::error::ApiError;
use super::{RetryPolicy, execute_with_retry};

/// Header naming the backend service a request is routed to.
pub const SERVICE_HEADER: &str = "service";

pub const DEFAULT_SERVICE: &str = "audience";

/// A header value that won't be printed in logs.
struct RedactedHeader {
    value: String,
}

impl RedactedHeader {
    fn bearer(token: &str) -> Self {
        Self {
            value: format!("Bearer {token}"),
        }
    }

    fn as_header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.value).map_err(|_| {
            ConsoleError::Config("API token contains characters not allowed in a header".to_string())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
    service: String,
    token: Option<SecretBox<String>>,
    retry: RetryPolicy,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("service", &self.service)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("retry", &self.retry)
            .finish()
    }
}

impl ApiClient {
    /// Create a client for `base_url` with default settings and no token.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, Duration::from_secs(30))
    }

    fn build(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ConsoleError::Config(format!("invalid API base URL '{base_url}': {e}"))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| ConsoleError::Other(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            service: DEFAULT_SERVICE.to_string(),
            token: None,
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client from configuration, environment overrides included.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.base_url().ok_or_else(|| {
            ConsoleError::Config(
                "no API base URL configured. Set api.base_url with 'audience config set' \
                 or the AUDIENCE_API_URL environment variable"
                    .to_string(),
            )
        })?;

        let mut client = Self::build(&base_url, config.request_timeout())?
            .with_service(config.api.service.clone())
            .with_retry(RetryPolicy::from(&config.retry));
        if let Some(token) = config.api_token() {
            client = client.with_token(token);
        }
        Ok(client)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretBox::new(Box::new(token.into())));
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` below the base URL, keeping any base path prefix.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| ConsoleError::Config(format!("invalid endpoint '{joined}': {e}")))
    }

    /// GET `path` with `params` and return the raw success body.
    ///
    /// Transport failures, 5xx and 429 responses are retried per the client's
    /// retry policy.
    pub async fn get_text(&self, path: &str, params: &[(String, String)]) -> Result<String> {
        let url = self.endpoint(path)?;
        let auth = self
            .token
            .as_ref()
            .map(|token| RedactedHeader::bearer(token.expose_secret()).as_header_value())
            .transpose()?;

        let response = execute_with_retry(self.retry, || {
            tracing::debug!(url = %url, ?params, "GET");
            let request = self.request(&url, params, auth.as_ref());
            async move {
                let response = request.send().await?;
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let retry_after = retry_after_secs(response.headers());
                let body = response.text().await.unwrap_or_default();
                let error = ApiError::from_response(status, &body);
                Err(match retry_after {
                    Some(seconds) => error.with_retry_after(seconds),
                    None => error,
                })
            }
        })
        .await?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;
        tracing::trace!(status = status.as_u16(), bytes = body.len(), "response received");
        Ok(body)
    }

    fn request(
        &self,
        url: &Url,
        params: &[(String, String)],
        auth: Option<&HeaderValue>,
    ) -> RequestBuilder {
        let mut request = self
            .client
            .get(url.clone())
            .header(SERVICE_HEADER, self.service.as_str())
            .header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .query(params);
        if let Some(value) = auth {
            request = request.header(header::AUTHORIZATION, value.clone());
        }
        request
    }
}

fn retry_after_secs(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}
