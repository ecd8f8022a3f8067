//! REST access to the audience-management backend.
//!
//! # Security
//!
//! The bearer token is held in a `secrecy` box and only exposed while building
//! the `Authorization` header. The header value is marked sensitive and the
//! `RedactedHeader` wrapper prints `[REDACTED]` in `Display` and `Debug`, so
//! the token does not leak into logs even with debug logging enabled.
//!
//! ```bash
//! # Avoid wire-level logging in production; it may still log request details
//! # AUDIENCE_LOG=reqwest=trace  <-- AVOID IN PRODUCTION
//! ```

pub mod cache;
pub mod client;
pub mod collections;
pub mod error;
pub mod parser;
pub mod resources;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;

pub use cache::StaleCache;
pub use client::ApiClient;
pub use collections::{Collection, CollectionFetcher};
pub use error::ApiError;

/// Upper bound on a server-requested `Retry-After` wait.
const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Classification of a failed request for retry decisions.
pub trait AsHttpError {
    /// The response status and `Retry-After` seconds, when a response arrived.
    fn as_http_error(&self) -> Option<(reqwest::StatusCode, Option<u64>)>;

    /// Failures worth repeating unchanged: no response, or a 5xx.
    fn is_transient(&self) -> bool;

    fn is_rate_limited(&self) -> bool;
}

/// How many times a request is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    fn wait_for<E: AsHttpError>(&self, error: &E) -> Duration {
        if error.is_rate_limited()
            && let Some((_, Some(seconds))) = error.as_http_error()
        {
            return Duration::from_secs(seconds.min(MAX_RETRY_AFTER_SECS));
        }
        self.delay
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempts are used up.
///
/// Transient and rate-limited failures are retried; everything else is
/// returned immediately. The last failure is returned when attempts run out.
pub async fn execute_with_retry<T, E, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: AsHttpError + fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error)
                if attempt < max_attempts && (error.is_transient() || error.is_rate_limited()) =>
            {
                let wait = policy.wait_for(&error);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    "request failed, retrying in {}ms: {error}",
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
