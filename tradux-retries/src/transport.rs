//! HTTP transport with automatic retries.

use crate::error::{RetryResult, ServiceError, ServiceResult};
use crate::executor::run;
use crate::policy::RetryPolicy;
use reqwest::{Client, Method, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout
        } else if err.is_connect() {
            ServiceError::Connection(err.to_string())
        } else {
            ServiceError::Other(err.into())
        }
    }
}

/// HTTP client that retries according to a [`RetryPolicy`].
///
/// Responses are classified before the retry decision: 429 becomes
/// [`ServiceError::RateLimited`] with the parsed Retry-After, 5xx becomes an
/// HTTP error carrying the body, and any other non-success status is an
/// HTTP error too (retryable only if the policy's classifier says so).
#[derive(Debug, Clone)]
pub struct RetryClient {
    client: Client,
    policy: RetryPolicy,
}

impl RetryClient {
    /// Create a client with the given policy and a default reqwest client.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            policy,
        }
    }

    /// Create with a pre-configured reqwest client.
    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Create with [`RetryPolicy::for_api`] defaults.
    pub fn for_api() -> Self {
        Self::new(RetryPolicy::for_api())
    }

    /// The underlying reqwest client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The retry policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET with retries.
    pub async fn get(&self, url: &str) -> RetryResult<Response> {
        self.request(Method::GET, url, Option::<()>::None).await
    }

    /// POST a JSON body with retries. The body is re-serialized on every
    /// attempt, so it must be `Clone`.
    pub async fn post<B: Serialize + Clone + Send + Sync>(
        &self,
        url: &str,
        body: B,
    ) -> RetryResult<Response> {
        self.request(Method::POST, url, Some(body)).await
    }

    async fn request<B: Serialize + Clone + Send + Sync>(
        &self,
        method: Method,
        url: &str,
        body: Option<B>,
    ) -> RetryResult<Response> {
        run(&self.policy, || {
            let client = self.client.clone();
            let method = method.clone();
            let url = url.to_string();
            let body = body.clone();

            async move {
                debug!(method = %method, url = %url, "sending request");

                let mut request = client.request(method, &url);
                if let Some(body) = &body {
                    request = request.json(body);
                }

                let response = request.send().await.map_err(ServiceError::from)?;
                classify_response(response).await
            }
        })
        .await
    }
}

/// Turn an error response into the matching [`ServiceError`].
async fn classify_response(response: Response) -> ServiceResult<Response> {
    let status = response.status().as_u16();
    match status {
        200..=299 => Ok(response),
        429 => Err(ServiceError::RateLimited {
            retry_after: parse_retry_after(&response),
        }),
        500..=599 => {
            let retry_after = parse_retry_after(&response);
            let body = response.text().await.unwrap_or_default();
            Err(ServiceError::Http {
                status,
                body,
                retry_after,
            })
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(ServiceError::http(status, body))
        }
    }
}

/// Parse a Retry-After header given in whole seconds. HTTP-date values are
/// not supported and fall back to the computed backoff.
fn parse_retry_after(response: &Response) -> Option<Duration> {
    let header = response.headers().get("retry-after")?;
    let secs: u64 = header.to_str().ok()?.parse().ok()?;
    Some(Duration::from_secs(secs))
}
