//! Error types for retried operations.

use std::time::Duration;
use thiserror::Error;

/// A failure reported by the wrapped operation.
///
/// This is the vocabulary the [`Classifier`](crate::Classifier) inspects to
/// decide whether an attempt may be retried. Anything that does not fit the
/// structured variants can be carried as [`ServiceError::Other`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP error with status code.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
        /// Retry-After header value, if the server sent one.
        retry_after: Option<Duration>,
    },

    /// The service rejected the call for exceeding its rate limit.
    #[error("rate limited (HTTP 429)")]
    RateLimited {
        /// Suggested wait before calling again.
        retry_after: Option<Duration>,
    },

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    /// Create an HTTP error without a Retry-After hint.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    /// Create a rate-limit error.
    pub fn rate_limited(retry_after: Option<Duration>) -> Self {
        Self::RateLimited { retry_after }
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// The server's suggested wait, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Http { retry_after, .. } => *retry_after,
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// The HTTP status, if this failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

/// Terminal outcome of a retry sequence that did not succeed.
///
/// The two cases are deliberately distinct: a caller can tell "gave up after
/// retrying" apart from "failed for an unrelated reason" without parsing
/// messages.
#[derive(Debug, Error)]
pub enum RetryError {
    /// The operation failed with a condition the classifier considers
    /// permanent. No retries were attempted for it.
    #[error("non-retryable failure: {0}")]
    NonRetryable(#[source] ServiceError),

    /// Every attempt failed with a transient condition and the retry budget
    /// ran out.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Total invocations made, including the first.
        attempts: u32,
        /// The transient failure observed on the final attempt.
        #[source]
        last: ServiceError,
    },
}

impl RetryError {
    /// The underlying service failure, whichever way the sequence ended.
    pub fn service_error(&self) -> &ServiceError {
        match self {
            Self::NonRetryable(err) => err,
            Self::Exhausted { last, .. } => last,
        }
    }

    /// Whether the sequence ended by running out of attempts.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Result of one operation attempt.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result of a full retry sequence.
pub type RetryResult<T> = Result<T, RetryError>;
