//! Failure classification.

use crate::error::ServiceError;

/// Decides whether a failed attempt may be retried.
///
/// A failure is retryable when any configured signal matches: an HTTP status
/// on the allow-list, a marker substring in the failure's display form, a
/// transport-level failure when those are enabled, or a custom predicate.
/// The custom predicate, when set, replaces the built-in checks entirely.
///
/// The default classifier recognizes only rate limiting, signaled either by
/// status 429 or by "429" appearing in the failure text. The textual match
/// is what lets opaque [`ServiceError::Other`] failures from arbitrary SDKs
/// participate.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// HTTP status codes considered transient.
    statuses: Vec<u16>,
    /// Substrings matched against the failure's display form.
    markers: Vec<String>,
    /// Whether timeouts and connection failures are transient.
    transport_failures: bool,
    /// Custom predicate, replacing the built-in checks.
    custom: Option<fn(&ServiceError) -> bool>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::rate_limit()
    }
}

impl Classifier {
    /// Classifier with no retryable signals at all.
    pub fn none() -> Self {
        Self {
            statuses: Vec::new(),
            markers: Vec::new(),
            transport_failures: false,
            custom: None,
        }
    }

    /// Retry only on rate limiting: status 429, or "429" in the failure
    /// text.
    pub fn rate_limit() -> Self {
        Self::none().on_status([429]).marker("429")
    }

    /// Retry on the usual transient conditions: rate limiting, server
    /// errors (5xx), timeouts and connection failures.
    pub fn transient() -> Self {
        Self::rate_limit()
            .on_status(500..=599)
            .on_transport_failures()
    }

    /// Add status codes to retry on.
    pub fn on_status(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.statuses.extend(codes);
        self
    }

    /// Add a marker substring matched against the failure's display form.
    pub fn marker(mut self, text: impl Into<String>) -> Self {
        self.markers.push(text.into());
        self
    }

    /// Treat timeouts and connection failures as retryable.
    pub fn on_transport_failures(mut self) -> Self {
        self.transport_failures = true;
        self
    }

    /// Replace the built-in checks with a custom predicate.
    pub fn with_custom(mut self, predicate: fn(&ServiceError) -> bool) -> Self {
        self.custom = Some(predicate);
        self
    }

    /// Check whether a failure should be retried.
    pub fn is_retryable(&self, error: &ServiceError) -> bool {
        if let Some(predicate) = self.custom {
            return predicate(error);
        }

        if let Some(status) = error.status() {
            if self.statuses.contains(&status) {
                return true;
            }
        }

        if self.transport_failures
            && matches!(error, ServiceError::Timeout | ServiceError::Connection(_))
        {
            return true;
        }

        if !self.markers.is_empty() {
            let text = error.to_string();
            if self.markers.iter().any(|marker| text.contains(marker)) {
                return true;
            }
        }

        false
    }
}
