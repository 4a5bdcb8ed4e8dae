//! # tradux-retries
//!
//! Exponential backoff with jitter for calling rate-limited remote
//! services.
//!
//! Extracted from the tradux transcription/translation pipeline, where the
//! translation provider answers bursts with HTTP 429. The crate wraps any
//! fallible async operation in a bounded retry loop: transient failures are
//! retried with exponentially growing, jittered delays; everything else
//! surfaces immediately.
//!
//! ## Core Concepts
//!
//! - **[`RetryPolicy`]**: how many retries, how long to wait
//! - **[`Classifier`]**: which failures count as transient
//! - **[`run`] / [`Retry`]**: execute an operation under a policy
//! - **[`RetryError`]**: `NonRetryable` vs. `Exhausted`, kept distinct
//! - **[`RetryClient`]**: HTTP client with built-in retries
//!
//! ## Example
//!
//! ```ignore
//! use tradux_retries::{run, RetryPolicy, ServiceError};
//!
//! let policy = RetryPolicy::new().max_retries(5);
//!
//! let translation = run(&policy, || async {
//!     provider.translate(&text).await.map_err(ServiceError::from)
//! })
//! .await?;
//! ```
//!
//! ## Surfacing progress
//!
//! ```ignore
//! use tradux_retries::{Retry, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! let result = Retry::new(&policy)
//!     .on_wait(|_, delay| {
//!         eprintln!("rate limited, retrying in {:.2}s", delay.as_secs_f64());
//!     })
//!     .run(|| async { call_service().await })
//!     .await;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod classify;
pub mod error;
pub mod executor;
pub mod policy;
pub mod transport;

// Re-exports
pub use classify::Classifier;
pub use error::{RetryError, RetryResult, ServiceError, ServiceResult};
pub use executor::{run, Retry, RetryReport, WaitObserver};
pub use policy::RetryPolicy;
pub use transport::RetryClient;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        run, Classifier, Retry, RetryClient, RetryError, RetryPolicy, RetryResult, ServiceError,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let policy = RetryPolicy::new().max_retries(2);
        assert_eq!(policy.max_retries, 2);
    }

    #[test]
    fn test_default_policy_matches_source_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }
}
