//! The retry loop.

use crate::error::{RetryError, RetryResult, ServiceResult};
use crate::policy::RetryPolicy;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Accounting for one retry sequence.
#[derive(Debug, Clone, Default)]
pub struct RetryReport {
    /// Invocations made, including the first.
    pub attempts: u32,
    /// Total time spent waiting between attempts.
    pub total_wait: Duration,
    /// Display form of the last failure, if any attempt failed.
    pub last_error: Option<String>,
}

/// Callback invoked before each backoff wait with the attempt number that
/// just failed (1-indexed) and the computed delay.
pub type WaitObserver = dyn Fn(u32, Duration) + Send + Sync;

/// Run an operation under a retry policy.
///
/// The operation is invoked up to `max_retries + 1` times. A success
/// returns immediately. A failure the policy's classifier rejects aborts
/// the sequence with [`RetryError::NonRetryable`]; a transient failure on
/// the final attempt ends it with [`RetryError::Exhausted`]. Attempts are
/// strictly sequential, and each `run` call is an independent sequence.
///
/// # Example
///
/// ```ignore
/// use tradux_retries::{run, RetryPolicy};
///
/// let policy = RetryPolicy::new().max_retries(3);
/// let translation = run(&policy, || async {
///     gemini.generate(&prompt).await
/// }).await?;
/// ```
pub async fn run<F, Fut, T>(policy: &RetryPolicy, operation: F) -> RetryResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ServiceResult<T>>,
{
    Retry::new(policy).run(operation).await
}

/// Builder for a retry sequence, mainly to attach a wait observer.
pub struct Retry<'a> {
    policy: &'a RetryPolicy,
    observer: Option<Box<WaitObserver>>,
}

impl<'a> Retry<'a> {
    /// Create a retry sequence under the given policy.
    pub fn new(policy: &'a RetryPolicy) -> Self {
        Self {
            policy,
            observer: None,
        }
    }

    /// Attach a callback invoked once per backoff wait, e.g. to surface
    /// "retrying in 3.42s" to a user.
    pub fn on_wait<F>(mut self, observer: F) -> Self
    where
        F: Fn(u32, Duration) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Run the operation.
    pub async fn run<F, Fut, T>(self, operation: F) -> RetryResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        self.run_with_report(operation).await.0
    }

    /// Run the operation and return the sequence accounting alongside the
    /// result.
    pub async fn run_with_report<F, Fut, T>(self, operation: F) -> (RetryResult<T>, RetryReport)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        let policy = self.policy;
        let mut report = RetryReport::default();

        loop {
            report.attempts += 1;

            debug!(
                attempt = report.attempts,
                max_attempts = policy.max_retries + 1,
                "calling operation"
            );

            let error = match operation().await {
                Ok(value) => return (Ok(value), report),
                Err(error) => error,
            };

            report.last_error = Some(error.to_string());

            if !policy.classify.is_retryable(&error) {
                warn!(attempt = report.attempts, error = %error, "failure is not retryable");
                return (Err(RetryError::NonRetryable(error)), report);
            }

            if report.attempts > policy.max_retries {
                warn!(
                    attempts = report.attempts,
                    error = %error,
                    "retry budget exhausted"
                );
                return (
                    Err(RetryError::Exhausted {
                        attempts: report.attempts,
                        last: error,
                    }),
                    report,
                );
            }

            let mut wait = policy.delay_before_retry(report.attempts - 1);
            if policy.honor_retry_after {
                if let Some(hint) = error.retry_after() {
                    wait = wait.max(hint);
                }
            }

            if let Some(observer) = &self.observer {
                observer(report.attempts, wait);
            }

            warn!(
                attempt = report.attempts,
                wait_ms = wait.as_millis() as u64,
                error = %error,
                "transient failure, backing off"
            );

            report.total_wait += wait;
            sleep(wait).await;
        }
    }
}
