//! Retries for idempotent engine reads.
//!
//! Run status checks and message listings are safe to repeat, so transient
//! engine failures (network errors, 429, 5xx) are retried a few times before
//! the poll loop sees them. Writes never go through here.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::util::backoff::BackoffSchedule;

/// How often and how patiently a failed read is repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Zero behaves like one.
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub initial_backoff: Duration,
    /// Ceiling for any single wait.
    pub max_backoff: Duration,
    /// Growth factor between consecutive retries.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait sequence between attempts, shaped like the poll schedule with a
    /// single fast step.
    fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule::builder()
            .initial_wait(self.initial_backoff)
            .fast_attempts(1)
            .multiplier(self.multiplier)
            .max_wait(self.max_backoff)
            .max_attempts(self.max_attempts.max(1))
            .build()
    }

    /// Perform `read` against `endpoint`, repeating it while the failure is
    /// retryable and attempts remain.
    pub async fn execute<F, Fut, T>(&self, endpoint: &str, mut read: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let schedule = self.schedule();
        let mut attempt = 0u32;
        loop {
            let err = match read().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            attempt += 1;
            if !err.is_retryable() || !schedule.has_attempts_remaining(attempt) {
                return Err(err);
            }

            let wait = jittered(schedule.next_wait(attempt - 1));
            warn!(
                endpoint,
                attempt,
                max_attempts = schedule.max_attempts,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "engine read failed; retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

/// Spread `wait` over 75%..125% so concurrent turns do not retry in step.
fn jittered(wait: Duration) -> Duration {
    let factor = 0.75 + (Uuid::new_v4().as_u128() % 10_000) as f64 / 20_000.0;
    wait.mul_f64(factor)
}
