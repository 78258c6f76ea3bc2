//! Explicit retry policy for generation-facing callers.
//!
//! The embedding application retries its model calls with a fixed backoff.
//! Rather than hand-written loops per call site, callers consume a
//! `RetryPolicy` value through the generic [`run_with_retry`] combinator.
//! Sleeping is injected so the combinator stays testable without a clock.

use std::time::Duration;

/// Retry policy value: attempt count plus backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts (not retries); must be at least 1.
    pub max_attempts: usize,
    /// Delay applied between attempts.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff before retry number `attempt` (0-based attempt that failed).
    ///
    /// The schedule is fixed: every retry waits `base_delay`.
    pub fn backoff(&self, _attempt: usize) -> Duration {
        self.base_delay
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping `policy.backoff`
/// between attempts via the injected `sleep`.
///
/// `op` receives the 0-based attempt index. The first `Ok` is returned;
/// otherwise the error from the final attempt.
pub fn run_with_retry<T, E>(
    policy: &RetryPolicy,
    mut sleep: impl FnMut(Duration),
    mut op: impl FnMut(usize) -> Result<T, E>,
) -> Result<T, E> {
    let attempts = policy.max_attempts.max(1);
    let mut last_err = None;
    for attempt in 0..attempts {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_err = Some(err);
                if attempt + 1 < attempts {
                    sleep(policy.backoff(attempt));
                }
            }
        }
    }
    // attempts >= 1, so at least one op call ran and set last_err
    Err(last_err.unwrap())
}

/// Convenience wrapper that sleeps on the current thread.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_with_retry_blocking<T, E>(
    policy: &RetryPolicy,
    op: impl FnMut(usize) -> Result<T, E>,
) -> Result<T, E> {
    run_with_retry(policy, std::thread::sleep, op)
}
