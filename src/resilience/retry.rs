use std::time::Duration;

use tracing::debug;

use crate::error::{Result, ScanError};

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed,
    /// `delay * 2^(attempt - 1)`
    Exponential,
}

/// Retry budget and pacing for one wrapped operation
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Re-invocations after the initial attempt
    pub max_retries: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, delay: Duration::from_secs(1), backoff: Backoff::Exponential }
    }
}

impl RetryPolicy {
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay, backoff: Backoff::Fixed }
    }

    pub fn exponential(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay, backoff: Backoff::Exponential }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                // cap the shift so a large retry count cannot overflow
                let exponent = retry.saturating_sub(1).min(20);
                self.delay.saturating_mul(1u32 << exponent)
            }
        }
    }
}

/// Invoke `op`, re-invoking up to `policy.max_retries` times while
/// `classify` deems the failure transient.
///
/// The attempt number (1-based) is passed to `op` for logging. A failure
/// classified as permanent surfaces immediately; so does
/// [`ScanError::CircuitOpen`], which never consumes retry budget. Once the
/// budget is exhausted the last failure surfaces as
/// [`ScanError::RetriesExhausted`].
pub fn retry<T, C, F>(policy: &RetryPolicy, classify: C, mut op: F) -> Result<T>
where
    C: Fn(&ScanError) -> bool,
    F: FnMut(u32) -> Result<T>,
{
    let mut attempt = 1u32;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if matches!(err, ScanError::CircuitOpen { .. }) => return Err(err),
            Err(err) if !classify(&err) => return Err(err),
            Err(err) => {
                let retries_done = attempt - 1;
                if retries_done >= policy.max_retries {
                    return Err(ScanError::retries_exhausted(attempt, err));
                }
                let delay = policy.delay_for(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "transient failure, retrying");
                std::thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}
