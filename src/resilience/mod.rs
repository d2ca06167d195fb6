//! Resilience decorators for unreliable dependencies.
//!
//! Generic over the wrapped operation and independent of scanning logic:
//! anything fallible the pipeline touches (dataset refresh, batch I/O) can
//! be wrapped. The three behaviors compose independently - retry and
//! timeout may be layered on the same call, and a circuit breaker can wrap
//! a whole sequence of retried calls against the same external context.
//!
//! The detection/mapping/dedup/policy path performs no blocking operation
//! and is never wrapped; timeouts apply only to I/O-bound work.

mod breaker;
mod retry;
mod timeout;

pub use breaker::{BreakerConfig, BreakerRegistry, CircuitBreaker, CircuitState};
pub use retry::{retry, Backoff, RetryPolicy};
pub use timeout::with_deadline;
