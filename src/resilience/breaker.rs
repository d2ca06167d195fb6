use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::{Result, ScanError};

/// Breaker state machine positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation
    Closed,
    /// Failing fast; the wrapped operation is not invoked
    Open,
    /// Cooldown elapsed; one trial call allowed
    HalfOpen,
}

/// Thresholds and windows for one breaker
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    /// Failures within the monitoring window before the circuit opens
    pub failure_threshold: u32,
    /// Cooldown before a trial call is allowed
    pub recovery_timeout: Duration,
    /// Failure counting window; a full window of inactivity resets the count
    pub monitoring_window: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            monitoring_window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failures: u32,
    window_start: Option<Instant>,
    opened_at: Option<Instant>,
}

/// Per-context circuit breaker.
///
/// An explicit struct owned by the caller, passed by handle per context
/// key, so independent breakers coexist without hidden shared state.
/// CLOSED -> OPEN after `failure_threshold` failures inside the monitoring
/// window; OPEN calls fail immediately without invoking the operation;
/// after `recovery_timeout` one trial runs HALF_OPEN, closing the circuit
/// on success and reopening it on failure.
#[derive(Debug)]
pub struct CircuitBreaker {
    context: String,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new<S: Into<String>>(context: S, config: BreakerConfig) -> Self {
        Self {
            context: context.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: 0,
                window_start: None,
                opened_at: None,
            }),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Current state, with OPEN reported as such until the cooldown
    /// actually admits a trial call
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Run `op` under the breaker. Fails fast with
    /// [`ScanError::CircuitOpen`] while the circuit is open; otherwise the
    /// operation's outcome is recorded and passed through.
    pub fn call<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.before_call()?;
        match op() {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(err)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        // a poisoned breaker lock only means a panicking caller; the state
        // itself stays coherent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn before_call(&self) -> Result<()> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                // a full window of inactivity resets the failure count
                if let Some(start) = inner.window_start {
                    if start.elapsed() >= self.config.monitoring_window {
                        inner.failures = 0;
                        inner.window_start = None;
                    }
                }
                Ok(())
            }
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.recovery_timeout)
                    .unwrap_or(true);
                if cooled_down {
                    debug!(context = %self.context, "circuit half-open, allowing trial call");
                    inner.state = CircuitState::HalfOpen;
                    Ok(())
                } else {
                    Err(ScanError::circuit_open(&self.context))
                }
            }
            // one trial at a time; concurrent callers fail fast
            CircuitState::HalfOpen => Err(ScanError::circuit_open(&self.context)),
        }
    }

    fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            debug!(context = %self.context, "trial call succeeded, circuit closed");
        }
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.window_start = None;
        inner.opened_at = None;
    }

    fn record_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                warn!(context = %self.context, "trial call failed, circuit reopened");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::Closed => {
                let now = Instant::now();
                let in_window = inner
                    .window_start
                    .map(|start| start.elapsed() < self.config.monitoring_window)
                    .unwrap_or(false);
                if in_window {
                    inner.failures += 1;
                } else {
                    inner.failures = 1;
                    inner.window_start = Some(now);
                }
                if inner.failures >= self.config.failure_threshold {
                    warn!(
                        context = %self.context,
                        failures = inner.failures,
                        "failure threshold reached, circuit opened"
                    );
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(now);
                }
            }
            // open circuits do not invoke operations, so no failure to record
            CircuitState::Open => {}
        }
    }
}

/// Registry handing out one breaker per context key.
///
/// The only mutable shared state in the resilience layer; guarded by a
/// single mutex as required for concurrent append.
#[derive(Debug)]
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: Mutex<FxHashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self { config, breakers: Mutex::new(FxHashMap::default()) }
    }

    /// The breaker for `context`, created on first use
    pub fn breaker(&self, context: &str) -> Arc<CircuitBreaker> {
        let mut breakers =
            self.breakers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        breakers
            .entry(context.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(context, self.config)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.breakers.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
