//! Circuit breaker.
//!
//! Protects callers from a failing or slow upstream dependency.
//!
//! ## States
//!
//! ```text
//! Closed (normal) ──[consecutive failures >= threshold]──> Open (failing)
//!                                                                │
//!                                                                │ [reset timeout elapsed]
//!                                                                ▼
//!                                                         HalfOpen (testing)
//!                                                                │
//!                      ┌─────────────────────────────────────────┴─────────┐
//!                      │                                                   │
//!                [any success]                                      [any failure]
//!                      │                                                   │
//!                      ▼                                                   ▼
//!                   Closed                                               Open
//! ```
//!
//! Calls go through [`CircuitBreaker::call`], which imposes its own timeout
//! independent of any caller timeout; a timeout counts as a failure
//! distinct from an application error, so slow dependencies trip the
//! breaker too.

use std::time::{Duration, Instant};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation; calls pass through.
    Closed,
    /// Failing; calls are short-circuited.
    Open,
    /// Testing recovery; a bounded number of trial calls pass through.
    HalfOpen,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// Trial calls admitted while `HalfOpen`.
    pub trial_calls: u32,
    /// How long to stay `Open` before admitting trials.
    pub reset_timeout: Duration,
    /// Per-call timeout imposed by [`CircuitBreaker::call`].
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            trial_calls: 1,
            reset_timeout: Duration::from_secs(30),
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// Typed short-circuit error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit breaker '{dependency}' is open")]
pub struct BreakerOpen {
    /// Dependency the breaker protects.
    pub dependency: String,
    /// Time until the breaker next admits a trial call.
    pub retry_after: Duration,
}

/// Error returned by [`CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The circuit is open; the wrapped action was not invoked.
    #[error(transparent)]
    Open(BreakerOpen),

    /// The wrapped action exceeded the breaker's call timeout.
    #[error("call to '{dependency}' timed out after {timeout:?}")]
    Timeout {
        /// Dependency that was called.
        dependency: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The wrapped action itself failed.
    #[error(transparent)]
    Inner(E),
}

impl From<BreakerError<crate::EngineError>> for crate::EngineError {
    fn from(err: BreakerError<crate::EngineError>) -> Self {
        match err {
            BreakerError::Open(open) => Self::BreakerOpen {
                dependency: open.dependency,
                retry_after: open.retry_after,
            },
            BreakerError::Timeout { dependency, timeout } => Self::Timeout { dependency, timeout },
            BreakerError::Inner(inner) => inner,
        }
    }
}

struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    trials_admitted: u32,
    opened_at: Option<Instant>,
}

/// Circuit breaker for one upstream dependency.
///
/// Per-dependency, per-process state, constructed once and passed by
/// reference to whatever calls the dependency; no ambient singletons.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Arc<RwLock<BreakerState>>,
}

impl CircuitBreaker {
    /// Create a breaker named after the dependency it protects.
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Arc::new(RwLock::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                trials_admitted: 0,
                opened_at: None,
            })),
        }
    }

    /// Dependency name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether a call may proceed, transitioning `Open -> HalfOpen`
    /// when the reset timeout has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`BreakerOpen`] when the circuit is open or the half-open
    /// trial budget is exhausted.
    pub async fn allow_request(&self) -> Result<(), BreakerOpen> {
        let mut state = self.state.write().await;

        match state.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let elapsed = state.opened_at.map_or(Duration::ZERO, |t| t.elapsed());
                if elapsed >= self.config.reset_timeout {
                    info!(breaker = %self.name, "transitioning: Open -> HalfOpen");
                    state.state = CircuitState::HalfOpen;
                    state.trials_admitted = 1;
                    Ok(())
                } else {
                    Err(BreakerOpen {
                        dependency: self.name.clone(),
                        retry_after: self.config.reset_timeout - elapsed,
                    })
                }
            }
            CircuitState::HalfOpen => {
                if state.trials_admitted < self.config.trial_calls {
                    state.trials_admitted += 1;
                    Ok(())
                } else {
                    Err(BreakerOpen {
                        dependency: self.name.clone(),
                        retry_after: Duration::ZERO,
                    })
                }
            }
        }
    }

    /// Record a successful call.
    pub async fn record_success(&self) {
        let mut state = self.state.write().await;

        match state.state {
            CircuitState::Closed => {
                state.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                info!(breaker = %self.name, "transitioning: HalfOpen -> Closed (recovered)");
                state.state = CircuitState::Closed;
                state.consecutive_failures = 0;
                state.trials_admitted = 0;
                state.opened_at = None;
            }
            CircuitState::Open => {
                // A late completion from before the trip; the reset timeout
                // still governs recovery.
            }
        }
    }

    /// Record a failed or timed-out call.
    pub async fn record_failure(&self) {
        let mut state = self.state.write().await;

        match state.state {
            CircuitState::Closed => {
                state.consecutive_failures += 1;
                if state.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        breaker = %self.name,
                        failures = state.consecutive_failures,
                        "transitioning: Closed -> Open"
                    );
                    state.state = CircuitState::Open;
                    state.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                warn!(breaker = %self.name, "transitioning: HalfOpen -> Open (trial failed)");
                state.state = CircuitState::Open;
                state.trials_admitted = 0;
                state.opened_at = Some(Instant::now());
            }
            CircuitState::Open => {
                state.opened_at = Some(Instant::now());
            }
        }
    }

    /// Current state.
    pub async fn state(&self) -> CircuitState {
        self.state.read().await.state
    }

    /// Consecutive failures recorded while closed.
    pub async fn failure_count(&self) -> u32 {
        self.state.read().await.consecutive_failures
    }

    /// Run a call through the breaker.
    ///
    /// Checks admission, imposes the configured call timeout, and records
    /// the outcome. When the circuit is open the wrapped future is never
    /// polled.
    ///
    /// # Errors
    ///
    /// [`BreakerError::Open`] without invoking the action,
    /// [`BreakerError::Timeout`] when the call exceeded the breaker's
    /// timeout, or [`BreakerError::Inner`] carrying the action's own error.
    pub async fn call<F, T, E>(&self, fut: F) -> Result<T, BreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        self.allow_request().await.map_err(BreakerError::Open)?;

        match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(Ok(value)) => {
                self.record_success().await;
                Ok(value)
            }
            Ok(Err(err)) => {
                self.record_failure().await;
                Err(BreakerError::Inner(err))
            }
            Err(_) => {
                self.record_failure().await;
                Err(BreakerError::Timeout {
                    dependency: self.name.clone(),
                    timeout: self.config.call_timeout,
                })
            }
        }
    }
}
