//! Rate limiter trait.
//!
//! Fixed-window limiting keyed by an identifier (phone number, IP), used to
//! bound OTP and login attempts upstream of this core. The window
//! parameters live on the limiter instance; callers just consume.

use crate::error::{EngineError, Result};
use std::time::Duration;

/// The limiter's answer for one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the attempt is allowed.
    pub allowed: bool,

    /// Attempts left in the current window after this one.
    pub remaining: u32,

    /// Remaining time in the current window, set when the attempt was
    /// denied.
    pub retry_after: Option<Duration>,
}

impl RateDecision {
    /// Turn a denial into [`EngineError::TooManyAttempts`], passing an
    /// allowance through.
    ///
    /// # Errors
    ///
    /// Returns `TooManyAttempts` when the decision was a denial.
    pub fn require(self) -> Result<Self> {
        if self.allowed {
            Ok(self)
        } else {
            Err(EngineError::TooManyAttempts {
                retry_after: self.retry_after.unwrap_or(Duration::ZERO),
            })
        }
    }
}

/// Fixed-window rate limiter.
///
/// # Implementation
///
/// Counter plus window start per key, held in a fast shared store with an
/// in-process fallback when that store is unavailable
/// (degraded-but-available beats fail-closed here). `consume` must count
/// atomically: two concurrent attempts may not both observe the
/// pre-increment count.
pub trait RateLimiter: Send + Sync {
    /// Record one attempt for `key` and decide whether it is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] only when no counting backend
    /// at all is available.
    fn consume(&self, key: &str)
    -> impl std::future::Future<Output = Result<RateDecision>> + Send;

    /// Forget all attempts for `key` (successful login, admin override,
    /// tests).
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the backend rejects the
    /// delete.
    fn reset(&self, key: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Attempts recorded for `key` in the current window.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the backend rejects the
    /// read.
    fn attempts(&self, key: &str) -> impl std::future::Future<Output = Result<u32>> + Send;
}
