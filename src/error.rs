//! Error types for the matchday core.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for matchday core operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error taxonomy for reconciliation, pass lifecycle, and the resilience
/// primitives.
///
/// Three families, distinguished so callers can route them:
/// retryable infrastructure failures (re-deliver later), business-rule
/// rejections (expected control flow), and fatal input errors (rejected
/// before any store access).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    // ═══════════════════════════════════════════════════════════
    // Retryable infrastructure
    // ═══════════════════════════════════════════════════════════

    /// The backing store is unavailable or failed mid-operation.
    #[error("store unavailable: {0}")]
    Store(String),

    /// A protected upstream dependency is short-circuited.
    #[error("circuit open for {dependency}, retry after {retry_after:?}")]
    BreakerOpen {
        /// Dependency the breaker protects.
        dependency: String,
        /// Time until the breaker next admits a trial call.
        retry_after: Duration,
    },

    /// A protected call exceeded its timeout.
    #[error("call to {dependency} timed out after {timeout:?}")]
    Timeout {
        /// Dependency that was called.
        dependency: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    // ═══════════════════════════════════════════════════════════
    // Business-rule rejections
    // ═══════════════════════════════════════════════════════════

    /// The order is not in a cancellable state.
    #[error("order is not cancellable")]
    NotCancellable,

    /// The order is not eligible for the requested operation.
    #[error("order not eligible: {reason}")]
    NotEligible {
        /// Why the order does not qualify.
        reason: String,
    },

    /// The requested zone has no remaining capacity.
    #[error("zone {zone} is sold out")]
    SoldOut {
        /// Zone that was requested.
        zone: String,
    },

    /// A pending transfer already exists for this pass.
    #[error("a transfer is already pending for this pass")]
    TransferAlreadyPending,

    /// The pass is not in a transferable state.
    #[error("pass is not transferable")]
    NotTransferable,

    /// The claim token is invalid, expired, or already claimed.
    #[error("transfer claim is invalid or already claimed")]
    TransferNotClaimable,

    /// The pass is not in a state that accepts this mutation.
    #[error("pass is not active")]
    PassNotActive,

    /// Rate limit exceeded for the key.
    #[error("too many attempts, retry after {retry_after:?}")]
    TooManyAttempts {
        /// Remaining time in the current window.
        retry_after: Duration,
    },

    // ═══════════════════════════════════════════════════════════
    // Fatal input errors
    // ═══════════════════════════════════════════════════════════

    /// A parsed SMS event failed boundary validation.
    #[error("invalid payment event: {reason}")]
    InvalidEvent {
        /// What was malformed.
        reason: String,
    },

    /// A request failed validation before any store access.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// What was malformed.
        reason: String,
    },

    /// The referenced entity does not exist.
    #[error("resource not found")]
    NotFound,
}

impl EngineError {
    /// `true` if the caller should re-deliver the same input later.
    ///
    /// The SMS ingestion pipeline keys its redelivery decision on this:
    /// retryable errors leave no partial state behind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::BreakerOpen { .. } | Self::Timeout { .. }
        )
    }

    /// `true` if this is an expected business-rule rejection rather than a
    /// failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotCancellable
                | Self::NotEligible { .. }
                | Self::SoldOut { .. }
                | Self::TransferAlreadyPending
                | Self::NotTransferable
                | Self::TransferNotClaimable
                | Self::PassNotActive
                | Self::TooManyAttempts { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(EngineError::Store("down".into()).is_retryable());
        assert!(
            EngineError::Timeout {
                dependency: "notifier".into(),
                timeout: Duration::from_secs(2),
            }
            .is_retryable()
        );
        assert!(!EngineError::NotCancellable.is_retryable());
        assert!(!EngineError::NotFound.is_retryable());
    }

    #[test]
    fn rejection_classification() {
        assert!(EngineError::TransferAlreadyPending.is_rejection());
        assert!(
            EngineError::TooManyAttempts {
                retry_after: Duration::from_secs(30),
            }
            .is_rejection()
        );
        assert!(!EngineError::Store("down".into()).is_rejection());
        assert!(
            !EngineError::InvalidEvent {
                reason: "empty source reference".into(),
            }
            .is_rejection()
        );
    }
}
