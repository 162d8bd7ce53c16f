//! Non-critical notification seam.
//!
//! After a successful reconciliation the buyer is told out of band (the
//! delivery transport is an external collaborator). Notification is never
//! part of the transactional outcome: the matcher wraps these calls in
//! their own error boundary and logs-and-continues on failure.

use crate::error::Result;
use crate::types::{Pass, Payment, TicketOrder};

/// Outbound notifications produced by reconciliation.
pub trait MatchNotifier: Send + Sync {
    /// A payment matched an order; the pass (and, when freshly issued, its
    /// raw bearer secret) should reach the buyer.
    ///
    /// The secret appears here exactly once; a delivery failure is
    /// recovered by the buyer rotating the pass, never by re-sending.
    ///
    /// # Errors
    ///
    /// Delivery failures; the caller logs and continues.
    fn payment_matched(
        &self,
        order: &TicketOrder,
        payment: &Payment,
        pass: &Pass,
        secret: Option<&str>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// A payment could not be attributed and was recorded as a donation.
    ///
    /// # Errors
    ///
    /// Delivery failures; the caller logs and continues.
    fn unattributed_payment(
        &self,
        payment: &Payment,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
