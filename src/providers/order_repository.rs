//! Order and payment repository trait.
//!
//! One repository spans the reconciliation ledger: ticket orders and the
//! payments that settle them. They change together inside `commit_match`,
//! so they live behind one seam.

use crate::error::Result;
use crate::types::{
    BuyerId, MatchId, Money, OrderId, OrderStatus, Payment, PaymentId, TicketOrder, Zone,
};
use chrono::{DateTime, Utc};

/// Outcome of the atomic match commit.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchCommit {
    /// The order transitioned `Pending -> Paid` and the payment row was
    /// inserted, in one commit.
    Committed(TicketOrder),

    /// A payment with this `source_reference` already exists; nothing was
    /// written. Carries the existing row so the caller can replay its
    /// recorded outcome.
    DuplicateSource(Payment),

    /// The order was no longer `Pending` (concurrent match, cancellation,
    /// or expiry); nothing was written.
    NotPending,
}

/// Outcome of an idempotent payment insert.
#[derive(Clone, Debug, PartialEq)]
pub enum PaymentInsert {
    /// The row was inserted.
    Created(Payment),

    /// A payment with this `source_reference` already exists; the existing
    /// row is returned unchanged.
    Existing(Payment),
}

/// Repository for ticket orders and the payment ledger.
///
/// # Atomicity
///
/// **CRITICAL**: `transition_status`, `commit_match`, and `fail_payment`
/// are conditional updates. An implementation must apply the guard and the
/// mutation in one atomic step (`UPDATE ... WHERE status = $n` on a
/// relational store, a single lock in memory); read-then-write is not an
/// implementation.
pub trait OrderRepository: Send + Sync {
    /// Persist a new order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn insert_order(&self, order: &TicketOrder)
    -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fetch an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn get_order(&self, id: OrderId)
    -> impl std::future::Future<Output = Result<Option<TicketOrder>>> + Send;

    /// All orders placed by a buyer, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn list_orders_for_buyer(
        &self,
        buyer: BuyerId,
    ) -> impl std::future::Future<Output = Result<Vec<TicketOrder>>> + Send;

    /// Seats already committed for a fixture zone: the summed quantity of
    /// its `Pending` and `Paid` orders.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn reserved_quantity(
        &self,
        match_id: MatchId,
        zone: &Zone,
    ) -> impl std::future::Future<Output = Result<u32>> + Send;

    /// Conditionally transition an order `from -> to`.
    ///
    /// Returns the updated order, or `None` when the order was missing or
    /// not in `from` (the guard lost).
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> impl std::future::Future<Output = Result<Option<TicketOrder>>> + Send;

    /// Match candidates: `Pending` orders with exactly this total, created
    /// at or after `cutoff`, ordered earliest-created first.
    ///
    /// Lapsed-but-unexpired rows are included; the matcher expires them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn pending_orders_in_window(
        &self,
        amount: Money,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<TicketOrder>>> + Send;

    /// Look up a payment by its idempotency key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn find_payment_by_source_reference(
        &self,
        source_reference: &str,
    ) -> impl std::future::Future<Output = Result<Option<Payment>>> + Send;

    /// The payment that settled an order, if any.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn find_payment_by_order(
        &self,
        order_id: OrderId,
    ) -> impl std::future::Future<Output = Result<Option<Payment>>> + Send;

    /// Atomically settle an order: CAS it `Pending -> Paid` (recording the
    /// payment's `source_reference` on the order) and insert the payment
    /// row, or do neither.
    ///
    /// The `source_reference` uniqueness check happens inside the same
    /// commit, so concurrent reconciliation of one event yields one
    /// [`MatchCommit::Committed`] and otherwise
    /// [`MatchCommit::DuplicateSource`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable;
    /// on error nothing was written.
    fn commit_match(
        &self,
        order_id: OrderId,
        payment: Payment,
    ) -> impl std::future::Future<Output = Result<MatchCommit>> + Send;

    /// Insert an order-less payment (donation, shop settlement), idempotent
    /// on `source_reference`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn insert_payment(
        &self,
        payment: Payment,
    ) -> impl std::future::Future<Output = Result<PaymentInsert>> + Send;

    /// Conditionally mark a payment `Confirmed -> Failed` (the manual
    /// refund trigger). Returns `None` when the guard lost.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn fail_payment(
        &self,
        id: PaymentId,
    ) -> impl std::future::Future<Output = Result<Option<Payment>>> + Send;
}
