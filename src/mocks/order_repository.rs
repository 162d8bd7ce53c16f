//! In-memory order and payment repository for testing.

use crate::error::{EngineError, Result};
use crate::providers::{MatchCommit, OrderRepository, PaymentInsert};
use crate::types::{
    BuyerId, MatchId, Money, OrderId, OrderStatus, Payment, PaymentId, TicketOrder, Zone,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, TicketOrder>,
    payments: HashMap<PaymentId, Payment>,
}

impl Inner {
    fn payment_by_source(&self, source_reference: &str) -> Option<Payment> {
        self.payments
            .values()
            .find(|p| p.source_reference == source_reference)
            .cloned()
    }
}

/// In-memory [`OrderRepository`].
///
/// One mutex over orders and payments together, so `commit_match` is
/// genuinely atomic the way a relational transaction would be.
#[derive(Clone, Default)]
pub struct MockOrderRepository {
    inner: Arc<Mutex<Inner>>,
    unavailable: Arc<AtomicBool>,
}

impl MockOrderRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with a retryable store error, for testing
    /// the redelivery path.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of payment rows currently held.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn payment_count(&self) -> usize {
        self.inner.lock().unwrap().payments.len()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EngineError::Store("store unavailable".into()));
        }
        self.inner
            .lock()
            .map_err(|_| EngineError::Store("mutex poisoned".into()))
    }
}

impl OrderRepository for MockOrderRepository {
    async fn insert_order(&self, order: &TicketOrder) -> Result<()> {
        let mut inner = self.lock()?;
        inner.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<TicketOrder>> {
        let inner = self.lock()?;
        Ok(inner.orders.get(&id).cloned())
    }

    async fn list_orders_for_buyer(&self, buyer: BuyerId) -> Result<Vec<TicketOrder>> {
        let inner = self.lock()?;
        let mut orders: Vec<TicketOrder> = inner
            .orders
            .values()
            .filter(|o| o.buyer_id == Some(buyer))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn reserved_quantity(&self, match_id: MatchId, zone: &Zone) -> Result<u32> {
        let inner = self.lock()?;
        Ok(inner
            .orders
            .values()
            .filter(|o| {
                o.match_id == match_id
                    && o.zone == *zone
                    && matches!(o.status, OrderStatus::Pending | OrderStatus::Paid)
            })
            .map(|o| o.quantity)
            .sum())
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<TicketOrder>> {
        let mut inner = self.lock()?;
        match inner.orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn pending_orders_in_window(
        &self,
        amount: Money,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<TicketOrder>> {
        let inner = self.lock()?;
        let mut candidates: Vec<TicketOrder> = inner
            .orders
            .values()
            .filter(|o| {
                o.status == OrderStatus::Pending && o.total == amount && o.created_at >= cutoff
            })
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(candidates)
    }

    async fn find_payment_by_source_reference(
        &self,
        source_reference: &str,
    ) -> Result<Option<Payment>> {
        let inner = self.lock()?;
        Ok(inner.payment_by_source(source_reference))
    }

    async fn find_payment_by_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        let inner = self.lock()?;
        Ok(inner
            .payments
            .values()
            .find(|p| p.order_id == Some(order_id))
            .cloned())
    }

    async fn commit_match(&self, order_id: OrderId, payment: Payment) -> Result<MatchCommit> {
        let mut inner = self.lock()?;

        // Uniqueness first: a concurrent commit of the same event must
        // surface as the idempotent replay, not as a second row.
        if let Some(existing) = inner.payment_by_source(&payment.source_reference) {
            return Ok(MatchCommit::DuplicateSource(existing));
        }

        match inner.orders.get_mut(&order_id) {
            Some(order) if order.status == OrderStatus::Pending => {
                order.status = OrderStatus::Paid;
                order.payment_reference = Some(payment.source_reference.clone());
                let updated = order.clone();
                inner.payments.insert(payment.id, payment);
                Ok(MatchCommit::Committed(updated))
            }
            _ => Ok(MatchCommit::NotPending),
        }
    }

    async fn insert_payment(&self, payment: Payment) -> Result<PaymentInsert> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner.payment_by_source(&payment.source_reference) {
            return Ok(PaymentInsert::Existing(existing));
        }
        inner.payments.insert(payment.id, payment.clone());
        Ok(PaymentInsert::Created(payment))
    }

    async fn fail_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let mut inner = self.lock()?;
        match inner.payments.get_mut(&id) {
            Some(payment) if payment.status == crate::types::PaymentStatus::Confirmed => {
                payment.status = crate::types::PaymentStatus::Failed;
                Ok(Some(payment.clone()))
            }
            _ => Ok(None),
        }
    }
}
