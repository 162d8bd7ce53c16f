//! Ticket order lifecycle.
//!
//! Checkout creates a pending order with a bounded payment window and the
//! USSD string the buyer dials; reconciliation (not this module) moves it
//! to `Paid`. Expiry is lazy: reads report it, and the transition persists
//! on the next mutation path. There is no background sweeper.

use crate::config::OrderConfig;
use crate::error::{EngineError, Result};
use crate::providers::{OrderRepository, PassRepository};
use crate::types::{
    AuditedChange, BuyerId, MatchId, OrderId, OrderSnapshot, OrderStatus, Refund, TicketOrder,
};
use crate::ussd;
use chrono::Utc;
use std::sync::Arc;

/// Owns ticket orders: checkout, cancellation, lazy expiry, snapshots,
/// and the manual admin triggers.
pub struct TicketOrderService<O, P> {
    orders: Arc<O>,
    passes: Arc<P>,
    config: OrderConfig,
}

impl<O, P> TicketOrderService<O, P>
where
    O: OrderRepository,
    P: PassRepository,
{
    /// Create the service over the given repositories.
    pub const fn new(orders: Arc<O>, passes: Arc<P>, config: OrderConfig) -> Self {
        Self {
            orders,
            passes,
            config,
        }
    }

    /// Create a pending order and the USSD payment string for it.
    ///
    /// Validates the zone and its remaining capacity, computes the total
    /// from the zone price table, and bounds the order's lifetime with the
    /// configured payment window.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidRequest`] for an unknown zone or a bad
    /// quantity, [`EngineError::SoldOut`] when capacity is exhausted, or a
    /// retryable store error.
    pub async fn create_pending_order(
        &self,
        match_id: MatchId,
        zone_code: &str,
        quantity: u32,
        buyer: Option<BuyerId>,
    ) -> Result<TicketOrder> {
        if quantity == 0 || quantity > self.config.max_quantity {
            return Err(EngineError::InvalidRequest {
                reason: format!("quantity must be 1..={}", self.config.max_quantity),
            });
        }

        let zone_def = self
            .config
            .zone(zone_code)
            .ok_or_else(|| EngineError::InvalidRequest {
                reason: format!("unknown zone {zone_code}"),
            })?;

        let reserved = self
            .orders
            .reserved_quantity(match_id, &zone_def.zone)
            .await?;
        if reserved.saturating_add(quantity) > zone_def.capacity {
            return Err(EngineError::SoldOut {
                zone: zone_code.to_string(),
            });
        }

        let total = zone_def.price.times(quantity);
        let now = Utc::now();
        let order = TicketOrder {
            id: OrderId::new(),
            buyer_id: buyer,
            match_id,
            zone: zone_def.zone.clone(),
            quantity,
            total,
            status: OrderStatus::Pending,
            payment_reference: None,
            ussd_code: ussd::dial_string(&self.config.ussd_prefix, &self.config.shortcode, total),
            created_at: now,
            expires_at: now + self.config.payment_window,
        };

        self.orders.insert_order(&order).await?;
        tracing::info!(
            order_id = %order.id,
            match_id = %match_id,
            zone = %order.zone,
            total = %total,
            "pending order created"
        );
        Ok(order)
    }

    /// Cancel a pending order on behalf of its buyer.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] for an unknown order,
    /// [`EngineError::InvalidRequest`] when the requester does not own it,
    /// [`EngineError::NotCancellable`] when it is no longer pending
    /// (including lapsed orders, whose expiry is persisted here), or a
    /// retryable store error.
    pub async fn cancel_pending_order(
        &self,
        order_id: OrderId,
        requester: Option<BuyerId>,
    ) -> Result<TicketOrder> {
        let order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        if let (Some(requester), Some(owner)) = (requester, order.buyer_id) {
            if requester != owner {
                return Err(EngineError::InvalidRequest {
                    reason: "requester does not own this order".into(),
                });
            }
        }

        let now = Utc::now();
        if order.is_lapsed(now) {
            // Mutation path: persist the lazy expiry instead of cancelling.
            let _ = self
                .orders
                .transition_status(order_id, OrderStatus::Pending, OrderStatus::Expired)
                .await?;
            return Err(EngineError::NotCancellable);
        }

        match self
            .orders
            .transition_status(order_id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await?
        {
            Some(cancelled) => {
                tracing::info!(order_id = %order_id, "order cancelled");
                Ok(cancelled)
            }
            None => Err(EngineError::NotCancellable),
        }
    }

    /// Read-only projection of one order, lazy expiry applied.
    ///
    /// # Errors
    ///
    /// Retryable store errors only.
    pub async fn get_order_snapshot(&self, order_id: OrderId) -> Result<Option<OrderSnapshot>> {
        let now = Utc::now();
        Ok(self
            .orders
            .get_order(order_id)
            .await?
            .map(|order| OrderSnapshot::project(&order, now)))
    }

    /// All of a buyer's orders, newest first, lazy expiry applied.
    ///
    /// # Errors
    ///
    /// Retryable store errors only.
    pub async fn list_orders_for_buyer(&self, buyer: BuyerId) -> Result<Vec<OrderSnapshot>> {
        let now = Utc::now();
        Ok(self
            .orders
            .list_orders_for_buyer(buyer)
            .await?
            .iter()
            .map(|order| OrderSnapshot::project(order, now))
            .collect())
    }

    /// Admin cancellation, returning before/after snapshots for the audit
    /// collaborator.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`], [`EngineError::NotCancellable`], or a
    /// retryable store error.
    pub async fn admin_cancel(&self, order_id: OrderId) -> Result<AuditedChange<OrderSnapshot>> {
        let now = Utc::now();
        let before = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        let after = self
            .orders
            .transition_status(order_id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await?
            .ok_or(EngineError::NotCancellable)?;

        tracing::info!(order_id = %order_id, "order cancelled by admin");
        Ok(AuditedChange {
            before: OrderSnapshot::project(&before, now),
            after: OrderSnapshot::project(&after, now),
        })
    }

    /// Manual refund trigger: mark the order's confirmed payment `Failed`
    /// and revoke its live pass. The order itself stays `Paid`; money
    /// movement and audit logging are external collaborators.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] for an unknown order,
    /// [`EngineError::NotEligible`] when there is no confirmed payment, or
    /// a retryable store error.
    pub async fn admin_refund_trigger(&self, order_id: OrderId) -> Result<Refund> {
        let _ = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        let before = self
            .orders
            .find_payment_by_order(order_id)
            .await?
            .ok_or_else(|| EngineError::NotEligible {
                reason: "order has no payment".into(),
            })?;

        let after = self.orders.fail_payment(before.id).await?.ok_or_else(|| {
            EngineError::NotEligible {
                reason: "payment is not confirmed".into(),
            }
        })?;

        let revoked_pass = match self.passes.find_current_by_order(order_id).await? {
            Some(pass) => self.passes.revoke(pass.id, Utc::now()).await?,
            None => None,
        };

        tracing::info!(
            order_id = %order_id,
            payment_id = %after.id,
            pass_revoked = revoked_pass.is_some(),
            "refund triggered by admin"
        );
        Ok(Refund {
            payment: AuditedChange { before, after },
            revoked_pass,
        })
    }
}
