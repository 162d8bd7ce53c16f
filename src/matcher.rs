//! Payment reconciliation.
//!
//! Consumes parsed mobile-money SMS events and matches them against
//! pending ticket orders. There is no webhook and no card-style callback:
//! the SMS pipeline is the only confirmation channel, it delivers
//! at-least-once, and an unmatched payment is a normal outcome (an
//! unattributed donation), never an error.

use crate::config::{MatcherConfig, SelectionPolicy};
use crate::error::{EngineError, Result};
use crate::passes::PassIssuer;
use crate::providers::{
    MatchCommit, MatchNotifier, OrderRepository, PassRepository, PaymentInsert,
};
use crate::resilience::CircuitBreaker;
use crate::types::{
    IssuedPass, OrderId, OrderStatus, ParsedSmsEvent, Payment, PaymentId, PaymentKind,
    PaymentStatus, Reconciliation, TicketOrder,
};
use crate::utils::normalize_msisdn;
use chrono::Utc;
use std::sync::Arc;

/// Reconciles parsed SMS events against pending ticket orders.
///
/// On a match, the order transition, the payment insert, and the pass
/// issuance trigger behave transactionally: order and payment commit in one
/// conditional store operation, and issuance is re-entrant so a crash
/// between commit and issuance is repaired on redelivery of the same
/// `source_reference`.
pub struct PaymentMatcher<O, P, N> {
    orders: Arc<O>,
    issuer: PassIssuer<O, P>,
    notifier: Arc<N>,
    notifier_breaker: CircuitBreaker,
    config: MatcherConfig,
}

impl<O, P, N> PaymentMatcher<O, P, N>
where
    O: OrderRepository,
    P: PassRepository,
    N: MatchNotifier,
{
    /// Create a matcher over the given repositories.
    ///
    /// The breaker guards the notifier, the one outbound dependency on
    /// this path; notification is non-critical and never affects the
    /// reconciliation outcome.
    pub fn new(
        orders: Arc<O>,
        issuer: PassIssuer<O, P>,
        notifier: Arc<N>,
        notifier_breaker: CircuitBreaker,
        config: MatcherConfig,
    ) -> Self {
        Self {
            orders,
            issuer,
            notifier,
            notifier_breaker,
            config,
        }
    }

    /// Reconcile one parsed SMS event.
    ///
    /// Idempotent on `event.source_reference`: redelivery returns the
    /// recorded outcome with `reused: true` and repairs a missing pass if
    /// the earlier attempt died between payment commit and issuance.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidEvent`] for malformed events (rejected before
    /// any store access), or a retryable store error — in which case
    /// nothing was committed and the pipeline must redeliver the same
    /// event later.
    pub async fn reconcile(&self, event: &ParsedSmsEvent) -> Result<Reconciliation> {
        Self::validate(event)?;

        // Idempotency gate: at-least-once delivery means this lookup, not
        // the matching logic, decides what a redelivered event does.
        if let Some(existing) = self
            .orders
            .find_payment_by_source_reference(&event.source_reference)
            .await?
        {
            return self.replay(existing).await;
        }

        let cutoff = event.received_at - self.config.window;
        let candidates = self
            .orders
            .pending_orders_in_window(event.amount, cutoff)
            .await?;
        let ordered = self.apply_selection(candidates);

        let now = Utc::now();
        for order in ordered {
            // Lapsed orders must leave `Pending` before they can be
            // considered again; persist the transition on this mutation
            // path rather than from a sweeper.
            if order.is_lapsed(now) {
                let expired = self
                    .orders
                    .transition_status(order.id, OrderStatus::Pending, OrderStatus::Expired)
                    .await?;
                if expired.is_some() {
                    tracing::info!(order_id = %order.id, "lapsed order expired during matching");
                }
                continue;
            }

            let payment = Self::payment_for(event, PaymentKind::Ticket, Some(order.id));
            let payment_id = payment.id;
            match self.orders.commit_match(order.id, payment.clone()).await? {
                MatchCommit::Committed(paid_order) => {
                    let issued = self.issuer.issue_for(paid_order.id).await?;
                    self.notify_matched(&paid_order, &payment, &issued).await;
                    tracing::info!(
                        order_id = %paid_order.id,
                        payment_id = %payment_id,
                        amount = %event.amount,
                        "payment reconciled"
                    );
                    return Ok(Reconciliation {
                        kind: PaymentKind::Ticket,
                        order_id: Some(paid_order.id),
                        payment_id,
                        reused: false,
                    });
                }
                // A concurrent reconciliation of this very event beat us to
                // the commit.
                MatchCommit::DuplicateSource(existing) => return self.replay(existing).await,
                // The order left `Pending` under us; try the next
                // candidate.
                MatchCommit::NotPending => {}
            }
        }

        self.record_unattributed(event).await
    }

    /// Boundary validation; malformed events never reach the store.
    fn validate(event: &ParsedSmsEvent) -> Result<()> {
        if event.source_reference.trim().is_empty() {
            return Err(EngineError::InvalidEvent {
                reason: "empty source reference".into(),
            });
        }
        if event.reference.trim().is_empty() {
            return Err(EngineError::InvalidEvent {
                reason: "empty provider reference".into(),
            });
        }
        if !event.amount.is_positive() {
            return Err(EngineError::InvalidEvent {
                reason: "amount must be positive".into(),
            });
        }
        Ok(())
    }

    /// Order the candidates according to the configured policy.
    fn apply_selection(&self, mut candidates: Vec<TicketOrder>) -> Vec<TicketOrder> {
        match self.config.selection {
            SelectionPolicy::EarliestCreated => {
                candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            }
        }
        candidates
    }

    /// Return the recorded outcome for an already-reconciled event,
    /// repairing a missing pass on the way.
    async fn replay(&self, existing: Payment) -> Result<Reconciliation> {
        // Only still-confirmed ticket payments are entitled to a pass; a
        // refunded payment must not get one re-minted by a late replay.
        if existing.kind == PaymentKind::Ticket && existing.status == PaymentStatus::Confirmed {
            if let Some(order_id) = existing.order_id {
                self.repair_missing_pass(order_id, &existing).await?;
            }
        }

        tracing::debug!(
            source_reference = %existing.source_reference,
            payment_id = %existing.id,
            "event already reconciled, returning recorded outcome"
        );
        Ok(Reconciliation {
            kind: existing.kind,
            order_id: existing.order_id,
            payment_id: existing.id,
            reused: true,
        })
    }

    /// Issuance is "ensure a pass exists", so a redelivery after a crash
    /// between payment commit and issuance completes the job.
    async fn repair_missing_pass(&self, order_id: OrderId, payment: &Payment) -> Result<()> {
        let issued = self.issuer.issue_for(order_id).await?;
        if issued.secret.is_some() {
            tracing::warn!(
                order_id = %order_id,
                "pass was missing for a paid order; issued on replay"
            );
            if let Some(order) = self.orders.get_order(order_id).await? {
                self.notify_matched(&order, payment, &issued).await;
            }
        }
        Ok(())
    }

    /// No candidate matched: record the money as an unattributed
    /// contribution rather than dropping it.
    async fn record_unattributed(&self, event: &ParsedSmsEvent) -> Result<Reconciliation> {
        let payment = Self::payment_for(event, PaymentKind::Donation, None);

        match self.orders.insert_payment(payment).await? {
            PaymentInsert::Created(created) => {
                tracing::info!(
                    payment_id = %created.id,
                    amount = %created.amount,
                    "unattributed payment recorded as donation"
                );
                let delivery = self
                    .notifier_breaker
                    .call(self.notifier.unattributed_payment(&created))
                    .await;
                if let Err(err) = delivery {
                    tracing::warn!(payment_id = %created.id, error = %err, "donation notification failed");
                }
                Ok(Reconciliation {
                    kind: PaymentKind::Donation,
                    order_id: None,
                    payment_id: created.id,
                    reused: false,
                })
            }
            PaymentInsert::Existing(existing) => self.replay(existing).await,
        }
    }

    /// Non-critical notification boundary: breaker-guarded,
    /// log-and-continue, never part of the transactional outcome.
    async fn notify_matched(&self, order: &TicketOrder, payment: &Payment, issued: &IssuedPass) {
        let delivery = self
            .notifier_breaker
            .call(self.notifier.payment_matched(
                order,
                payment,
                &issued.pass,
                issued.secret.as_deref(),
            ))
            .await;
        if let Err(err) = delivery {
            tracing::warn!(order_id = %order.id, error = %err, "match notification failed");
        }
    }

    /// Build a confirmed payment row for this event.
    fn payment_for(
        event: &ParsedSmsEvent,
        kind: PaymentKind,
        order_id: Option<OrderId>,
    ) -> Payment {
        let payer_reference = event
            .msisdn
            .as_deref()
            .and_then(normalize_msisdn)
            .unwrap_or_else(|| event.reference.clone());

        Payment {
            id: PaymentId::new(),
            order_id,
            kind,
            amount: event.amount,
            status: PaymentStatus::Confirmed,
            source_reference: event.source_reference.clone(),
            payer_reference: Some(payer_reference),
            received_at: event.received_at,
            created_at: Utc::now(),
        }
    }
}
