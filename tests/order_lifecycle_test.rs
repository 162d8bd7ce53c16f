//! Order lifecycle integration tests: checkout, capacity, cancellation,
//! lazy expiry, and the admin triggers.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use matchday_core::config::{OrderConfig, PassConfig, ZoneDef};
use matchday_core::mocks::{MockOrderRepository, MockPassRepository};
use matchday_core::providers::{MatchCommit, OrderRepository, PassRepository};
use matchday_core::types::{
    BuyerId, MatchId, Money, OrderStatus, PassState, PaymentId, PaymentKind, PaymentStatus,
};
use matchday_core::{EngineError, PassIssuer, TicketOrderService};
use std::sync::Arc;

struct Harness {
    orders: Arc<MockOrderRepository>,
    passes: Arc<MockPassRepository>,
    service: TicketOrderService<MockOrderRepository, MockPassRepository>,
    issuer: PassIssuer<MockOrderRepository, MockPassRepository>,
}

fn harness_with(config: OrderConfig) -> Harness {
    let orders = Arc::new(MockOrderRepository::new());
    let passes = Arc::new(MockPassRepository::new());
    Harness {
        orders: Arc::clone(&orders),
        passes: Arc::clone(&passes),
        service: TicketOrderService::new(Arc::clone(&orders), Arc::clone(&passes), config),
        issuer: PassIssuer::new(orders, passes, PassConfig::default()),
    }
}

fn harness() -> Harness {
    harness_with(OrderConfig::default().with_zones(vec![
        ZoneDef::new("EAST", Money::from_minor(500), 5000),
        ZoneDef::new("VIP", Money::from_minor(1500), 4),
    ]))
}

/// Settle an order the way reconciliation would, without the matcher.
async fn pay_order(h: &Harness, order_id: matchday_core::types::OrderId, source: &str) {
    let payment = matchday_core::types::Payment {
        id: PaymentId::new(),
        order_id: Some(order_id),
        kind: PaymentKind::Ticket,
        amount: Money::from_minor(1500),
        status: PaymentStatus::Confirmed,
        source_reference: source.to_string(),
        payer_reference: None,
        received_at: Utc::now(),
        created_at: Utc::now(),
    };
    let commit = h.orders.commit_match(order_id, payment).await.unwrap();
    assert!(matches!(commit, MatchCommit::Committed(_)));
}

#[tokio::test]
async fn checkout_builds_total_window_and_ussd_string() {
    let h = harness();
    let before = Utc::now();

    let order = h
        .service
        .create_pending_order(MatchId::new(), "EAST", 3, None)
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, Money::from_minor(1500));
    assert_eq!(order.ussd_code, "*182*8*1*12345*1500#");
    assert!(order.expires_at >= before + Duration::minutes(5));
    assert!(order.expires_at <= Utc::now() + Duration::minutes(5));
}

#[tokio::test]
async fn checkout_rejects_bad_quantity_and_unknown_zone() {
    let h = harness();

    let err = h
        .service
        .create_pending_order(MatchId::new(), "EAST", 0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest { .. }));

    let err = h
        .service
        .create_pending_order(MatchId::new(), "EAST", 999, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest { .. }));

    let err = h
        .service
        .create_pending_order(MatchId::new(), "NORTH", 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest { .. }));
}

#[tokio::test]
async fn zone_capacity_counts_pending_and_paid() {
    let h = harness();
    let match_id = MatchId::new();

    h.service
        .create_pending_order(match_id, "VIP", 2, None)
        .await
        .unwrap();
    h.service
        .create_pending_order(match_id, "VIP", 2, None)
        .await
        .unwrap();

    let err = h
        .service
        .create_pending_order(match_id, "VIP", 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SoldOut { .. }));

    // A different fixture has its own capacity.
    let other = h
        .service
        .create_pending_order(MatchId::new(), "VIP", 2, None)
        .await;
    assert!(other.is_ok());
}

#[tokio::test]
async fn buyer_cancels_a_pending_order() {
    let h = harness();
    let buyer = BuyerId::new();
    let order = h
        .service
        .create_pending_order(MatchId::new(), "EAST", 1, Some(buyer))
        .await
        .unwrap();

    let cancelled = h
        .service
        .cancel_pending_order(order.id, Some(buyer))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // Terminal: a second cancel is rejected.
    let err = h
        .service
        .cancel_pending_order(order.id, Some(buyer))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotCancellable));
}

#[tokio::test]
async fn a_stranger_cannot_cancel() {
    let h = harness();
    let buyer = BuyerId::new();
    let order = h
        .service
        .create_pending_order(MatchId::new(), "EAST", 1, Some(buyer))
        .await
        .unwrap();

    let err = h
        .service
        .cancel_pending_order(order.id, Some(BuyerId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest { .. }));
}

#[tokio::test]
async fn paid_orders_are_not_cancellable() {
    let h = harness();
    let order = h
        .service
        .create_pending_order(MatchId::new(), "VIP", 1, None)
        .await
        .unwrap();
    pay_order(&h, order.id, "sms-cancel").await;

    let err = h
        .service
        .cancel_pending_order(order.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotCancellable));
}

#[tokio::test]
async fn lazy_expiry_is_visible_without_a_write() {
    // A payment window in the past makes orders lapse immediately.
    let h = harness_with(
        OrderConfig::default()
            .with_zones(vec![ZoneDef::new("EAST", Money::from_minor(500), 5000)])
            .with_payment_window(Duration::minutes(-1)),
    );
    let order = h
        .service
        .create_pending_order(MatchId::new(), "EAST", 1, None)
        .await
        .unwrap();

    // The read reports expired...
    let snapshot = h.service.get_order_snapshot(order.id).await.unwrap().unwrap();
    assert_eq!(snapshot.status, OrderStatus::Expired);

    // ...while the stored row is still pending (no write happened).
    let stored = h.orders.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
async fn expiry_is_persisted_on_the_next_mutation_path() {
    let h = harness_with(
        OrderConfig::default()
            .with_zones(vec![ZoneDef::new("EAST", Money::from_minor(500), 5000)])
            .with_payment_window(Duration::minutes(-1)),
    );
    let order = h
        .service
        .create_pending_order(MatchId::new(), "EAST", 1, None)
        .await
        .unwrap();

    let err = h
        .service
        .cancel_pending_order(order.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotCancellable));

    let stored = h.orders.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Expired);
}

#[tokio::test]
async fn listing_projects_all_of_a_buyers_orders() {
    let h = harness();
    let buyer = BuyerId::new();
    h.service
        .create_pending_order(MatchId::new(), "EAST", 1, Some(buyer))
        .await
        .unwrap();
    h.service
        .create_pending_order(MatchId::new(), "VIP", 1, Some(buyer))
        .await
        .unwrap();
    h.service
        .create_pending_order(MatchId::new(), "EAST", 1, None)
        .await
        .unwrap();

    let listed = h.service.list_orders_for_buyer(buyer).await.unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn admin_cancel_returns_before_and_after() {
    let h = harness();
    let order = h
        .service
        .create_pending_order(MatchId::new(), "EAST", 1, None)
        .await
        .unwrap();

    let audit = h.service.admin_cancel(order.id).await.unwrap();
    assert_eq!(audit.before.status, OrderStatus::Pending);
    assert_eq!(audit.after.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn admin_refund_fails_payment_and_revokes_pass() {
    let h = harness();
    let order = h
        .service
        .create_pending_order(MatchId::new(), "VIP", 1, None)
        .await
        .unwrap();
    pay_order(&h, order.id, "sms-refund").await;
    let issued = h.issuer.issue_for(order.id).await.unwrap();

    let refund = h.service.admin_refund_trigger(order.id).await.unwrap();

    assert_eq!(refund.payment.before.status, PaymentStatus::Confirmed);
    assert_eq!(refund.payment.after.status, PaymentStatus::Failed);
    assert_eq!(
        refund.revoked_pass.as_ref().map(|p| p.state),
        Some(PassState::Revoked)
    );

    let stored_pass = h.passes.get_pass(issued.pass.id).await.unwrap().unwrap();
    assert_eq!(stored_pass.state, PassState::Revoked);

    // The trigger is one-shot: the payment is no longer confirmed.
    let err = h.service.admin_refund_trigger(order.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotEligible { .. }));
}

#[tokio::test]
async fn issuance_requires_a_paid_order() {
    let h = harness();
    let order = h
        .service
        .create_pending_order(MatchId::new(), "EAST", 1, None)
        .await
        .unwrap();

    let err = h.issuer.issue_for(order.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotEligible { .. }));
}

#[tokio::test]
async fn issuance_is_idempotent_per_order() {
    let h = harness();
    let order = h
        .service
        .create_pending_order(MatchId::new(), "VIP", 1, None)
        .await
        .unwrap();
    pay_order(&h, order.id, "sms-idem").await;

    let first = h.issuer.issue_for(order.id).await.unwrap();
    let second = h.issuer.issue_for(order.id).await.unwrap();

    assert!(first.secret.is_some());
    assert!(second.secret.is_none(), "secret is handed out exactly once");
    assert_eq!(first.pass.id, second.pass.id);
    assert_eq!(h.passes.pass_count(), 1);
}
