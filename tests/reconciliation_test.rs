//! Reconciliation integration tests: idempotency, exact-amount FIFO
//! matching, the donation fallthrough, and the re-entrant issuance
//! trigger.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use matchday_core::config::{MatcherConfig, OrderConfig, PassConfig, ZoneDef};
use matchday_core::mocks::{
    notifier::Notification, MockOrderRepository, MockPassRepository, RecordingNotifier,
};
use matchday_core::providers::{MatchCommit, OrderRepository, PassRepository};
use matchday_core::resilience::{CircuitBreaker, CircuitBreakerConfig};
use matchday_core::types::{
    MatchId, Money, OrderId, OrderStatus, ParsedSmsEvent, PassState, PaymentId, PaymentKind,
    PaymentStatus, TicketOrder, Zone,
};
use matchday_core::{PassIssuer, PaymentMatcher, TicketOrderService};
use std::sync::Arc;

type Matcher = PaymentMatcher<MockOrderRepository, MockPassRepository, RecordingNotifier>;

struct Harness {
    orders: Arc<MockOrderRepository>,
    passes: Arc<MockPassRepository>,
    notifier: Arc<RecordingNotifier>,
    matcher: Matcher,
    service: TicketOrderService<MockOrderRepository, MockPassRepository>,
}

fn harness() -> Harness {
    let orders = Arc::new(MockOrderRepository::new());
    let passes = Arc::new(MockPassRepository::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let issuer = PassIssuer::new(
        Arc::clone(&orders),
        Arc::clone(&passes),
        PassConfig::default(),
    );
    let matcher = PaymentMatcher::new(
        Arc::clone(&orders),
        issuer,
        Arc::clone(&notifier),
        CircuitBreaker::new("notifier", CircuitBreakerConfig::default()),
        MatcherConfig::default(),
    );
    let service = TicketOrderService::new(
        Arc::clone(&orders),
        Arc::clone(&passes),
        OrderConfig::default().with_zones(vec![
            ZoneDef::new("EAST", Money::from_minor(500), 10_000),
            ZoneDef::new("VIP", Money::from_minor(1500), 500),
        ]),
    );

    Harness {
        orders,
        passes,
        notifier,
        matcher,
        service,
    }
}

fn event(source: &str, amount: i64) -> ParsedSmsEvent {
    ParsedSmsEvent {
        source_reference: source.to_string(),
        amount: Money::from_minor(amount),
        reference: format!("MP.{source}"),
        msisdn: Some("+250788123456".to_string()),
        received_at: Utc::now(),
    }
}

/// Insert a pending order directly, bypassing checkout, so tests can
/// control timestamps.
async fn seed_order(
    orders: &MockOrderRepository,
    total: i64,
    created_at: chrono::DateTime<Utc>,
) -> TicketOrder {
    let order = TicketOrder {
        id: OrderId::new(),
        buyer_id: None,
        match_id: MatchId::new(),
        zone: Zone::new("EAST"),
        quantity: 1,
        total: Money::from_minor(total),
        status: OrderStatus::Pending,
        payment_reference: None,
        ussd_code: "*182*8*1*12345*500#".to_string(),
        created_at,
        expires_at: created_at + Duration::minutes(5),
    };
    orders.insert_order(&order).await.unwrap();
    order
}

#[tokio::test]
async fn match_settles_order_and_issues_pass() {
    let h = harness();
    let order = h
        .service
        .create_pending_order(MatchId::new(), "VIP", 1, None)
        .await
        .unwrap();

    let outcome = h.matcher.reconcile(&event("sms-1", 1500)).await.unwrap();

    assert_eq!(outcome.kind, PaymentKind::Ticket);
    assert_eq!(outcome.order_id, Some(order.id));
    assert!(!outcome.reused);

    let stored = h.orders.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Paid);
    assert_eq!(stored.payment_reference.as_deref(), Some("sms-1"));

    let pass = h.passes.find_current_by_order(order.id).await.unwrap().unwrap();
    assert_eq!(pass.state, PassState::Issued);
    assert_eq!(pass.zone, stored.zone);

    // The buyer was told, with the secret, exactly once.
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        sent[0],
        Notification::PaymentMatched {
            order_id,
            with_secret: true,
        } if order_id == order.id
    ));
}

#[tokio::test]
async fn replay_returns_recorded_outcome_without_new_rows() {
    let h = harness();
    let order = h
        .service
        .create_pending_order(MatchId::new(), "VIP", 1, None)
        .await
        .unwrap();

    let first = h.matcher.reconcile(&event("sms-dup", 1500)).await.unwrap();
    let second = h.matcher.reconcile(&event("sms-dup", 1500)).await.unwrap();

    assert!(!first.reused);
    assert!(second.reused);
    assert_eq!(second.payment_id, first.payment_id);
    assert_eq!(second.order_id, Some(order.id));
    assert_eq!(h.orders.payment_count(), 1);
    assert_eq!(h.passes.pass_count(), 1);
}

#[tokio::test]
async fn concurrent_reconciliation_of_one_event_commits_once() {
    let h = harness();
    h.service
        .create_pending_order(MatchId::new(), "VIP", 1, None)
        .await
        .unwrap();

    let matcher = Arc::new(h.matcher);
    let a = {
        let matcher = Arc::clone(&matcher);
        tokio::spawn(async move { matcher.reconcile(&event("sms-race", 1500)).await })
    };
    let b = {
        let matcher = Arc::clone(&matcher);
        tokio::spawn(async move { matcher.reconcile(&event("sms-race", 1500)).await })
    };

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    // Exactly one payment row regardless of interleaving.
    assert_eq!(h.orders.payment_count(), 1);
    assert_eq!(h.passes.pass_count(), 1);
    assert_eq!(a.payment_id, b.payment_id);
    assert!(a.reused || b.reused);
}

#[tokio::test]
async fn earliest_created_order_wins_among_equal_totals() {
    let h = harness();
    let now = Utc::now();
    let _thousand = seed_order(&h.orders, 1000, now - Duration::minutes(3)).await;
    let older_1500 = seed_order(&h.orders, 1500, now - Duration::minutes(2)).await;
    let newer_1500 = seed_order(&h.orders, 1500, now - Duration::minutes(1)).await;

    let outcome = h.matcher.reconcile(&event("sms-fifo", 1500)).await.unwrap();

    assert_eq!(outcome.order_id, Some(older_1500.id));
    let untouched = h.orders.get_order(newer_1500.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, OrderStatus::Pending);
}

#[tokio::test]
async fn off_by_one_amount_becomes_donation() {
    let h = harness();
    seed_order(&h.orders, 1500, Utc::now() - Duration::minutes(1)).await;

    let outcome = h.matcher.reconcile(&event("sms-1501", 1501)).await.unwrap();

    assert_eq!(outcome.kind, PaymentKind::Donation);
    assert_eq!(outcome.order_id, None);
    assert!(!outcome.reused);

    let payment = h
        .orders
        .find_payment_by_source_reference("sms-1501")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.kind, PaymentKind::Donation);
    assert_eq!(payment.status, PaymentStatus::Confirmed);

    let sent = h.notifier.sent();
    assert!(matches!(sent[0], Notification::Unattributed { .. }));
}

#[tokio::test]
async fn order_outside_window_is_not_matched() {
    let h = harness();
    // Created four days ago: outside the default three-day window.
    let order = seed_order(&h.orders, 1500, Utc::now() - Duration::days(4)).await;

    let outcome = h.matcher.reconcile(&event("sms-old", 1500)).await.unwrap();

    assert_eq!(outcome.kind, PaymentKind::Donation);
    let untouched = h.orders.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, OrderStatus::Pending);
}

#[tokio::test]
async fn lapsed_candidate_is_expired_not_matched() {
    let h = harness();
    // In the window, but its five-minute payment window has elapsed.
    let order = seed_order(&h.orders, 1500, Utc::now() - Duration::hours(2)).await;

    let outcome = h.matcher.reconcile(&event("sms-lapsed", 1500)).await.unwrap();

    assert_eq!(outcome.kind, PaymentKind::Donation);
    // The expiry was persisted on this mutation path.
    let expired = h.orders.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(expired.status, OrderStatus::Expired);
}

#[tokio::test]
async fn malformed_events_are_rejected_before_store_access() {
    let h = harness();
    // If the matcher touched the store, this would surface as Store(_).
    h.orders.set_unavailable(true);

    let bad = event("", 1500);
    let err = h.matcher.reconcile(&bad).await.unwrap_err();
    assert!(matches!(err, matchday_core::EngineError::InvalidEvent { .. }));

    let zero = event("sms-zero", 0);
    let err = h.matcher.reconcile(&zero).await.unwrap_err();
    assert!(matches!(err, matchday_core::EngineError::InvalidEvent { .. }));
}

#[tokio::test]
async fn store_outage_is_retryable_and_leaves_no_partial_state() {
    let h = harness();
    h.service
        .create_pending_order(MatchId::new(), "VIP", 1, None)
        .await
        .unwrap();

    h.orders.set_unavailable(true);
    let err = h.matcher.reconcile(&event("sms-retry", 1500)).await.unwrap_err();
    assert!(err.is_retryable());

    // Redelivery with the same source reference succeeds normally.
    h.orders.set_unavailable(false);
    let outcome = h.matcher.reconcile(&event("sms-retry", 1500)).await.unwrap();
    assert_eq!(outcome.kind, PaymentKind::Ticket);
    assert!(!outcome.reused);
    assert_eq!(h.orders.payment_count(), 1);
}

#[tokio::test]
async fn notifier_failure_never_affects_the_commit() {
    let h = harness();
    let order = h
        .service
        .create_pending_order(MatchId::new(), "VIP", 1, None)
        .await
        .unwrap();
    h.notifier.set_failing(true);

    let outcome = h.matcher.reconcile(&event("sms-notif", 1500)).await.unwrap();

    assert_eq!(outcome.order_id, Some(order.id));
    let stored = h.orders.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Paid);
    assert_eq!(h.passes.pass_count(), 1);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn replay_repairs_a_missing_pass() {
    let h = harness();
    let order = seed_order(&h.orders, 1500, Utc::now() - Duration::minutes(1)).await;

    // Simulate a crash between payment commit and issuance: the payment
    // and order transition are committed, the pass is not.
    let payment = matchday_core::types::Payment {
        id: PaymentId::new(),
        order_id: Some(order.id),
        kind: PaymentKind::Ticket,
        amount: Money::from_minor(1500),
        status: PaymentStatus::Confirmed,
        source_reference: "sms-crash".to_string(),
        payer_reference: None,
        received_at: Utc::now(),
        created_at: Utc::now(),
    };
    let commit = h.orders.commit_match(order.id, payment).await.unwrap();
    assert!(matches!(commit, MatchCommit::Committed(_)));
    assert_eq!(h.passes.pass_count(), 0);

    // Redelivery completes the job.
    let outcome = h.matcher.reconcile(&event("sms-crash", 1500)).await.unwrap();
    assert!(outcome.reused);
    assert_eq!(h.passes.pass_count(), 1);
    assert_eq!(h.orders.payment_count(), 1);
}
