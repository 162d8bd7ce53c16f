//! Transfer protocol integration tests: pending uniqueness, the
//! single-winner claim race, expiry, and cancellation.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use matchday_core::config::PassConfig;
use matchday_core::mocks::{MockOrderRepository, MockPassRepository};
use matchday_core::providers::{OrderRepository, PassRepository};
use matchday_core::types::{
    BuyerId, MatchId, Money, OrderId, OrderStatus, PassState, RejectReason, TicketOrder,
    TransferStatus, Zone,
};
use matchday_core::{EngineError, GateVerifier, PassIssuer};
use std::sync::Arc;

struct Harness {
    orders: Arc<MockOrderRepository>,
    passes: Arc<MockPassRepository>,
    issuer: Arc<PassIssuer<MockOrderRepository, MockPassRepository>>,
    gate: GateVerifier<MockPassRepository>,
}

fn harness() -> Harness {
    harness_with(PassConfig::default())
}

fn harness_with(config: PassConfig) -> Harness {
    let orders = Arc::new(MockOrderRepository::new());
    let passes = Arc::new(MockPassRepository::new());
    Harness {
        orders: Arc::clone(&orders),
        passes: Arc::clone(&passes),
        issuer: Arc::new(PassIssuer::new(orders, Arc::clone(&passes), config)),
        gate: GateVerifier::new(passes),
    }
}

async fn issued_pass(h: &Harness, buyer: BuyerId) -> (matchday_core::types::Pass, String) {
    let order = TicketOrder {
        id: OrderId::new(),
        buyer_id: Some(buyer),
        match_id: MatchId::new(),
        zone: Zone::new("VIP"),
        quantity: 1,
        total: Money::from_minor(1500),
        status: OrderStatus::Paid,
        payment_reference: Some("sms-paid".to_string()),
        ussd_code: "*182*8*1*12345*1500#".to_string(),
        created_at: Utc::now() - Duration::minutes(10),
        expires_at: Utc::now() - Duration::minutes(5),
    };
    h.orders.insert_order(&order).await.unwrap();
    let issued = h.issuer.issue_for(order.id).await.unwrap();
    (issued.pass, issued.secret.unwrap())
}

#[tokio::test]
async fn claim_moves_the_pass_to_the_claimant() {
    let h = harness();
    let owner = BuyerId::new();
    let claimant = BuyerId::new();
    let (pass, old_secret) = issued_pass(&h, owner).await;

    let initiated = h.issuer.initiate_transfer(pass.id, owner).await.unwrap();
    assert_eq!(initiated.transfer.status, TransferStatus::Pending);

    let claimed = h
        .issuer
        .claim_transfer(&initiated.claim_token, claimant)
        .await
        .unwrap();
    let new_pass = claimed.pass;
    let new_secret = claimed.secret.unwrap();

    // Zone and gate preserved, ownership moved.
    assert_eq!(new_pass.zone, pass.zone);
    assert_eq!(new_pass.gate, pass.gate);
    assert_eq!(new_pass.owner_id, Some(claimant));
    assert_eq!(new_pass.order_id, pass.order_id);

    // The source pass is revoked and its token no longer admits.
    let revoked = h.passes.get_pass(pass.id).await.unwrap().unwrap();
    assert_eq!(revoked.state, PassState::Revoked);
    let stale = h.gate.verify(&old_secret, false, "steward-1").await.unwrap();
    assert!(!stale.valid);
    assert_eq!(stale.reason, Some(RejectReason::Revoked));

    // The claimant's token admits.
    let fresh = h.gate.verify(&new_secret, false, "steward-1").await.unwrap();
    assert!(fresh.valid);
}

#[tokio::test]
async fn only_one_pending_transfer_per_pass() {
    let h = harness();
    let owner = BuyerId::new();
    let (pass, _) = issued_pass(&h, owner).await;

    h.issuer.initiate_transfer(pass.id, owner).await.unwrap();
    let err = h.issuer.initiate_transfer(pass.id, owner).await.unwrap_err();
    assert!(matches!(err, EngineError::TransferAlreadyPending));
}

#[tokio::test]
async fn concurrent_claims_have_exactly_one_winner() {
    let h = harness();
    let owner = BuyerId::new();
    let (pass, _) = issued_pass(&h, owner).await;
    let passes_before = h.passes.pass_count();

    let initiated = h.issuer.initiate_transfer(pass.id, owner).await.unwrap();
    let token = Arc::new(initiated.claim_token);

    let a = {
        let issuer = Arc::clone(&h.issuer);
        let token = Arc::clone(&token);
        tokio::spawn(async move { issuer.claim_transfer(&token, BuyerId::new()).await })
    };
    let b = {
        let issuer = Arc::clone(&h.issuer);
        let token = Arc::clone(&token);
        tokio::spawn(async move { issuer.claim_transfer(&token, BuyerId::new()).await })
    };

    let a = a.await.unwrap();
    let b = b.await.unwrap();

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one claim wins");
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(
        loser.unwrap_err(),
        EngineError::TransferNotClaimable
    ));

    // Exactly one new pass row was minted.
    assert_eq!(h.passes.pass_count(), passes_before + 1);
}

#[tokio::test]
async fn expired_claim_token_is_rejected_and_persisted() {
    let h = harness_with(PassConfig::default().with_transfer_ttl(Duration::seconds(-1)));
    let owner = BuyerId::new();
    let (pass, _) = issued_pass(&h, owner).await;

    let initiated = h.issuer.initiate_transfer(pass.id, owner).await.unwrap();
    let err = h
        .issuer
        .claim_transfer(&initiated.claim_token, BuyerId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TransferNotClaimable));

    // The lapse was persisted opportunistically.
    let transfer = h
        .passes
        .find_transfer_by_claim_hash(&matchday_core::utils::hash_token(&initiated.claim_token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(transfer.status, TransferStatus::Expired);

    // The source pass is untouched.
    let source = h.passes.get_pass(pass.id).await.unwrap().unwrap();
    assert_eq!(source.state, PassState::Issued);
}

#[tokio::test]
async fn unknown_claim_token_is_rejected() {
    let h = harness();
    let err = h
        .issuer
        .claim_transfer("no-such-token", BuyerId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TransferNotClaimable));
}

#[tokio::test]
async fn used_pass_is_not_transferable() {
    let h = harness();
    let owner = BuyerId::new();
    let (pass, secret) = issued_pass(&h, owner).await;

    h.gate.verify(&secret, false, "steward-1").await.unwrap();

    let err = h.issuer.initiate_transfer(pass.id, owner).await.unwrap_err();
    assert!(matches!(err, EngineError::NotTransferable));
}

#[tokio::test]
async fn only_the_owner_may_initiate() {
    let h = harness();
    let owner = BuyerId::new();
    let (pass, _) = issued_pass(&h, owner).await;

    let err = h
        .issuer
        .initiate_transfer(pass.id, BuyerId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotTransferable));
}

#[tokio::test]
async fn cancellation_releases_the_pending_slot() {
    let h = harness();
    let owner = BuyerId::new();
    let (pass, _) = issued_pass(&h, owner).await;

    let initiated = h.issuer.initiate_transfer(pass.id, owner).await.unwrap();
    h.issuer.cancel_transfer(initiated.transfer.id).await.unwrap();

    // The cancelled token no longer claims.
    let err = h
        .issuer
        .claim_transfer(&initiated.claim_token, BuyerId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TransferNotClaimable));

    // A new transfer can be initiated.
    let again = h.issuer.initiate_transfer(pass.id, owner).await;
    assert!(again.is_ok());
}
