//! Domain types for the matchday ticketing core.
//!
//! Value objects, entities, and state enums for ticket orders, payments,
//! entry passes, and pass transfers. All monetary amounts are integer
//! minor units; all state transitions happen through conditional updates
//! owned by the services in this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a ticket order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a payment record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Creates a new random `PaymentId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PaymentId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an entry pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(Uuid);

impl PassId {
    /// Creates a new random `PassId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PassId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PassId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a pass transfer request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(Uuid);

impl TransferId {
    /// Creates a new random `TransferId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TransferId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a fixture (a scheduled match).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Creates a new random `MatchId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `MatchId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a buyer account.
///
/// Orders may be placed without one (guest checkout), so buyer links are
/// `Option<BuyerId>` throughout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuyerId(Uuid);

impl BuyerId {
    /// Creates a new random `BuyerId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BuyerId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BuyerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// Monetary amount in integer minor units of the club currency.
///
/// Mobile-money notifications carry whole amounts; all matching is
/// exact-amount equality, so no fractional arithmetic exists anywhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Create an amount from minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// The amount in minor units.
    #[must_use]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// `true` if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiply by a quantity, saturating on overflow.
    #[must_use]
    pub const fn times(&self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Zones
// ============================================================================

/// Stadium zone code (e.g. `"VIP"`, `"EAST"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(String);

impl Zone {
    /// Create a zone from its code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The zone code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Order
// ============================================================================

/// Lifecycle states of a ticket order.
///
/// `Pending -> Paid` via reconciliation, `Pending -> Cancelled` while still
/// pending, `Pending -> Expired` lazily once `expires_at` elapses. `Paid`,
/// `Cancelled` and `Expired` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting an out-of-band payment.
    Pending,
    /// Reconciled against a confirmed payment.
    Paid,
    /// Cancelled by the buyer or the system while pending.
    Cancelled,
    /// Payment window elapsed with no match.
    Expired,
}

impl OrderStatus {
    /// Stable string form, as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

/// A ticket reservation awaiting payment confirmation, with a bounded
/// lifetime.
///
/// Owned exclusively by `TicketOrderService`; mutated only through its
/// conditional state transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketOrder {
    /// Order identifier.
    pub id: OrderId,
    /// Buyer account, absent for guest checkout.
    pub buyer_id: Option<BuyerId>,
    /// Fixture being bought into.
    pub match_id: MatchId,
    /// Stadium zone.
    pub zone: Zone,
    /// Number of seats.
    pub quantity: u32,
    /// Total owed, in minor units.
    pub total: Money,
    /// Current lifecycle state.
    pub status: OrderStatus,
    /// Source reference of the payment that settled this order, set once
    /// matched.
    pub payment_reference: Option<String>,
    /// USSD dial string the buyer uses to pay.
    pub ussd_code: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// End of the payment window.
    pub expires_at: DateTime<Utc>,
}

impl TicketOrder {
    /// `true` if the order is pending but its payment window has elapsed.
    #[must_use]
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Pending && now > self.expires_at
    }

    /// The status as seen by readers, applying lazy expiry without a write.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> OrderStatus {
        if self.is_lapsed(now) {
            OrderStatus::Expired
        } else {
            self.status
        }
    }
}

/// Read-only projection of an order, with lazy expiry already applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Order identifier.
    pub id: OrderId,
    /// Buyer account, absent for guest checkout.
    pub buyer_id: Option<BuyerId>,
    /// Fixture being bought into.
    pub match_id: MatchId,
    /// Stadium zone.
    pub zone: Zone,
    /// Number of seats.
    pub quantity: u32,
    /// Total owed, in minor units.
    pub total: Money,
    /// Effective lifecycle state at read time.
    pub status: OrderStatus,
    /// Source reference of the settling payment, if matched.
    pub payment_reference: Option<String>,
    /// USSD dial string the buyer uses to pay.
    pub ussd_code: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// End of the payment window.
    pub expires_at: DateTime<Utc>,
}

impl OrderSnapshot {
    /// Project an order at `now`, surfacing lapsed pending orders as
    /// `Expired` without requiring a write.
    #[must_use]
    pub fn project(order: &TicketOrder, now: DateTime<Utc>) -> Self {
        Self {
            id: order.id,
            buyer_id: order.buyer_id,
            match_id: order.match_id,
            zone: order.zone.clone(),
            quantity: order.quantity,
            total: order.total,
            status: order.effective_status(now),
            payment_reference: order.payment_reference.clone(),
            ussd_code: order.ussd_code.clone(),
            created_at: order.created_at,
            expires_at: order.expires_at,
        }
    }
}

// ============================================================================
// Payment
// ============================================================================

/// What a reconciled payment was for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Settles a ticket order.
    Ticket,
    /// Settles a shop order (reconciled outside this core).
    Shop,
    /// Unattributed contribution; no order linkage.
    Donation,
}

impl PaymentKind {
    /// Stable string form, as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::Shop => "shop",
            Self::Donation => "donation",
        }
    }
}

/// Payment record states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Recorded but not yet confirmed.
    Pending,
    /// Confirmed; immutable except for the manual refund trigger.
    Confirmed,
    /// Failed or refunded by admin action.
    Failed,
}

impl PaymentStatus {
    /// Stable string form, as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

/// A reconciled mobile-money payment.
///
/// `source_reference` is the idempotency key: reprocessing the same parsed
/// SMS event must be a no-op, so at most one payment row exists per source
/// reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment identifier.
    pub id: PaymentId,
    /// Settled order, absent for non-ticket kinds.
    pub order_id: Option<OrderId>,
    /// What the payment was for.
    pub kind: PaymentKind,
    /// Amount received, in minor units.
    pub amount: Money,
    /// Record state.
    pub status: PaymentStatus,
    /// Stable identifier of the parsed SMS event that produced this record.
    pub source_reference: String,
    /// Payer-side reference carried in the notification (transaction code,
    /// MSISDN), kept for support lookups.
    pub payer_reference: Option<String>,
    /// When the provider reported the money received.
    pub received_at: DateTime<Utc>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Pass
// ============================================================================

/// Lifecycle states of an entry pass.
///
/// `Issued -> Active` on first rotation, `-> Used` (terminal) through live
/// gate verification only, `-> Revoked` (terminal) through transfer or admin
/// action only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    /// Issued, bearer secret delivered once, never rotated.
    Issued,
    /// Confirmed by the holder via rotation.
    Active,
    /// Consumed at the gate.
    Used,
    /// Invalidated by transfer or admin action.
    Revoked,
}

impl PassState {
    /// Stable string form, as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Active => "active",
            Self::Used => "used",
            Self::Revoked => "revoked",
        }
    }

    /// `true` while the pass can still be presented at a gate.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Issued | Self::Active)
    }
}

/// The bearer credential proving a paid, unused entitlement to enter.
///
/// Only the one-way hash of the bearer secret is ever persisted; exactly one
/// live hash exists per pass at any time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pass {
    /// Pass identifier.
    pub id: PassId,
    /// Order the entitlement came from.
    pub order_id: OrderId,
    /// Current holder, absent for unclaimed guest passes.
    pub owner_id: Option<BuyerId>,
    /// Stadium zone the pass admits to.
    pub zone: Zone,
    /// Assigned gate, if any.
    pub gate: Option<String>,
    /// SHA-256 hex hash of the current bearer secret.
    pub token_hash: String,
    /// Lifecycle state.
    pub state: PassState,
    /// Steward who consumed the pass.
    pub used_by: Option<String>,
    /// When the pass was consumed.
    pub used_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last state or hash change.
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Transfer
// ============================================================================

/// Lifecycle states of a transfer request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Awaiting a claim.
    Pending,
    /// Claimed; the source pass has been revoked and reissued.
    Claimed,
    /// Claim window elapsed.
    Expired,
    /// Withdrawn by the initiator.
    Cancelled,
}

impl TransferStatus {
    /// Stable string form, as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

/// An offer to hand a pass to another holder, claimable once.
///
/// A pass has at most one outstanding `Pending` transfer; the claim is a
/// conditional update, so a race between two claimants has exactly one
/// winner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Transfer identifier.
    pub id: TransferId,
    /// Pass being handed over.
    pub pass_id: PassId,
    /// Holder who initiated the transfer.
    pub initiator_id: BuyerId,
    /// SHA-256 hex hash of the single-use claim token.
    pub claim_token_hash: String,
    /// Lifecycle state.
    pub status: TransferStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// End of the claim window.
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Ingestion boundary
// ============================================================================

/// A parsed mobile-money SMS notification, as delivered by the ingestion
/// pipeline.
///
/// Delivery is at-least-once; `source_reference` is stable across
/// re-deliveries and drives reconciliation idempotency. Malformed events are
/// rejected at this boundary before any store access.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedSmsEvent {
    /// Stable identifier of the SMS event.
    pub source_reference: String,
    /// Amount received, in minor units.
    pub amount: Money,
    /// Provider transaction reference from the message body.
    pub reference: String,
    /// Sender phone number, when the parser could extract it.
    pub msisdn: Option<String>,
    /// When the provider reported the money received.
    pub received_at: DateTime<Utc>,
}

// ============================================================================
// Service outcomes
// ============================================================================

/// Outcome of reconciling one parsed SMS event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// What the payment settled.
    pub kind: PaymentKind,
    /// Matched order, absent for unattributed payments.
    pub order_id: Option<OrderId>,
    /// The payment record produced (or found, on replay).
    pub payment_id: PaymentId,
    /// `true` when this event had already been reconciled and the recorded
    /// result was returned unchanged.
    pub reused: bool,
}

/// A freshly issued or rotated pass together with its bearer secret.
///
/// The raw secret appears here exactly once per hash; it is never persisted
/// and idempotent re-issuance returns `secret: None`.
#[derive(Clone, Debug)]
pub struct IssuedPass {
    /// The pass record.
    pub pass: Pass,
    /// Raw bearer secret, present only when a new secret was generated.
    pub secret: Option<String>,
}

/// A freshly initiated transfer together with its single-use claim token.
///
/// The raw claim token appears here exactly once; only its hash is
/// persisted.
#[derive(Clone, Debug)]
pub struct InitiatedTransfer {
    /// The transfer request record.
    pub transfer: TransferRequest,
    /// Raw single-use claim token for the claimant.
    pub claim_token: String,
}

/// Outcome of the manual admin refund trigger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    /// The payment, before and after being marked failed.
    pub payment: AuditedChange<Payment>,
    /// The pass revoked alongside, when one was still live.
    pub revoked_pass: Option<Pass>,
}

/// Why a presented token was rejected at the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No live token hash matches the presented token.
    NotFound,
    /// The pass was already consumed.
    AlreadyUsed,
    /// The pass was revoked by transfer or admin action.
    Revoked,
}

impl RejectReason {
    /// Stable reason code, as returned to steward tooling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => crate::constants::reject_reasons::NOT_FOUND,
            Self::AlreadyUsed => crate::constants::reject_reasons::ALREADY_USED,
            Self::Revoked => crate::constants::reject_reasons::REVOKED,
        }
    }
}

/// Result of a gate verification.
///
/// Gate staff need a reason code, not a stack trace, so every rejection is
/// data here; only infrastructure failures surface as errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the presented token admits (or, in dry-run, would admit).
    pub valid: bool,
    /// Rejection reason when not valid.
    pub reason: Option<RejectReason>,
    /// The pass involved, when one was found.
    pub pass: Option<Pass>,
}

impl Verification {
    /// A granted verification.
    #[must_use]
    pub const fn granted(pass: Pass) -> Self {
        Self {
            valid: true,
            reason: None,
            pass: Some(pass),
        }
    }

    /// A rejected verification with a reason code.
    #[must_use]
    pub const fn rejected(reason: RejectReason, pass: Option<Pass>) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            pass,
        }
    }
}

/// Before/after snapshots produced by admin mutations, handed to the
/// external audit collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditedChange<T> {
    /// State before the mutation.
    pub before: T,
    /// State after the mutation.
    pub after: T,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn order(status: OrderStatus, expires_at: DateTime<Utc>) -> TicketOrder {
        TicketOrder {
            id: OrderId::new(),
            buyer_id: None,
            match_id: MatchId::new(),
            zone: Zone::new("EAST"),
            quantity: 1,
            total: Money::from_minor(1500),
            status,
            payment_reference: None,
            ussd_code: "*182*8*1*12345*1500#".to_string(),
            created_at: Utc::now(),
            expires_at,
        }
    }

    #[test]
    fn money_times_quantity() {
        assert_eq!(Money::from_minor(1500).times(3), Money::from_minor(4500));
        assert!(Money::from_minor(1).is_positive());
        assert!(!Money::ZERO.is_positive());
    }

    #[test]
    fn pending_order_past_expiry_reads_as_expired() {
        let now = Utc::now();
        let o = order(OrderStatus::Pending, now - Duration::minutes(1));
        assert!(o.is_lapsed(now));
        assert_eq!(o.effective_status(now), OrderStatus::Expired);
        // The underlying record is untouched.
        assert_eq!(o.status, OrderStatus::Pending);
    }

    #[test]
    fn terminal_orders_are_never_lapsed() {
        let now = Utc::now();
        let o = order(OrderStatus::Paid, now - Duration::minutes(1));
        assert!(!o.is_lapsed(now));
        assert_eq!(o.effective_status(now), OrderStatus::Paid);
    }

    #[test]
    fn snapshot_applies_lazy_expiry() {
        let now = Utc::now();
        let o = order(OrderStatus::Pending, now - Duration::minutes(1));
        let snapshot = OrderSnapshot::project(&o, now);
        assert_eq!(snapshot.status, OrderStatus::Expired);
    }

    #[test]
    fn pass_state_liveness() {
        assert!(PassState::Issued.is_live());
        assert!(PassState::Active.is_live());
        assert!(!PassState::Used.is_live());
        assert!(!PassState::Revoked.is_live());
    }

    #[test]
    fn status_wire_forms_are_snake_case() {
        assert_eq!(OrderStatus::Pending.as_str(), "pending");
        assert_eq!(PaymentKind::Donation.as_str(), "donation");
        assert_eq!(PassState::Revoked.as_str(), "revoked");
        assert_eq!(TransferStatus::Claimed.as_str(), "claimed");

        let json = serde_json::to_string(&OrderStatus::Expired).unwrap();
        assert_eq!(json, "\"expired\"");
    }
}
