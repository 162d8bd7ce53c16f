//! Pass and transfer repository trait.
//!
//! Passes and the transfer requests that move them between holders change
//! together, so they live behind one seam. Every lifecycle transition is a
//! conditional update; the transfer claim in particular is the
//! serialization point that gives a claim race exactly one winner.

use crate::error::Result;
use crate::types::{OrderId, Pass, PassId, TransferId, TransferRequest};
use chrono::{DateTime, Utc};

/// Outcome of an idempotent pass insert.
#[derive(Clone, Debug, PartialEq)]
pub enum PassInsert {
    /// No live pass existed for the order; this one was inserted.
    Created(Pass),

    /// A non-revoked pass already exists for the order; it is returned
    /// unchanged and nothing was written.
    Existing(Pass),
}

/// Outcome of inserting a transfer request.
#[derive(Clone, Debug, PartialEq)]
pub enum TransferInsert {
    /// No pending transfer existed for the pass; this one was inserted.
    Created(TransferRequest),

    /// A pending transfer already exists for the pass; nothing was written.
    PendingExists,
}

/// Repository for entry passes and transfer requests.
///
/// # Atomicity
///
/// **CRITICAL**: `rotate_token`, `consume`, `revoke`, `claim_transfer`, and
/// the uniqueness guards inside `insert_pass_if_absent` /
/// `insert_transfer` are conditional operations. Guard and mutation must be
/// one atomic step; losing a guard returns `None` (or the typed variant),
/// never a partial write.
pub trait PassRepository: Send + Sync {
    /// Insert a pass unless a non-revoked pass already exists for its
    /// order. This is what makes issuance idempotent and guards double
    /// issuance under concurrent reconciliation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn insert_pass_if_absent(
        &self,
        pass: Pass,
    ) -> impl std::future::Future<Output = Result<PassInsert>> + Send;

    /// Fetch a pass by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn get_pass(&self, id: PassId)
    -> impl std::future::Future<Output = Result<Option<Pass>>> + Send;

    /// The current (non-revoked) pass for an order, if any.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn find_current_by_order(
        &self,
        order_id: OrderId,
    ) -> impl std::future::Future<Output = Result<Option<Pass>>> + Send;

    /// Look up a pass by its live token hash.
    ///
    /// Rotation replaces the hash in place, so a rotated-away token simply
    /// stops matching here.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<Pass>>> + Send;

    /// Swap the token hash and activate the pass, in one conditional
    /// update guarded on the pass being live (`Issued` or `Active`).
    ///
    /// Returns the updated pass, or `None` when the guard lost. Any
    /// verification in flight against the old hash fails cleanly
    /// afterwards: its hash no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn rotate_token(
        &self,
        id: PassId,
        new_hash: &str,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<Pass>>> + Send;

    /// Consume a pass at the gate: CAS it from live to `Used`, recording
    /// the steward and timestamp. Losing the race returns `None`, which
    /// the verifier reports as `already_used` — never a duplicate
    /// admission.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn consume(
        &self,
        id: PassId,
        steward: &str,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<Pass>>> + Send;

    /// Revoke a live pass (transfer or admin action). Returns `None` when
    /// the pass was missing or already terminal.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn revoke(
        &self,
        id: PassId,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<Pass>>> + Send;

    /// Insert a transfer request unless the pass already has a pending
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn insert_transfer(
        &self,
        transfer: TransferRequest,
    ) -> impl std::future::Future<Output = Result<TransferInsert>> + Send;

    /// Look up a transfer request by the hash of its claim token.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn find_transfer_by_claim_hash(
        &self,
        claim_token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<TransferRequest>>> + Send;

    /// Claim a transfer: CAS it `Pending -> Claimed`. This is the
    /// single-winner point of the transfer protocol; the loser of a race
    /// gets `None`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn claim_transfer(
        &self,
        id: TransferId,
    ) -> impl std::future::Future<Output = Result<Option<TransferRequest>>> + Send;

    /// Opportunistically CAS a lapsed transfer `Pending -> Expired`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn expire_transfer(
        &self,
        id: TransferId,
    ) -> impl std::future::Future<Output = Result<Option<TransferRequest>>> + Send;

    /// CAS a transfer `Pending -> Cancelled` (initiator withdrawal).
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Store`] if the store is unavailable.
    fn cancel_transfer(
        &self,
        id: TransferId,
    ) -> impl std::future::Future<Output = Result<Option<TransferRequest>>> + Send;
}
