//! Pass issuance, rotation, and the transfer protocol.

use crate::config::PassConfig;
use crate::error::{EngineError, Result};
use crate::providers::{OrderRepository, PassInsert, PassRepository, TransferInsert};
use crate::types::{
    BuyerId, InitiatedTransfer, IssuedPass, OrderId, OrderStatus, Pass, PassId, PassState,
    TransferId, TransferRequest, TransferStatus,
};
use crate::utils::{generate_token, hash_token};
use chrono::Utc;
use std::sync::Arc;

/// Issues entry passes for paid orders and owns their rotation and
/// transfer transitions.
///
/// Bearer secrets are generated here with a CSPRNG and handed out exactly
/// once per hash; only SHA-256 hashes reach the store.
pub struct PassIssuer<O, P> {
    orders: Arc<O>,
    passes: Arc<P>,
    config: PassConfig,
}

impl<O, P> PassIssuer<O, P>
where
    O: OrderRepository,
    P: PassRepository,
{
    /// Create an issuer over the given repositories.
    pub const fn new(orders: Arc<O>, passes: Arc<P>, config: PassConfig) -> Self {
        Self {
            orders,
            passes,
            config,
        }
    }

    /// Ensure a pass exists for a paid order.
    ///
    /// Idempotent per order: reconciliation may invoke this more than once
    /// under retry, and only the invocation that actually creates the pass
    /// receives the raw bearer secret (`secret: Some`).
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] for an unknown order,
    /// [`EngineError::NotEligible`] when the order is not `Paid`, or a
    /// retryable store error.
    pub async fn issue_for(&self, order_id: OrderId) -> Result<IssuedPass> {
        let order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        if order.status != OrderStatus::Paid {
            return Err(EngineError::NotEligible {
                reason: format!("order is {}", order.status.as_str()),
            });
        }

        let secret = generate_token();
        let now = Utc::now();
        let candidate = Pass {
            id: PassId::new(),
            order_id,
            owner_id: order.buyer_id,
            zone: order.zone.clone(),
            gate: None,
            token_hash: hash_token(&secret),
            state: PassState::Issued,
            used_by: None,
            used_at: None,
            created_at: now,
            updated_at: now,
        };

        match self.passes.insert_pass_if_absent(candidate).await? {
            PassInsert::Created(pass) => {
                tracing::info!(order_id = %order_id, pass_id = %pass.id, "pass issued");
                Ok(IssuedPass {
                    pass,
                    secret: Some(secret),
                })
            }
            PassInsert::Existing(pass) => Ok(IssuedPass { pass, secret: None }),
        }
    }

    /// Rotate the bearer secret of a live pass.
    ///
    /// The old hash is invalidated and the new one activated in a single
    /// conditional update; verification in flight against the old token
    /// fails cleanly afterwards.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] for an unknown pass,
    /// [`EngineError::PassNotActive`] when the pass is already terminal, or
    /// a retryable store error.
    pub async fn rotate(&self, pass_id: PassId) -> Result<IssuedPass> {
        let secret = generate_token();
        let new_hash = hash_token(&secret);

        match self
            .passes
            .rotate_token(pass_id, &new_hash, Utc::now())
            .await?
        {
            Some(pass) => {
                tracing::info!(pass_id = %pass_id, "pass rotated");
                Ok(IssuedPass {
                    pass,
                    secret: Some(secret),
                })
            }
            None => match self.passes.get_pass(pass_id).await? {
                Some(_) => Err(EngineError::PassNotActive),
                None => Err(EngineError::NotFound),
            },
        }
    }

    /// Offer a pass to another holder.
    ///
    /// Produces a single-use claim token with a short expiry. Fails when
    /// the pass is terminal or a pending transfer already exists.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`], [`EngineError::NotTransferable`],
    /// [`EngineError::TransferAlreadyPending`], or a retryable store
    /// error.
    pub async fn initiate_transfer(
        &self,
        pass_id: PassId,
        initiator: BuyerId,
    ) -> Result<InitiatedTransfer> {
        let pass = self
            .passes
            .get_pass(pass_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        if !pass.state.is_live() {
            return Err(EngineError::NotTransferable);
        }
        if pass.owner_id.is_some_and(|owner| owner != initiator) {
            return Err(EngineError::NotTransferable);
        }

        let claim_token = generate_token();
        let now = Utc::now();
        let request = TransferRequest {
            id: TransferId::new(),
            pass_id,
            initiator_id: initiator,
            claim_token_hash: hash_token(&claim_token),
            status: TransferStatus::Pending,
            created_at: now,
            expires_at: now + self.config.transfer_ttl,
        };

        match self.passes.insert_transfer(request).await? {
            TransferInsert::Created(transfer) => {
                tracing::info!(pass_id = %pass_id, transfer_id = %transfer.id, "transfer initiated");
                Ok(InitiatedTransfer {
                    transfer,
                    claim_token,
                })
            }
            TransferInsert::PendingExists => Err(EngineError::TransferAlreadyPending),
        }
    }

    /// Claim a transfer with its single-use token.
    ///
    /// The conditional update on the transfer status is the single-winner
    /// point: of two simultaneous claims, exactly one proceeds to revoke
    /// the source pass and receive a fresh pass (zone and gate preserved);
    /// the other gets [`EngineError::TransferNotClaimable`].
    ///
    /// # Errors
    ///
    /// [`EngineError::TransferNotClaimable`] for an unknown, expired,
    /// already-claimed, or raced-away token;
    /// [`EngineError::NotTransferable`] when the source pass was consumed
    /// before the claim landed; or a retryable store error.
    pub async fn claim_transfer(&self, claim_token: &str, claimant: BuyerId) -> Result<IssuedPass> {
        let transfer = self
            .passes
            .find_transfer_by_claim_hash(&hash_token(claim_token))
            .await?
            .ok_or(EngineError::TransferNotClaimable)?;

        let now = Utc::now();
        if now > transfer.expires_at {
            // Persist the lapse while we are here; losing this CAS is fine.
            let _ = self.passes.expire_transfer(transfer.id).await?;
            return Err(EngineError::TransferNotClaimable);
        }

        let Some(claimed) = self.passes.claim_transfer(transfer.id).await? else {
            return Err(EngineError::TransferNotClaimable);
        };

        let Some(revoked) = self.passes.revoke(claimed.pass_id, now).await? else {
            // The pass was consumed or revoked between initiation and
            // claim; the claim stands recorded but no new entitlement may
            // be minted from a dead pass.
            tracing::warn!(
                transfer_id = %claimed.id,
                pass_id = %claimed.pass_id,
                "transfer claimed against a terminal pass"
            );
            return Err(EngineError::NotTransferable);
        };

        let secret = generate_token();
        let reissued = Pass {
            id: PassId::new(),
            order_id: revoked.order_id,
            owner_id: Some(claimant),
            zone: revoked.zone.clone(),
            gate: revoked.gate.clone(),
            token_hash: hash_token(&secret),
            state: PassState::Issued,
            used_by: None,
            used_at: None,
            created_at: now,
            updated_at: now,
        };

        match self.passes.insert_pass_if_absent(reissued).await? {
            PassInsert::Created(pass) => {
                tracing::info!(
                    transfer_id = %claimed.id,
                    pass_id = %pass.id,
                    "transfer claimed, pass reissued"
                );
                Ok(IssuedPass {
                    pass,
                    secret: Some(secret),
                })
            }
            // Another live pass for the order exists; hand it back rather
            // than minting a second entitlement.
            PassInsert::Existing(pass) => Ok(IssuedPass { pass, secret: None }),
        }
    }

    /// Withdraw a pending transfer.
    ///
    /// # Errors
    ///
    /// [`EngineError::TransferNotClaimable`] when the transfer is not
    /// pending, or a retryable store error.
    pub async fn cancel_transfer(&self, transfer_id: TransferId) -> Result<TransferRequest> {
        self.passes
            .cancel_transfer(transfer_id)
            .await?
            .ok_or(EngineError::TransferNotClaimable)
    }
}
