//! In-memory pass and transfer repository for testing.

use crate::error::{EngineError, Result};
use crate::providers::{PassInsert, PassRepository, TransferInsert};
use crate::types::{
    OrderId, Pass, PassId, PassState, TransferId, TransferRequest, TransferStatus,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    passes: HashMap<PassId, Pass>,
    transfers: HashMap<TransferId, TransferRequest>,
}

/// In-memory [`PassRepository`].
///
/// One mutex over passes and transfers together; guard checks and
/// mutations happen under a single lock acquisition, matching the
/// conditional-update contract.
#[derive(Clone, Default)]
pub struct MockPassRepository {
    inner: Arc<Mutex<Inner>>,
}

impl MockPassRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pass rows currently held.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn pass_count(&self) -> usize {
        self.inner.lock().unwrap().passes.len()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| EngineError::Store("mutex poisoned".into()))
    }
}

impl PassRepository for MockPassRepository {
    async fn insert_pass_if_absent(&self, pass: Pass) -> Result<PassInsert> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner
            .passes
            .values()
            .find(|p| p.order_id == pass.order_id && p.state != PassState::Revoked)
        {
            return Ok(PassInsert::Existing(existing.clone()));
        }
        inner.passes.insert(pass.id, pass.clone());
        Ok(PassInsert::Created(pass))
    }

    async fn get_pass(&self, id: PassId) -> Result<Option<Pass>> {
        let inner = self.lock()?;
        Ok(inner.passes.get(&id).cloned())
    }

    async fn find_current_by_order(&self, order_id: OrderId) -> Result<Option<Pass>> {
        let inner = self.lock()?;
        Ok(inner
            .passes
            .values()
            .filter(|p| p.order_id == order_id && p.state != PassState::Revoked)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Pass>> {
        let inner = self.lock()?;
        Ok(inner
            .passes
            .values()
            .find(|p| p.token_hash == token_hash)
            .cloned())
    }

    async fn rotate_token(
        &self,
        id: PassId,
        new_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Pass>> {
        let mut inner = self.lock()?;
        match inner.passes.get_mut(&id) {
            Some(pass) if pass.state.is_live() => {
                pass.token_hash = new_hash.to_string();
                pass.state = PassState::Active;
                pass.updated_at = now;
                Ok(Some(pass.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn consume(&self, id: PassId, steward: &str, now: DateTime<Utc>) -> Result<Option<Pass>> {
        let mut inner = self.lock()?;
        match inner.passes.get_mut(&id) {
            Some(pass) if pass.state.is_live() => {
                pass.state = PassState::Used;
                pass.used_by = Some(steward.to_string());
                pass.used_at = Some(now);
                pass.updated_at = now;
                Ok(Some(pass.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn revoke(&self, id: PassId, now: DateTime<Utc>) -> Result<Option<Pass>> {
        let mut inner = self.lock()?;
        match inner.passes.get_mut(&id) {
            Some(pass) if pass.state.is_live() => {
                pass.state = PassState::Revoked;
                pass.updated_at = now;
                Ok(Some(pass.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn insert_transfer(&self, transfer: TransferRequest) -> Result<TransferInsert> {
        let mut inner = self.lock()?;
        let pending_exists = inner
            .transfers
            .values()
            .any(|t| t.pass_id == transfer.pass_id && t.status == TransferStatus::Pending);
        if pending_exists {
            return Ok(TransferInsert::PendingExists);
        }
        inner.transfers.insert(transfer.id, transfer.clone());
        Ok(TransferInsert::Created(transfer))
    }

    async fn find_transfer_by_claim_hash(
        &self,
        claim_token_hash: &str,
    ) -> Result<Option<TransferRequest>> {
        let inner = self.lock()?;
        Ok(inner
            .transfers
            .values()
            .find(|t| {
                constant_time_eq::constant_time_eq(
                    t.claim_token_hash.as_bytes(),
                    claim_token_hash.as_bytes(),
                )
            })
            .cloned())
    }

    async fn claim_transfer(&self, id: TransferId) -> Result<Option<TransferRequest>> {
        self.transition_transfer(id, TransferStatus::Claimed)
    }

    async fn expire_transfer(&self, id: TransferId) -> Result<Option<TransferRequest>> {
        self.transition_transfer(id, TransferStatus::Expired)
    }

    async fn cancel_transfer(&self, id: TransferId) -> Result<Option<TransferRequest>> {
        self.transition_transfer(id, TransferStatus::Cancelled)
    }
}

impl MockPassRepository {
    /// CAS a transfer out of `Pending`.
    fn transition_transfer(
        &self,
        id: TransferId,
        to: TransferStatus,
    ) -> Result<Option<TransferRequest>> {
        let mut inner = self.lock()?;
        match inner.transfers.get_mut(&id) {
            Some(transfer) if transfer.status == TransferStatus::Pending => {
                transfer.status = to;
                Ok(Some(transfer.clone()))
            }
            _ => Ok(None),
        }
    }
}
