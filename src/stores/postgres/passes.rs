//! PostgreSQL pass and transfer repository.

use super::store_err;
use crate::error::{EngineError, Result};
use crate::providers::{PassInsert, PassRepository, TransferInsert};
use crate::types::{
    BuyerId, OrderId, Pass, PassId, PassState, TransferId, TransferRequest, TransferStatus, Zone,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const PASS_COLUMNS: &str =
    "id, order_id, owner_id, zone, gate, token_hash, state, used_by, used_at, \
     created_at, updated_at";

const TRANSFER_COLUMNS: &str =
    "id, pass_id, initiator_id, claim_token_hash, status, created_at, expires_at";

/// PostgreSQL [`PassRepository`].
#[derive(Clone)]
pub struct PostgresPassRepository {
    pool: PgPool,
}

impl PostgresPassRepository {
    /// Create a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn pass_from_row(row: &PgRow) -> Result<Pass> {
    let read = |e: sqlx::Error| EngineError::Store(format!("corrupt pass row: {e}"));
    Ok(Pass {
        id: PassId::from_uuid(row.try_get("id").map_err(read)?),
        order_id: OrderId::from_uuid(row.try_get("order_id").map_err(read)?),
        owner_id: row
            .try_get::<Option<Uuid>, _>("owner_id")
            .map_err(read)?
            .map(BuyerId::from_uuid),
        zone: Zone::new(row.try_get::<String, _>("zone").map_err(read)?),
        gate: row.try_get("gate").map_err(read)?,
        token_hash: row.try_get("token_hash").map_err(read)?,
        state: parse_pass_state(&row.try_get::<String, _>("state").map_err(read)?)?,
        used_by: row.try_get("used_by").map_err(read)?,
        used_at: row.try_get("used_at").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
        updated_at: row.try_get("updated_at").map_err(read)?,
    })
}

fn transfer_from_row(row: &PgRow) -> Result<TransferRequest> {
    let read = |e: sqlx::Error| EngineError::Store(format!("corrupt transfer row: {e}"));
    Ok(TransferRequest {
        id: TransferId::from_uuid(row.try_get("id").map_err(read)?),
        pass_id: PassId::from_uuid(row.try_get("pass_id").map_err(read)?),
        initiator_id: BuyerId::from_uuid(row.try_get("initiator_id").map_err(read)?),
        claim_token_hash: row.try_get("claim_token_hash").map_err(read)?,
        status: parse_transfer_status(&row.try_get::<String, _>("status").map_err(read)?)?,
        created_at: row.try_get("created_at").map_err(read)?,
        expires_at: row.try_get("expires_at").map_err(read)?,
    })
}

fn parse_pass_state(state: &str) -> Result<PassState> {
    match state {
        "issued" => Ok(PassState::Issued),
        "active" => Ok(PassState::Active),
        "used" => Ok(PassState::Used),
        "revoked" => Ok(PassState::Revoked),
        other => Err(EngineError::Store(format!("unknown pass state {other}"))),
    }
}

fn parse_transfer_status(status: &str) -> Result<TransferStatus> {
    match status {
        "pending" => Ok(TransferStatus::Pending),
        "claimed" => Ok(TransferStatus::Claimed),
        "expired" => Ok(TransferStatus::Expired),
        "cancelled" => Ok(TransferStatus::Cancelled),
        other => Err(EngineError::Store(format!(
            "unknown transfer status {other}"
        ))),
    }
}

impl PassRepository for PostgresPassRepository {
    async fn insert_pass_if_absent(&self, pass: Pass) -> Result<PassInsert> {
        // The partial unique index on (order_id) WHERE state <> 'revoked'
        // is the issuance idempotency guard.
        let inserted = sqlx::query(&format!(
            "INSERT INTO passes ({PASS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (order_id) WHERE state <> 'revoked' DO NOTHING"
        ))
        .bind(*pass.id.as_uuid())
        .bind(*pass.order_id.as_uuid())
        .bind(pass.owner_id.map(|id| *id.as_uuid()))
        .bind(pass.zone.as_str())
        .bind(pass.gate.clone())
        .bind(pass.token_hash.clone())
        .bind(pass.state.as_str())
        .bind(pass.used_by.clone())
        .bind(pass.used_at)
        .bind(pass.created_at)
        .bind(pass.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("failed to insert pass", e))?;

        if inserted.rows_affected() == 0 {
            let existing = self
                .find_current_by_order(pass.order_id)
                .await?
                .ok_or_else(|| EngineError::Store("pass vanished under conflict".into()))?;
            return Ok(PassInsert::Existing(existing));
        }
        Ok(PassInsert::Created(pass))
    }

    async fn get_pass(&self, id: PassId) -> Result<Option<Pass>> {
        let row = sqlx::query(&format!("SELECT {PASS_COLUMNS} FROM passes WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_err("failed to get pass", e))?;

        row.as_ref().map(pass_from_row).transpose()
    }

    async fn find_current_by_order(&self, order_id: OrderId) -> Result<Option<Pass>> {
        let row = sqlx::query(&format!(
            "SELECT {PASS_COLUMNS} FROM passes \
             WHERE order_id = $1 AND state <> 'revoked' \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(*order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to find pass for order", e))?;

        row.as_ref().map(pass_from_row).transpose()
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Pass>> {
        let row = sqlx::query(&format!(
            "SELECT {PASS_COLUMNS} FROM passes WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to look up token", e))?;

        row.as_ref().map(pass_from_row).transpose()
    }

    async fn rotate_token(
        &self,
        id: PassId,
        new_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Pass>> {
        let row = sqlx::query(&format!(
            "UPDATE passes SET token_hash = $1, state = 'active', updated_at = $2 \
             WHERE id = $3 AND state IN ('issued', 'active') RETURNING {PASS_COLUMNS}"
        ))
        .bind(new_hash)
        .bind(now)
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to rotate pass", e))?;

        row.as_ref().map(pass_from_row).transpose()
    }

    async fn consume(&self, id: PassId, steward: &str, now: DateTime<Utc>) -> Result<Option<Pass>> {
        // `used` is reachable only from a live state; a raced second scan
        // matches zero rows and the verifier reports `already_used`.
        let row = sqlx::query(&format!(
            "UPDATE passes SET state = 'used', used_by = $1, used_at = $2, updated_at = $2 \
             WHERE id = $3 AND state IN ('issued', 'active') RETURNING {PASS_COLUMNS}"
        ))
        .bind(steward)
        .bind(now)
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to consume pass", e))?;

        row.as_ref().map(pass_from_row).transpose()
    }

    async fn revoke(&self, id: PassId, now: DateTime<Utc>) -> Result<Option<Pass>> {
        let row = sqlx::query(&format!(
            "UPDATE passes SET state = 'revoked', updated_at = $1 \
             WHERE id = $2 AND state IN ('issued', 'active') RETURNING {PASS_COLUMNS}"
        ))
        .bind(now)
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to revoke pass", e))?;

        row.as_ref().map(pass_from_row).transpose()
    }

    async fn insert_transfer(&self, transfer: TransferRequest) -> Result<TransferInsert> {
        // The partial unique index on (pass_id) WHERE status = 'pending'
        // enforces one outstanding transfer per pass.
        let inserted = sqlx::query(&format!(
            "INSERT INTO pass_transfers ({TRANSFER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (pass_id) WHERE status = 'pending' DO NOTHING"
        ))
        .bind(*transfer.id.as_uuid())
        .bind(*transfer.pass_id.as_uuid())
        .bind(*transfer.initiator_id.as_uuid())
        .bind(transfer.claim_token_hash.clone())
        .bind(transfer.status.as_str())
        .bind(transfer.created_at)
        .bind(transfer.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("failed to insert transfer", e))?;

        if inserted.rows_affected() == 0 {
            return Ok(TransferInsert::PendingExists);
        }
        Ok(TransferInsert::Created(transfer))
    }

    async fn find_transfer_by_claim_hash(
        &self,
        claim_token_hash: &str,
    ) -> Result<Option<TransferRequest>> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM pass_transfers WHERE claim_token_hash = $1"
        ))
        .bind(claim_token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to look up transfer", e))?;

        row.as_ref().map(transfer_from_row).transpose()
    }

    async fn claim_transfer(&self, id: TransferId) -> Result<Option<TransferRequest>> {
        self.transition_transfer(id, TransferStatus::Claimed).await
    }

    async fn expire_transfer(&self, id: TransferId) -> Result<Option<TransferRequest>> {
        self.transition_transfer(id, TransferStatus::Expired).await
    }

    async fn cancel_transfer(&self, id: TransferId) -> Result<Option<TransferRequest>> {
        self.transition_transfer(id, TransferStatus::Cancelled).await
    }
}

impl PostgresPassRepository {
    /// CAS a transfer out of `Pending`; the claim path is the
    /// single-winner guard of the transfer protocol.
    async fn transition_transfer(
        &self,
        id: TransferId,
        to: TransferStatus,
    ) -> Result<Option<TransferRequest>> {
        let row = sqlx::query(&format!(
            "UPDATE pass_transfers SET status = $1 \
             WHERE id = $2 AND status = 'pending' RETURNING {TRANSFER_COLUMNS}"
        ))
        .bind(to.as_str())
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to transition transfer", e))?;

        row.as_ref().map(transfer_from_row).transpose()
    }
}
