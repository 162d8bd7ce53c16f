//! Pass rotation and transfer handlers.

use super::{ApiResult, AppState};
use crate::providers::{MatchNotifier, OrderRepository, PassRepository, RateLimiter};
use crate::types::{BuyerId, PassId};
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pass handed back to its holder, with the raw secret when one was
/// freshly generated.
#[derive(Debug, Clone, Serialize)]
pub struct PassResponse {
    /// Pass identifier.
    pub pass_id: Uuid,
    /// Pass state.
    pub state: &'static str,
    /// Zone the pass admits to.
    pub zone: String,
    /// Raw bearer secret; present exactly once, on issuance or rotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl From<crate::types::IssuedPass> for PassResponse {
    fn from(issued: crate::types::IssuedPass) -> Self {
        Self {
            pass_id: *issued.pass.id.as_uuid(),
            state: issued.pass.state.as_str(),
            zone: issued.pass.zone.to_string(),
            secret: issued.secret,
        }
    }
}

/// Transfer initiation request.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiateTransferRequest {
    /// Holder initiating the transfer.
    pub initiator_id: Uuid,
}

/// Transfer initiation response.
#[derive(Debug, Clone, Serialize)]
pub struct InitiateTransferResponse {
    /// Transfer identifier.
    pub transfer_id: Uuid,
    /// Single-use claim token for the recipient; shown exactly once.
    pub claim_token: String,
    /// End of the claim window.
    pub expires_at: DateTime<Utc>,
}

/// Transfer claim request.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimTransferRequest {
    /// The single-use claim token.
    pub claim_token: String,
    /// Claiming buyer.
    pub claimant_id: Uuid,
}

/// Rotate a pass's bearer secret.
///
/// # Endpoint
///
/// ```text
/// POST /passes/:id/rotate
/// ```
pub async fn rotate_pass<O, P, N, R>(
    State(state): State<AppState<O, P, N, R>>,
    Path(pass_id): Path<Uuid>,
) -> ApiResult<Json<PassResponse>>
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    N: MatchNotifier + 'static,
    R: RateLimiter + 'static,
{
    let rotated = state.issuer.rotate(PassId::from_uuid(pass_id)).await?;
    Ok(Json(rotated.into()))
}

/// Offer a pass to another holder.
///
/// # Endpoint
///
/// ```text
/// POST /passes/:id/transfer
/// { "initiator_id": "..." }
/// ```
pub async fn initiate_transfer<O, P, N, R>(
    State(state): State<AppState<O, P, N, R>>,
    Path(pass_id): Path<Uuid>,
    Json(req): Json<InitiateTransferRequest>,
) -> ApiResult<Json<InitiateTransferResponse>>
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    N: MatchNotifier + 'static,
    R: RateLimiter + 'static,
{
    let initiated = state
        .issuer
        .initiate_transfer(
            PassId::from_uuid(pass_id),
            BuyerId::from_uuid(req.initiator_id),
        )
        .await?;

    Ok(Json(InitiateTransferResponse {
        transfer_id: *initiated.transfer.id.as_uuid(),
        claim_token: initiated.claim_token,
        expires_at: initiated.transfer.expires_at,
    }))
}

/// Claim a transferred pass.
///
/// # Endpoint
///
/// ```text
/// POST /transfers/claim
/// { "claim_token": "...", "claimant_id": "..." }
/// ```
///
/// Of two concurrent claims with the same token, exactly one receives a
/// pass; the other gets `409 invalid_or_claimed`.
pub async fn claim_transfer<O, P, N, R>(
    State(state): State<AppState<O, P, N, R>>,
    Json(req): Json<ClaimTransferRequest>,
) -> ApiResult<Json<PassResponse>>
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    N: MatchNotifier + 'static,
    R: RateLimiter + 'static,
{
    let claimed = state
        .issuer
        .claim_transfer(&req.claim_token, BuyerId::from_uuid(req.claimant_id))
        .await?;
    Ok(Json(claimed.into()))
}
