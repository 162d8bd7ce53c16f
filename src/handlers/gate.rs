//! Gate verification handler.

use super::{ApiResult, AppState};
use crate::providers::{MatchNotifier, OrderRepository, PassRepository, RateLimiter};
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Verify-pass request from steward tooling.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    /// The presented bearer token (scanned QR content).
    pub token: String,
    /// Pre-check only; never consumes the pass.
    #[serde(default)]
    pub dry_run: bool,
    /// Steward performing the scan.
    pub steward_id: String,
}

/// Verify-pass response.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    /// Whether the token admits (or would admit, in dry-run).
    pub valid: bool,
    /// Rejection reason code (`not_found`, `already_used`, `revoked`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// Zone the pass admits to, when a pass was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Assigned gate, when a pass was found and one is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<String>,
}

/// Verify a presented pass token.
///
/// # Endpoint
///
/// ```text
/// POST /gate/verify
/// { "token": "scanned-qr-content", "dry_run": false, "steward_id": "steward-7" }
/// ```
///
/// Rejections come back `200` with a reason code — the steward UI needs
/// `already_used`, not an error page.
pub async fn verify_pass<O, P, N, R>(
    State(state): State<AppState<O, P, N, R>>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<VerifyResponse>>
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    N: MatchNotifier + 'static,
    R: RateLimiter + 'static,
{
    let verification = state
        .gate
        .verify(&req.token, req.dry_run, &req.steward_id)
        .await?;

    Ok(Json(VerifyResponse {
        valid: verification.valid,
        reason: verification.reason.map(|r| r.as_str()),
        zone: verification.pass.as_ref().map(|p| p.zone.to_string()),
        gate: verification.pass.as_ref().and_then(|p| p.gate.clone()),
    }))
}
