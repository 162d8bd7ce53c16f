//! Checkout and order lifecycle handlers.

use super::{ApiError, ApiResult, AppState};
use crate::providers::{MatchNotifier, OrderRepository, PassRepository, RateLimiter};
use crate::types::{BuyerId, MatchId, OrderId, OrderSnapshot};
use crate::utils::normalize_msisdn;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Checkout request.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    /// Fixture to buy into.
    pub match_id: Uuid,
    /// Zone code.
    pub zone: String,
    /// Number of seats.
    pub quantity: u32,
    /// Buyer account; omitted for guest checkout.
    pub buyer_id: Option<Uuid>,
    /// Buyer phone number, used as the rate-limit key.
    pub msisdn: Option<String>,
}

/// Checkout response: the pending order and what to dial.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    /// The created order, lazy expiry applied (trivially fresh here).
    pub order: OrderSnapshot,
    /// Tap-to-dial URI for the USSD payment string.
    pub tel_uri: String,
}

/// Cancel request.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelRequest {
    /// Requesting buyer; omitted for system-initiated cancellation.
    pub requester_id: Option<Uuid>,
}

/// Create a pending order.
///
/// # Endpoint
///
/// ```text
/// POST /orders
/// { "match_id": "...", "zone": "EAST", "quantity": 2, "msisdn": "+250788123456" }
/// ```
///
/// Rate limited per buyer phone number; guests without an MSISDN share a
/// single bucket.
pub async fn create_order<O, P, N, R>(
    State(state): State<AppState<O, P, N, R>>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)>
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    N: MatchNotifier + 'static,
    R: RateLimiter + 'static,
{
    let rate_key = req
        .msisdn
        .as_deref()
        .and_then(normalize_msisdn)
        .unwrap_or_else(|| "guest".to_string());
    state.limiter.consume(&rate_key).await?.require()?;

    let order = state
        .orders
        .create_pending_order(
            MatchId::from_uuid(req.match_id),
            &req.zone,
            req.quantity,
            req.buyer_id.map(BuyerId::from_uuid),
        )
        .await?;

    let tel_uri = crate::ussd::tel_uri(&order.ussd_code);
    let snapshot = OrderSnapshot::project(&order, chrono::Utc::now());
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order: snapshot,
            tel_uri,
        }),
    ))
}

/// Read one order, lazy expiry applied.
pub async fn get_order<O, P, N, R>(
    State(state): State<AppState<O, P, N, R>>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderSnapshot>>
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    N: MatchNotifier + 'static,
    R: RateLimiter + 'static,
{
    let snapshot = state
        .orders
        .get_order_snapshot(OrderId::from_uuid(order_id))
        .await?
        .ok_or(ApiError(crate::EngineError::NotFound))?;
    Ok(Json(snapshot))
}

/// Cancel a pending order.
pub async fn cancel_order<O, P, N, R>(
    State(state): State<AppState<O, P, N, R>>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<CancelRequest>,
) -> ApiResult<Json<OrderSnapshot>>
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    N: MatchNotifier + 'static,
    R: RateLimiter + 'static,
{
    let cancelled = state
        .orders
        .cancel_pending_order(
            OrderId::from_uuid(order_id),
            req.requester_id.map(BuyerId::from_uuid),
        )
        .await?;
    Ok(Json(OrderSnapshot::project(&cancelled, chrono::Utc::now())))
}
