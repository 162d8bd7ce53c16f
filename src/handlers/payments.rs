//! Parsed-SMS ingestion handler.

use super::{ApiResult, AppState};
use crate::providers::{MatchNotifier, OrderRepository, PassRepository, RateLimiter};
use crate::types::{ParsedSmsEvent, Reconciliation};
use axum::extract::State;
use axum::Json;

/// Reconcile one parsed SMS event.
///
/// # Endpoint
///
/// ```text
/// POST /payments/events
/// { "source_reference": "sms-01J...", "amount": 1500,
///   "reference": "MP240801.1234.A12345", "received_at": "..." }
/// ```
///
/// Idempotent on `source_reference`: the pipeline may POST the same event
/// any number of times. A `503` tells it to redeliver later; a `200` with
/// `reused: true` means this delivery was a replay.
pub async fn ingest_event<O, P, N, R>(
    State(state): State<AppState<O, P, N, R>>,
    Json(event): Json<ParsedSmsEvent>,
) -> ApiResult<Json<Reconciliation>>
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    N: MatchNotifier + 'static,
    R: RateLimiter + 'static,
{
    let outcome = state.matcher.reconcile(&event).await?;
    Ok(Json(outcome))
}
