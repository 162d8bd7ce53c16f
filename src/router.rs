//! HTTP router composition.
//!
//! Composes the handlers into a single Axum router.

use crate::handlers::{self, AppState};
use crate::providers::{MatchNotifier, OrderRepository, PassRepository, RateLimiter};
use axum::routing::{get, post};
use axum::Router;

/// Create the matchday core router.
///
/// # Routes
///
/// ## Orders
/// - `POST /orders` — checkout (pending order + USSD string)
/// - `GET /orders/:id` — snapshot with lazy expiry
/// - `POST /orders/:id/cancel` — cancel while pending
///
/// ## Payments
/// - `POST /payments/events` — parsed-SMS reconciliation (idempotent)
///
/// ## Gate
/// - `POST /gate/verify` — verify a pass token (`dry_run` supported)
///
/// ## Passes
/// - `POST /passes/:id/rotate` — rotate the bearer secret
/// - `POST /passes/:id/transfer` — initiate a transfer
/// - `POST /transfers/claim` — claim with a single-use token
///
/// # Example
///
/// ```rust,ignore
/// let app = axum::Router::new()
///     .nest("/api/v1", matchday_core::router::core_router(state));
/// ```
pub fn core_router<O, P, N, R>(state: AppState<O, P, N, R>) -> Router
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    N: MatchNotifier + 'static,
    R: RateLimiter + 'static,
{
    Router::new()
        // Orders
        .route("/orders", post(handlers::orders::create_order::<O, P, N, R>))
        .route("/orders/:id", get(handlers::orders::get_order::<O, P, N, R>))
        .route(
            "/orders/:id/cancel",
            post(handlers::orders::cancel_order::<O, P, N, R>),
        )
        // Payments
        .route(
            "/payments/events",
            post(handlers::payments::ingest_event::<O, P, N, R>),
        )
        // Gate
        .route("/gate/verify", post(handlers::gate::verify_pass::<O, P, N, R>))
        // Passes
        .route(
            "/passes/:id/rotate",
            post(handlers::passes::rotate_pass::<O, P, N, R>),
        )
        .route(
            "/passes/:id/transfer",
            post(handlers::passes::initiate_transfer::<O, P, N, R>),
        )
        .route(
            "/transfers/claim",
            post(handlers::passes::claim_transfer::<O, P, N, R>),
        )
        .with_state(state)
}
