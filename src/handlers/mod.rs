//! Axum HTTP handlers.
//!
//! A thin surface over the services: checkout and order reads for the
//! storefront, the parsed-SMS ingestion endpoint for the pipeline, and
//! `verify-pass` plus the transfer endpoints for steward and buyer
//! tooling. Page rendering, sessions, and the admin UI live elsewhere.

pub mod gate;
pub mod orders;
pub mod passes;
pub mod payments;

use crate::error::EngineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Shared handler state: the services, constructed once per process.
pub struct AppState<O, P, N, R> {
    /// Order lifecycle service.
    pub orders: Arc<crate::TicketOrderService<O, P>>,
    /// Pass issuance and transfers.
    pub issuer: Arc<crate::PassIssuer<O, P>>,
    /// Gate verification.
    pub gate: Arc<crate::GateVerifier<P>>,
    /// Payment reconciliation.
    pub matcher: Arc<crate::PaymentMatcher<O, P, N>>,
    /// Checkout rate limiter, keyed by buyer MSISDN.
    pub limiter: Arc<R>,
}

impl<O, P, N, R> Clone for AppState<O, P, N, R> {
    fn clone(&self) -> Self {
        Self {
            orders: Arc::clone(&self.orders),
            issuer: Arc::clone(&self.issuer),
            gate: Arc::clone(&self.gate),
            matcher: Arc::clone(&self.matcher),
            limiter: Arc::clone(&self.limiter),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable error code.
    pub error: String,
    /// Human-readable detail.
    pub message: String,
    /// Seconds until a retry may succeed, for retryable errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Wrapper mapping [`EngineError`] onto HTTP responses.
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, code, retry_after_secs) = match &err {
            EngineError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", None),
            EngineError::BreakerOpen { retry_after, .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "upstream_unavailable",
                Some(retry_after.as_secs()),
            ),
            EngineError::Timeout { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "upstream_timeout", None)
            }
            EngineError::TooManyAttempts { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                "too_many_attempts",
                Some(retry_after.as_secs()),
            ),
            EngineError::NotFound => (StatusCode::NOT_FOUND, "not_found", None),
            EngineError::NotCancellable => (StatusCode::CONFLICT, "not_cancellable", None),
            EngineError::NotEligible { .. } => (StatusCode::CONFLICT, "not_eligible", None),
            EngineError::SoldOut { .. } => (StatusCode::CONFLICT, "sold_out", None),
            EngineError::TransferAlreadyPending => {
                (StatusCode::CONFLICT, "transfer_already_pending", None)
            }
            EngineError::NotTransferable => (StatusCode::CONFLICT, "not_transferable", None),
            EngineError::TransferNotClaimable => {
                (StatusCode::CONFLICT, "invalid_or_claimed", None)
            }
            EngineError::PassNotActive => (StatusCode::CONFLICT, "pass_not_active", None),
            EngineError::InvalidEvent { .. } | EngineError::InvalidRequest { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_request", None)
            }
        };

        let body = ErrorBody {
            error: code.to_string(),
            message: err.to_string(),
            retry_after_secs,
        };
        (status, Json(body)).into_response()
    }
}

/// Handler result alias.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
