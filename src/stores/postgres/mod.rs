//! PostgreSQL repositories.
//!
//! Every lifecycle transition is a conditional
//! `UPDATE ... WHERE status = $n ... RETURNING`, and the two multi-row
//! commits (`commit_match`, the uniqueness-guarded inserts) run inside
//! transactions, so the concurrency contract of the provider traits holds
//! without any application-side locking.
//!
//! Queries use the runtime `sqlx` API (no compile-time verification), so
//! the crate builds without a `DATABASE_URL`. Schema migrations are owned
//! by the surrounding platform; the expected tables are:
//!
//! ```sql
//! CREATE TABLE ticket_orders (
//!     id                UUID PRIMARY KEY,
//!     buyer_id          UUID,
//!     match_id          UUID NOT NULL,
//!     zone              TEXT NOT NULL,
//!     quantity          INTEGER NOT NULL,
//!     total             BIGINT NOT NULL,
//!     status            TEXT NOT NULL,
//!     payment_reference TEXT,
//!     ussd_code         TEXT NOT NULL,
//!     created_at        TIMESTAMPTZ NOT NULL,
//!     expires_at        TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE payments (
//!     id               UUID PRIMARY KEY,
//!     order_id         UUID REFERENCES ticket_orders (id),
//!     kind             TEXT NOT NULL,
//!     amount           BIGINT NOT NULL,
//!     status           TEXT NOT NULL,
//!     source_reference TEXT NOT NULL UNIQUE,
//!     payer_reference  TEXT,
//!     received_at      TIMESTAMPTZ NOT NULL,
//!     created_at       TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE passes (
//!     id         UUID PRIMARY KEY,
//!     order_id   UUID NOT NULL REFERENCES ticket_orders (id),
//!     owner_id   UUID,
//!     zone       TEXT NOT NULL,
//!     gate       TEXT,
//!     token_hash TEXT NOT NULL,
//!     state      TEXT NOT NULL,
//!     used_by    TEXT,
//!     used_at    TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE UNIQUE INDEX passes_live_per_order
//!     ON passes (order_id) WHERE state <> 'revoked';
//! CREATE INDEX passes_token_hash ON passes (token_hash);
//!
//! CREATE TABLE pass_transfers (
//!     id               UUID PRIMARY KEY,
//!     pass_id          UUID NOT NULL REFERENCES passes (id),
//!     initiator_id     UUID NOT NULL,
//!     claim_token_hash TEXT NOT NULL,
//!     status           TEXT NOT NULL,
//!     created_at       TIMESTAMPTZ NOT NULL,
//!     expires_at       TIMESTAMPTZ NOT NULL
//! );
//! CREATE UNIQUE INDEX transfers_pending_per_pass
//!     ON pass_transfers (pass_id) WHERE status = 'pending';
//! ```

mod orders;
mod passes;

pub use orders::PostgresOrderRepository;
pub use passes::PostgresPassRepository;

use crate::error::EngineError;

/// Map any sqlx error into the retryable store error.
pub(crate) fn store_err(context: &str, err: sqlx::Error) -> EngineError {
    EngineError::Store(format!("{context}: {err}"))
}
