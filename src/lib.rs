//! # Matchday Core
//!
//! Ticket order payment reconciliation and entry-pass lifecycle for a
//! club fan-engagement platform.
//!
//! There is no card gateway and no payment webhook here: buyers pay by
//! dialling a USSD string, the provider's SMS notification is parsed
//! upstream, and this crate reconciles those parsed events against pending
//! orders — idempotently, because the pipeline delivers at-least-once.
//! Matched orders get a cryptographically opaque entry pass whose
//! rotation, transfer, and gate verification are governed by conditional
//! state transitions at the store layer.
//!
//! ## Components
//!
//! - [`matcher::PaymentMatcher`] — reconciles one parsed SMS event against
//!   pending orders; unmatched money becomes an unattributed donation.
//! - [`passes::PassIssuer`] — idempotent pass issuance, secret rotation,
//!   and the single-winner transfer protocol.
//! - [`gate::GateVerifier`] — dry-run and live token verification with
//!   reason codes, exactly-once consumption under concurrent scans.
//! - [`orders::TicketOrderService`] — checkout, cancellation, lazy expiry,
//!   and the manual admin triggers.
//! - [`resilience::CircuitBreaker`] and
//!   [`providers::RateLimiter`] — the shared resilience primitives.
//!
//! ## Concurrency
//!
//! All race resolution is pushed to the store's conditional-update
//! primitive (`UPDATE ... WHERE status = $n`); no distributed locks, no
//! background sweepers. Expiry is checked lazily on reads and persisted on
//! the next mutation path.
//!
//! ## Example
//!
//! ```
//! use matchday_core::config::{Config, OrderConfig, ZoneDef};
//! use matchday_core::mocks::{MockOrderRepository, MockPassRepository};
//! use matchday_core::orders::TicketOrderService;
//! use matchday_core::types::{MatchId, Money};
//! use std::sync::Arc;
//!
//! # async fn example() -> matchday_core::Result<()> {
//! let orders = Arc::new(MockOrderRepository::new());
//! let passes = Arc::new(MockPassRepository::new());
//! let config = OrderConfig::default()
//!     .with_zones(vec![ZoneDef::new("EAST", Money::from_minor(1500), 5000)]);
//!
//! let service = TicketOrderService::new(orders, passes, config);
//! let order = service
//!     .create_pending_order(MatchId::new(), "EAST", 2, None)
//!     .await?;
//! assert_eq!(order.total, Money::from_minor(3000));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod error;
pub mod gate;
pub mod matcher;
pub mod orders;
pub mod passes;
pub mod providers;
pub mod resilience;
pub mod stores;
pub mod types;
pub mod ussd;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

#[cfg(feature = "axum")]
pub mod handlers;
#[cfg(feature = "axum")]
pub mod router;

// Re-export main types for convenience
pub use error::{EngineError, Result};
pub use gate::GateVerifier;
pub use matcher::PaymentMatcher;
pub use orders::TicketOrderService;
pub use passes::PassIssuer;
pub use resilience::{CircuitBreaker, CircuitBreakerConfig};
