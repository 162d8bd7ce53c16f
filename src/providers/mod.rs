//! Provider traits: the seams between the services and their
//! collaborators.
//!
//! Every trait here abstracts a store or an outbound dependency. The
//! conditional-update methods are the concurrency model: each documents the
//! atomicity it requires, and implementations must honour it (relational
//! stores via `UPDATE ... WHERE status = $n`, the in-memory mocks via a
//! single lock).

pub mod notifier;
pub mod order_repository;
pub mod pass_repository;
pub mod rate_limiter;

pub use notifier::MatchNotifier;
pub use order_repository::{MatchCommit, OrderRepository, PaymentInsert};
pub use pass_repository::{PassInsert, PassRepository, TransferInsert};
pub use rate_limiter::{RateDecision, RateLimiter};
