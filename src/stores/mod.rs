//! Store implementations.
//!
//! - [`RedisRateLimiter`]: fixed-window counters in Redis with an
//!   in-process fallback when Redis is unreachable.
//! - `postgres` (feature-gated): relational repositories whose state
//!   transitions are all conditional `UPDATE ... WHERE status = $n`
//!   statements.

pub mod rate_limiter_redis;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use rate_limiter_redis::RedisRateLimiter;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresOrderRepository, PostgresPassRepository};
