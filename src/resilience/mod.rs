//! Shared resilience primitives.
//!
//! The circuit breaker lives here; the rate limiter is a provider trait
//! (`crate::providers::RateLimiter`) with shared-store and in-memory
//! implementations.

pub mod circuit_breaker;

pub use circuit_breaker::{
    BreakerError, BreakerOpen, CircuitBreaker, CircuitBreakerConfig, CircuitState,
};
