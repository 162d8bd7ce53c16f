//! Redis-backed fixed-window rate limiter.
//!
//! # Algorithm
//!
//! One counter per key per window, with the window aligned to the epoch:
//! the Redis key is `rate:{key}:{window_id}` where
//! `window_id = now_secs / window_secs`. `INCR` + `EXPIRE` run in one
//! atomic pipeline, so two concurrent attempts never both observe the
//! pre-increment count.
//!
//! # Degradation
//!
//! When Redis is unreachable the limiter falls back to per-process
//! counters (reset on restart) rather than failing closed: a club selling
//! tickets on match day prefers a briefly laxer limit over a dead
//! checkout.

use crate::config::RateLimitConfig;
use crate::error::{EngineError, Result};
use crate::providers::{RateDecision, RateLimiter};
use redis::aio::ConnectionManager;
use redis::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Per-key fallback counter and window start.
struct LocalWindow {
    started_at: Instant,
    count: u32,
}

/// Redis fixed-window rate limiter with in-process fallback.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn_manager: ConnectionManager,
    config: RateLimitConfig,
    fallback: Arc<Mutex<HashMap<String, LocalWindow>>>,
}

impl RedisRateLimiter {
    /// Connect to Redis and build the limiter.
    ///
    /// # Errors
    ///
    /// Returns a store error when the connection cannot be established;
    /// after construction, Redis outages degrade to the in-process
    /// fallback instead of erroring.
    pub async fn new(redis_url: &str, config: RateLimitConfig) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| EngineError::Store(format!("failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| EngineError::Store(format!("failed to connect to Redis: {e}")))?;

        Ok(Self {
            conn_manager,
            config,
            fallback: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    fn window_secs(&self) -> u64 {
        self.config.window.as_secs().max(1)
    }

    /// Current epoch-aligned window id and seconds remaining in it.
    fn current_window(&self) -> (u64, Duration) {
        let now_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        let window_secs = self.window_secs();
        let remaining = window_secs - (now_secs % window_secs);
        (now_secs / window_secs, Duration::from_secs(remaining))
    }

    fn redis_key(key: &str, window_id: u64) -> String {
        format!("rate:{key}:{window_id}")
    }

    fn decision(&self, count: u32, remaining_in_window: Duration) -> RateDecision {
        if count <= self.config.max_attempts {
            RateDecision {
                allowed: true,
                remaining: self.config.max_attempts - count,
                retry_after: None,
            }
        } else {
            RateDecision {
                allowed: false,
                remaining: 0,
                retry_after: Some(remaining_in_window),
            }
        }
    }

    async fn consume_redis(&self, key: &str) -> std::result::Result<RateDecision, redis::RedisError> {
        let (window_id, remaining_in_window) = self.current_window();
        let rate_key = Self::redis_key(key, window_id);
        let mut conn = self.conn_manager.clone();

        // Atomic count: INCR decides, EXPIRE only bounds the key's life.
        #[allow(clippy::cast_possible_wrap)] // windows are small durations
        let (count,): (u32,) = redis::pipe()
            .atomic()
            .incr(&rate_key, 1u32)
            .expire(&rate_key, (self.window_secs() * 2) as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;

        let decision = self.decision(count, remaining_in_window);
        if !decision.allowed {
            tracing::warn!(
                rate_limit_exceeded = true,
                key = %key,
                attempts = count,
                max_attempts = self.config.max_attempts,
                "rate limit exceeded"
            );
        }
        Ok(decision)
    }

    /// Fallback path: the same fixed-window logic over process-local
    /// counters, anchored at the first attempt instead of the epoch.
    fn consume_local(&self, key: &str) -> Result<RateDecision> {
        let mut windows = self
            .fallback
            .lock()
            .map_err(|_| EngineError::Store("mutex poisoned".into()))?;
        let now = Instant::now();
        let window = windows.entry(key.to_string()).or_insert(LocalWindow {
            started_at: now,
            count: 0,
        });

        if now.duration_since(window.started_at) >= self.config.window {
            window.started_at = now;
            window.count = 0;
        }
        window.count += 1;

        let remaining_in_window = self
            .config
            .window
            .saturating_sub(now.duration_since(window.started_at));
        Ok(self.decision(window.count, remaining_in_window))
    }
}

impl RateLimiter for RedisRateLimiter {
    async fn consume(&self, key: &str) -> Result<RateDecision> {
        match self.consume_redis(key).await {
            Ok(decision) => Ok(decision),
            Err(err) => {
                tracing::warn!(
                    key = %key,
                    error = %err,
                    "Redis unavailable, rate limiting degraded to in-process counters"
                );
                self.consume_local(key)
            }
        }
    }

    async fn reset(&self, key: &str) -> Result<()> {
        let (window_id, _) = self.current_window();
        let mut conn = self.conn_manager.clone();

        let deleted: std::result::Result<(), redis::RedisError> = redis::pipe()
            .del(Self::redis_key(key, window_id))
            .ignore()
            .del(Self::redis_key(key, window_id.saturating_sub(1)))
            .ignore()
            .query_async(&mut conn)
            .await;
        if let Err(err) = deleted {
            tracing::warn!(key = %key, error = %err, "Redis reset failed");
        }

        let mut windows = self
            .fallback
            .lock()
            .map_err(|_| EngineError::Store("mutex poisoned".into()))?;
        windows.remove(key);
        Ok(())
    }

    async fn attempts(&self, key: &str) -> Result<u32> {
        let (window_id, _) = self.current_window();
        let mut conn = self.conn_manager.clone();

        let count: std::result::Result<Option<u32>, redis::RedisError> =
            redis::cmd("GET")
                .arg(Self::redis_key(key, window_id))
                .query_async(&mut conn)
                .await;

        match count {
            Ok(count) => Ok(count.unwrap_or(0)),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "Redis read failed, reporting fallback count");
                let windows = self
                    .fallback
                    .lock()
                    .map_err(|_| EngineError::Store("mutex poisoned".into()))?;
                Ok(windows.get(key).map_or(0, |w| w.count))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::providers::RateLimiter as _;

    // Note: these tests require a running Redis instance.
    // Run with: docker run -d -p 6379:6379 redis:7-alpine

    fn config() -> RateLimitConfig {
        RateLimitConfig::default()
            .with_max_attempts(3)
            .with_window(Duration::from_secs(60))
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn allows_then_denies_within_window() {
        let limiter = RedisRateLimiter::new("redis://127.0.0.1:6379", config())
            .await
            .unwrap();
        let key = format!("test:deny:{}", uuid::Uuid::new_v4());

        for i in 1..=3 {
            let decision = limiter.consume(&key).await.unwrap();
            assert!(decision.allowed, "attempt {i} should be allowed");
        }

        let decision = limiter.consume(&key).await.unwrap();
        assert!(!decision.allowed);
        assert!(decision.retry_after.unwrap() <= Duration::from_secs(60));

        limiter.reset(&key).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn reset_clears_the_counter() {
        let limiter = RedisRateLimiter::new("redis://127.0.0.1:6379", config())
            .await
            .unwrap();
        let key = format!("test:reset:{}", uuid::Uuid::new_v4());

        for _ in 0..3 {
            limiter.consume(&key).await.unwrap();
        }
        assert_eq!(limiter.attempts(&key).await.unwrap(), 3);

        limiter.reset(&key).await.unwrap();
        assert_eq!(limiter.attempts(&key).await.unwrap(), 0);
        assert!(limiter.consume(&key).await.unwrap().allowed);
    }
}
