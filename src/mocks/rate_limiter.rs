//! In-memory fixed-window rate limiter for testing.

use crate::config::RateLimitConfig;
use crate::error::{EngineError, Result};
use crate::providers::{RateDecision, RateLimiter};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Per-key counter and window start.
struct Window {
    started_at: Instant,
    count: u32,
}

/// In-memory fixed-window rate limiter.
///
/// The window opens on the first attempt for a key and resets once it
/// elapses. Counting happens under one lock, so two concurrent attempts
/// never both see the pre-increment count.
#[derive(Clone)]
pub struct MockRateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl MockRateLimiter {
    /// Create a limiter with the given window parameters.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Window>>> {
        self.windows
            .lock()
            .map_err(|_| EngineError::Store("mutex poisoned".into()))
    }
}

impl Default for MockRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter for MockRateLimiter {
    async fn consume(&self, key: &str) -> Result<RateDecision> {
        let mut windows = self.lock()?;
        let now = Instant::now();
        let window = windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        // Fixed window: reset once the window has fully elapsed.
        if now.duration_since(window.started_at) >= self.config.window {
            window.started_at = now;
            window.count = 0;
        }
        window.count += 1;

        let decision = if window.count <= self.config.max_attempts {
            RateDecision {
                allowed: true,
                remaining: self.config.max_attempts - window.count,
                retry_after: None,
            }
        } else {
            RateDecision {
                allowed: false,
                remaining: 0,
                retry_after: Some(
                    self.config
                        .window
                        .saturating_sub(now.duration_since(window.started_at)),
                ),
            }
        };

        if !decision.allowed {
            tracing::warn!(
                rate_limit_exceeded = true,
                key = %key,
                attempts = window.count,
                max_attempts = self.config.max_attempts,
                "rate limit exceeded"
            );
        }
        Ok(decision)
    }

    async fn reset(&self, key: &str) -> Result<()> {
        let mut windows = self.lock()?;
        windows.remove(key);
        Ok(())
    }

    async fn attempts(&self, key: &str) -> Result<u32> {
        let windows = self.lock()?;
        Ok(windows.get(key).map_or(0, |w| w.count))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn limiter(max: u32, window: Duration) -> MockRateLimiter {
        MockRateLimiter::new(
            RateLimitConfig::default()
                .with_max_attempts(max)
                .with_window(window),
        )
    }

    #[tokio::test]
    async fn allows_within_limit() {
        let limiter = limiter(5, Duration::from_secs(60));

        for i in 1..=5 {
            let decision = limiter.consume("2507881234").await.unwrap();
            assert!(decision.allowed, "attempt {i} should be allowed");
        }
    }

    #[tokio::test]
    async fn denies_over_limit_with_retry_after_in_window() {
        let window = Duration::from_secs(60);
        let limiter = limiter(3, window);

        for _ in 0..3 {
            limiter.consume("key").await.unwrap();
        }

        let decision = limiter.consume("key").await.unwrap();
        assert!(!decision.allowed);
        let retry_after = decision.retry_after.unwrap();
        assert!(retry_after <= window);
        assert!(decision.require().is_err());
    }

    #[tokio::test]
    async fn window_reset_allows_again() {
        let limiter = limiter(2, Duration::from_millis(50));

        limiter.consume("key").await.unwrap();
        limiter.consume("key").await.unwrap();
        assert!(!limiter.consume("key").await.unwrap().allowed);

        tokio::time::sleep(Duration::from_millis(60)).await;

        let decision = limiter.consume("key").await.unwrap();
        assert!(decision.allowed, "window elapsed, counter should reset");
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = limiter(1, Duration::from_secs(60));

        assert!(limiter.consume("a").await.unwrap().allowed);
        assert!(!limiter.consume("a").await.unwrap().allowed);
        assert!(limiter.consume("b").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn explicit_reset_clears_the_window() {
        let limiter = limiter(1, Duration::from_secs(60));

        limiter.consume("key").await.unwrap();
        assert_eq!(limiter.attempts("key").await.unwrap(), 1);

        limiter.reset("key").await.unwrap();
        assert_eq!(limiter.attempts("key").await.unwrap(), 0);
        assert!(limiter.consume("key").await.unwrap().allowed);
    }
}
