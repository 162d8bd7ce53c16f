//! Configuration for the matchday core.
//!
//! Values are owned by the application: construct with `Default`, override
//! with the `with_*` builders, or load the scalar knobs from environment
//! variables. Nothing here is a hardcoded policy; in particular the
//! matcher's selection rule is configuration, not an invariant.

use crate::types::{Money, Zone};
use chrono::Duration;
use std::env;

/// How the matcher disambiguates several pending orders with the same total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Earliest-created pending order wins (FIFO).
    EarliestCreated,
}

/// Payment reconciliation configuration.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Trailing window before the event time in which pending orders are
    /// match candidates.
    ///
    /// Default: 3 days.
    pub window: Duration,

    /// Disambiguation rule for equal-total candidates.
    pub selection: SelectionPolicy,
}

impl MatcherConfig {
    /// Set the matching window.
    #[must_use]
    pub const fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            window: Duration::days(3),
            selection: SelectionPolicy::EarliestCreated,
        }
    }
}

/// A sellable stadium zone: its code, seat price, and capacity.
#[derive(Debug, Clone)]
pub struct ZoneDef {
    /// Zone code.
    pub zone: Zone,
    /// Price per seat, in minor units.
    pub price: Money,
    /// Seats available per fixture.
    pub capacity: u32,
}

impl ZoneDef {
    /// Define a zone.
    #[must_use]
    pub fn new(code: impl Into<String>, price: Money, capacity: u32) -> Self {
        Self {
            zone: Zone::new(code),
            price,
            capacity,
        }
    }
}

/// Ticket order / checkout configuration.
#[derive(Debug, Clone)]
pub struct OrderConfig {
    /// How long a pending order waits for payment before lapsing.
    ///
    /// Default: 5 minutes.
    pub payment_window: Duration,

    /// Mobile-money merchant shortcode dialled by the buyer.
    pub shortcode: String,

    /// Provider USSD prefix prepended to the shortcode.
    pub ussd_prefix: String,

    /// Maximum seats in a single order.
    ///
    /// Default: 10.
    pub max_quantity: u32,

    /// Sellable zones with prices and capacities.
    pub zones: Vec<ZoneDef>,
}

impl OrderConfig {
    /// Set the payment window.
    #[must_use]
    pub const fn with_payment_window(mut self, window: Duration) -> Self {
        self.payment_window = window;
        self
    }

    /// Set the sellable zones.
    #[must_use]
    pub fn with_zones(mut self, zones: Vec<ZoneDef>) -> Self {
        self.zones = zones;
        self
    }

    /// Look up a zone definition by code.
    #[must_use]
    pub fn zone(&self, code: &str) -> Option<&ZoneDef> {
        self.zones.iter().find(|z| z.zone.as_str() == code)
    }
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            payment_window: Duration::minutes(5),
            shortcode: "12345".to_string(),
            ussd_prefix: "*182*8*1*".to_string(),
            max_quantity: 10,
            zones: Vec::new(),
        }
    }
}

/// Pass issuance and transfer configuration.
#[derive(Debug, Clone)]
pub struct PassConfig {
    /// How long a transfer claim token stays claimable.
    ///
    /// Default: 48 hours.
    pub transfer_ttl: Duration,
}

impl PassConfig {
    /// Set the transfer claim window.
    #[must_use]
    pub const fn with_transfer_ttl(mut self, ttl: Duration) -> Self {
        self.transfer_ttl = ttl;
        self
    }
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            transfer_ttl: Duration::hours(48),
        }
    }
}

/// Fixed-window rate limit configuration (per key: phone or IP).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Attempts allowed per window.
    ///
    /// Default: 5.
    pub max_attempts: u32,

    /// Window length.
    ///
    /// Default: 15 minutes.
    pub window: std::time::Duration,
}

impl RateLimitConfig {
    /// Set the attempts allowed per window.
    #[must_use]
    pub const fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the window length.
    #[must_use]
    pub const fn with_window(mut self, window: std::time::Duration) -> Self {
        self.window = window;
        self
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: std::time::Duration::from_secs(900),
        }
    }
}

/// Top-level configuration, loadable from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Payment reconciliation.
    pub matcher: MatcherConfig,
    /// Checkout and order lifecycle.
    pub orders: OrderConfig,
    /// Pass issuance and transfers.
    pub passes: PassConfig,
    /// Rate limiting.
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Load scalar knobs from environment variables, falling back to
    /// defaults. Zone definitions stay application-provided.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            matcher: MatcherConfig {
                window: Duration::days(env_or("MATCH_WINDOW_DAYS", 3)),
                ..defaults.matcher
            },
            orders: OrderConfig {
                payment_window: Duration::seconds(env_or("ORDER_PAYMENT_WINDOW_SECS", 300)),
                shortcode: env::var("MOMO_SHORTCODE").unwrap_or(defaults.orders.shortcode),
                ussd_prefix: env::var("MOMO_USSD_PREFIX").unwrap_or(defaults.orders.ussd_prefix),
                max_quantity: env_or("ORDER_MAX_QUANTITY", 10),
                zones: defaults.orders.zones,
            },
            passes: PassConfig {
                transfer_ttl: Duration::hours(env_or("TRANSFER_TTL_HOURS", 48)),
            },
            rate_limit: RateLimitConfig {
                max_attempts: env_or("RATE_LIMIT_MAX_ATTEMPTS", 5),
                window: std::time::Duration::from_secs(env_or("RATE_LIMIT_WINDOW_SECS", 900)),
            },
        }
    }
}

/// Read an env var and parse it, falling back to `default` when unset or
/// unparseable.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.matcher.window, Duration::days(3));
        assert_eq!(config.orders.payment_window, Duration::minutes(5));
        assert_eq!(config.orders.max_quantity, 10);
        assert_eq!(config.passes.transfer_ttl, Duration::hours(48));
        assert_eq!(config.rate_limit.max_attempts, 5);
    }

    #[test]
    fn zone_lookup_by_code() {
        let orders = OrderConfig::default().with_zones(vec![
            ZoneDef::new("VIP", Money::from_minor(10_000), 200),
            ZoneDef::new("EAST", Money::from_minor(1500), 5000),
        ]);

        assert_eq!(
            orders.zone("EAST").map(|z| z.price),
            Some(Money::from_minor(1500))
        );
        assert!(orders.zone("NORTH").is_none());
    }

    #[test]
    fn builders_override_defaults() {
        let matcher = MatcherConfig::default().with_window(Duration::days(1));
        assert_eq!(matcher.window, Duration::days(1));

        let limit = RateLimitConfig::default()
            .with_max_attempts(3)
            .with_window(std::time::Duration::from_secs(60));
        assert_eq!(limit.max_attempts, 3);
    }
}
