//! Keyed in-memory rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use quill_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

type KeyedLimiter =
    GovernorRateLimiter<String, governor::state::keyed::DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window, per key.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Per-key rate limiter using the GCRA algorithm. Keys are client
/// identifiers (IP or user id); limits are per-process, not distributed.
pub struct KeyedRateLimiter {
    limiter: Arc<KeyedLimiter>,
}

impl KeyedRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        // A zero limit would divide the window by zero; treat it as 1.
        let max_requests = config.max_requests.max(1);
        let quota = Quota::with_period(config.window / max_requests)
            .expect("Valid quota")
            .allow_burst(NonZeroU32::new(max_requests).expect("Non-zero"));

        Self {
            limiter: Arc::new(GovernorRateLimiter::keyed(quota)),
        }
    }

    pub fn from_env() -> Self {
        let config = RateLimitConfig {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(10),
            window: Duration::from_secs(
                std::env::var("RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|&s| s > 0)
                    .unwrap_or(60),
            ),
        };
        Self::new(config)
    }
}

#[async_trait]
impl RateLimiter for KeyedRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        match self.limiter.check_key(&key.to_string()) {
            Ok(_) => Ok(RateLimitResult {
                allowed: true,
                reset_after: Duration::ZERO,
            }),
            Err(not_until) => Ok(RateLimitResult {
                allowed: false,
                reset_after: not_until.wait_time_from(DefaultClock::default().now()),
            }),
        }
    }
}
