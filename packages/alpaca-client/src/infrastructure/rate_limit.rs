//! REST rate limiting.
//!
//! Alpaca allows 200 requests per minute per account. [`WindowRateLimiter`]
//! is a token bucket holding `max_requests` tokens that regains one token
//! every `window / max_requests`.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;

use crate::application::ports::RateLimiter;

type Limiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Default Alpaca allowance.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 200;

/// Limiter that never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn acquire(&self) {}
}

/// At most `max_requests` requests per `window`.
pub struct WindowRateLimiter {
    limiter: Limiter,
    max_requests: NonZeroU32,
    window: Duration,
}

impl WindowRateLimiter {
    /// Limit to `max_requests` per `window`.
    ///
    /// Returns `None` if `max_requests` is zero or `window` is too short to
    /// split into `max_requests` slots.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Option<Self> {
        let max_requests = NonZeroU32::new(max_requests)?;
        let period = window / max_requests.get();
        let quota = Quota::with_period(period)?.allow_burst(max_requests);

        Some(Self {
            limiter: governor::RateLimiter::direct(quota),
            max_requests,
            window,
        })
    }

    /// Limit to `max_requests` per minute.
    #[must_use]
    pub fn per_minute(max_requests: u32) -> Option<Self> {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Requests allowed per window.
    #[must_use]
    pub const fn max_requests(&self) -> u32 {
        self.max_requests.get()
    }

    /// Window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

impl Default for WindowRateLimiter {
    fn default() -> Self {
        let max_requests = NonZeroU32::new(DEFAULT_REQUESTS_PER_MINUTE).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: governor::RateLimiter::direct(Quota::per_minute(max_requests)),
            max_requests,
            window: Duration::from_secs(60),
        }
    }
}

impl std::fmt::Debug for WindowRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowRateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RateLimiter for WindowRateLimiter {
    async fn acquire(&self) {
        if self.limiter.check().is_err() {
            tracing::debug!(
                max_requests = self.max_requests.get(),
                window_ms = self.window.as_millis(),
                "Rate limit reached, waiting"
            );
            self.limiter.until_ready().await;
        }
    }
}
