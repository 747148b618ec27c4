use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;
use std::num::NonZeroU32;
use std::time::Duration;

type DirectLimiter<C> =
    governor::RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Token bucket: `capacity` tokens, one more every `refill_every`.
/// With a capacity of one this is a plain minimum-interval gate.
/// A zero interval never limits.
pub struct RateLimiter<C: Clock = DefaultClock> {
    inner: Option<DirectLimiter<C>>,
    clock: C,
}

impl RateLimiter {
    pub fn new(capacity: u32, refill_every: Duration) -> Self {
        Self::with_clock(capacity, refill_every, DefaultClock::default())
    }

    pub fn min_interval(interval: Duration) -> Self {
        Self::new(1, interval)
    }

    /// Waits until a token is available.
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.inner {
            limiter.until_ready().await;
        }
    }
}

impl<C: Clock + Clone> RateLimiter<C> {
    pub fn with_clock(capacity: u32, refill_every: Duration, clock: C) -> Self {
        let burst = NonZeroU32::new(capacity).unwrap_or(NonZeroU32::MIN);
        let inner = Quota::with_period(refill_every).map(|quota| {
            governor::RateLimiter::direct_with_clock(quota.allow_burst(burst), clock.clone())
        });

        Self { inner, clock }
    }

    /// Takes a token, or returns how long until one is available.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let Some(limiter) = &self.inner else {
            return Ok(());
        };

        limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}
