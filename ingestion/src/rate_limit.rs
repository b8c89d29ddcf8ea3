use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Gate every provider request passes before it is sent.
#[async_trait]
pub trait RateLimit: Send + Sync {
    async fn acquire(&self);
}

/// Token bucket over `governor`: `requests_per_minute` sustained, with up to
/// `burst` requests admitted back to back.
pub struct TokenBucket {
    limiter: DefaultDirectRateLimiter,
}

impl TokenBucket {
    pub fn per_minute(requests_per_minute: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_minute(rate).allow_burst(burst)),
        }
    }

    /// Takes a permit only if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[async_trait]
impl RateLimit for TokenBucket {
    async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

/// No limit. For tests and local fixtures.
pub struct Unthrottled;

#[async_trait]
impl RateLimit for Unthrottled {
    async fn acquire(&self) {}
}
