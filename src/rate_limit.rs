use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;

/// Global request throttle shared by every worker.
///
/// A positive rate paces callers one permit at a time.
pub struct RateLimiter {
    requests_per_second: u32,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl RateLimiter {
    /// `0` means unlimited.
    pub fn new(requests_per_second: u32) -> Self {
        let limiter = NonZeroU32::new(requests_per_second).map(|rate| {
            DefaultDirectRateLimiter::direct(Quota::per_second(rate).allow_burst(NonZeroU32::MIN))
        });

        Self {
            requests_per_second,
            limiter,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Waits until the caller may issue its next request.
    pub async fn take(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.limiter.is_none()
    }

    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}
