use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter as GovernorLimiter};

use crate::vendor_policy::VendorPolicy;
use crate::VendorId;

type DirectRateLimiter = GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Advisory per-vendor throttle.
///
/// Callers wait for window capacity instead of failing; nothing enforces the
/// budget across processes.
#[derive(Clone)]
pub struct RateLimiter {
    vendor: VendorId,
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("vendor", &self.vendor)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(vendor: VendorId, quota_window: Duration, quota_limit: u32) -> Self {
        Self {
            vendor,
            limiter: Arc::new(GovernorLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
            clock: DefaultClock::default(),
        }
    }

    pub fn from_policy(policy: &VendorPolicy) -> Self {
        Self::new(policy.vendor, policy.quota_window, policy.quota_limit)
    }

    /// Waits until the window has capacity for one more call.
    pub async fn acquire(&self) {
        if let Err(delay) = self.try_acquire() {
            tracing::debug!(
                vendor = %self.vendor,
                wait_ms = delay.as_millis() as u64,
                "throttling request"
            );
            self.limiter.until_ready().await;
        }
    }

    /// Takes one unit of budget if available; otherwise returns the wait time.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = NonZeroU32::new(quota_limit.max(1)).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell =
        (quota_window.as_secs_f64() / f64::from(safe_limit.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(safe_limit))
        .allow_burst(safe_limit)
}
