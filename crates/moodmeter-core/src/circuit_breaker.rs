use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Runtime circuit state for an adapter's upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
}

/// Circuit breaker thresholds and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Cool-down after generic failures.
    pub open_timeout: Duration,
    /// Cool-down after a failure the vendor attributed to rate limiting.
    pub rate_limit_timeout: Duration,
    /// A restored open circuit with less than this left on its timer is closed immediately.
    pub stale_reset_window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            open_timeout: Duration::from_secs(60),
            rate_limit_timeout: Duration::from_secs(600),
            stale_reset_window: Duration::from_secs(30),
        }
    }
}

/// Copy of the breaker state, used to carry it across adapter instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure_at: Option<Instant>,
    pub timeout: Duration,
    pub proxy_available: bool,
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
    timeout: Duration,
    proxy_available: bool,
}

impl CircuitInner {
    fn closed(timeout: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_at: None,
            timeout,
            proxy_available: true,
        }
    }

    fn remaining(&self) -> Option<Duration> {
        if self.state != CircuitState::Open {
            return None;
        }
        let elapsed = self.last_failure_at.map(|at| at.elapsed())?;
        Some(self.timeout.saturating_sub(elapsed))
    }
}

/// Two-state availability guard owned by one adapter instance.
///
/// Concurrent callers share the counters; two simultaneous failures may both
/// increment the count, which only opens the circuit sooner.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CircuitInner::closed(config.open_timeout)),
        }
    }

    /// Rebuilds a breaker from a snapshot taken by a previous instance.
    ///
    /// An open circuit with less than `stale_reset_window` left is closed
    /// right away so a reload does not inherit an almost-expired outage.
    pub fn restore(config: CircuitBreakerConfig, snapshot: CircuitSnapshot) -> Self {
        let mut inner = CircuitInner {
            state: snapshot.state,
            failure_count: snapshot.failure_count,
            last_failure_at: snapshot.last_failure_at,
            timeout: snapshot.timeout,
            proxy_available: snapshot.proxy_available,
        };

        if let Some(remaining) = inner.remaining() {
            if remaining < config.stale_reset_window {
                tracing::info!(
                    remaining_ms = remaining.as_millis() as u64,
                    "closing stale circuit on restore"
                );
                let proxy_available = inner.proxy_available;
                inner = CircuitInner::closed(config.open_timeout);
                inner.proxy_available = proxy_available;
            }
        }

        Self {
            config,
            inner: Mutex::new(inner),
        }
    }

    pub fn config(&self) -> CircuitBreakerConfig {
        self.config
    }

    /// Returns whether a call may proceed. An open circuit whose timeout has
    /// elapsed closes here, on the next attempt.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let expired = inner
                    .last_failure_at
                    .map(|at| at.elapsed() >= inner.timeout)
                    .unwrap_or(true);

                if expired {
                    let proxy_available = inner.proxy_available;
                    *inner = CircuitInner::closed(self.config.open_timeout);
                    inner.proxy_available = proxy_available;
                }
                expired
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_failure_at = None;
        inner.timeout = self.config.open_timeout;
    }

    /// Records a failed call. A rate-limited failure opens the circuit at once
    /// with the escalated timeout; other failures open it at the threshold.
    pub fn record_failure(&self, rate_limited: bool) {
        let mut inner = self.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure_at = Some(Instant::now());
        if rate_limited {
            inner.timeout = self.config.rate_limit_timeout;
        }

        if inner.state == CircuitState::Closed
            && (rate_limited || inner.failure_count >= self.config.failure_threshold)
        {
            inner.state = CircuitState::Open;
            tracing::warn!(
                failures = inner.failure_count,
                timeout_secs = inner.timeout.as_secs(),
                rate_limited,
                "circuit opened"
            );
        }
    }

    /// Unconditionally closes the circuit and marks the proxy reachable again.
    pub fn reset(&self) {
        *self.lock() = CircuitInner::closed(self.config.open_timeout);
    }

    pub fn mark_proxy_unavailable(&self) {
        self.lock().proxy_available = false;
    }

    pub fn proxy_available(&self) -> bool {
        self.lock().proxy_available
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Timeout that applies to the current (or next) open period.
    pub fn open_timeout(&self) -> Duration {
        self.lock().timeout
    }

    /// Time left before an open circuit admits a call; `None` when closed.
    pub fn remaining_open_time(&self) -> Option<Duration> {
        self.lock().remaining()
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.lock();
        CircuitSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure_at: inner.last_failure_at,
            timeout: inner.timeout,
            proxy_available: inner.proxy_available,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CircuitInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config(threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            open_timeout: Duration::from_millis(10),
            rate_limit_timeout: Duration::from_millis(100),
            stale_reset_window: Duration::from_millis(5),
        }
    }

    #[test]
    fn opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new(fast_config(2));

        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.record_failure(false);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.allow_request());
        breaker.record_failure(false);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow_request());
    }

    #[test]
    fn closes_lazily_after_timeout_and_clears_failures() {
        let breaker = CircuitBreaker::new(fast_config(1));

        breaker.record_failure(false);
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(15));
        // Still reported open until somebody asks.
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn success_resets_the_failure_streak() {
        let breaker = CircuitBreaker::new(fast_config(2));

        breaker.record_failure(false);
        breaker.record_success();
        breaker.record_failure(false);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 1);
    }

    #[test]
    fn single_rate_limited_failure_opens_with_escalated_timeout() {
        let breaker = CircuitBreaker::default();

        breaker.record_failure(true);

        assert_eq!(breaker.failure_count(), 1);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow_request());
        assert_eq!(breaker.open_timeout(), Duration::from_secs(600));
        let remaining = breaker.remaining_open_time().expect("open circuit has a timer");
        assert!(remaining > Duration::from_secs(60));
    }

    #[test]
    fn rate_limit_after_a_generic_failure_escalates_the_open_timeout() {
        let breaker = CircuitBreaker::default();

        breaker.record_failure(false);
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.record_failure(true);

        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.open_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn generic_failures_use_default_timeout() {
        let breaker = CircuitBreaker::default();

        breaker.record_failure(false);
        breaker.record_failure(false);

        assert_eq!(breaker.open_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn reset_closes_and_restores_proxy_availability() {
        let breaker = CircuitBreaker::default();
        breaker.record_failure(true);
        breaker.record_failure(true);
        breaker.mark_proxy_unavailable();

        breaker.reset();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
        assert!(breaker.proxy_available());
        assert!(breaker.allow_request());
        assert_eq!(breaker.open_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn restore_force_closes_nearly_expired_circuit() {
        let config = CircuitBreakerConfig::default();
        let opened = Instant::now()
            .checked_sub(Duration::from_secs(45))
            .expect("monotonic clock is past 45s");

        let breaker = CircuitBreaker::restore(
            config,
            CircuitSnapshot {
                state: CircuitState::Open,
                failure_count: 2,
                last_failure_at: Some(opened),
                timeout: Duration::from_secs(60),
                proxy_available: true,
            },
        );

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn restore_keeps_circuit_with_plenty_of_time_left() {
        let config = CircuitBreakerConfig::default();
        let opened = Instant::now()
            .checked_sub(Duration::from_secs(5))
            .expect("monotonic clock is past 5s");

        let breaker = CircuitBreaker::restore(
            config,
            CircuitSnapshot {
                state: CircuitState::Open,
                failure_count: 2,
                last_failure_at: Some(opened),
                timeout: Duration::from_secs(600),
                proxy_available: false,
            },
        );

        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow_request());
        assert!(!breaker.proxy_available());
    }
}
