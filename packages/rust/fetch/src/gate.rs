//! Pacing gate shared across a run.
//!
//! Wraps a `governor` token bucket holding a single permit that refills once
//! per interval. Every caller of [`RateGate::wait`] draws from the same
//! bucket, so a concurrent runner sharing one gate through an `Arc` keeps the
//! same request-rate ceiling as the sequential one.

use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::trace;

pub struct RateGate {
    limiter: Option<DefaultDirectRateLimiter>,
    interval: Duration,
}

impl RateGate {
    /// One permit per `interval`. A zero interval yields a disabled gate.
    pub fn per_interval(interval: Duration) -> Self {
        Self {
            limiter: Quota::with_period(interval).map(RateLimiter::direct),
            interval,
        }
    }

    /// A gate that never waits.
    pub fn disabled() -> Self {
        Self {
            limiter: None,
            interval: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Block until a permit is available.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            trace!(interval_ms = self.interval.as_millis(), "waiting on rate gate");
            limiter.until_ready().await;
        }
    }
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("interval", &self.interval)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn zero_interval_disables() {
        let gate = RateGate::per_interval(Duration::ZERO);
        assert!(!gate.is_enabled());
        assert!(!RateGate::disabled().is_enabled());
    }

    #[tokio::test]
    async fn disabled_gate_never_waits() {
        let gate = RateGate::disabled();
        let start = Instant::now();
        for _ in 0..100 {
            gate.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn consecutive_permits_are_spaced() {
        let gate = RateGate::per_interval(Duration::from_millis(100));
        let start = Instant::now();
        gate.wait().await;
        gate.wait().await;
        gate.wait().await;
        // First permit is immediate; the next two each wait one interval.
        assert!(start.elapsed() >= Duration::from_millis(180));
    }
}
