//! Recurring refresh timer

use crate::constants::REFRESH_INTERVAL_SECS;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Fires every `period`, starting one period after it is armed
///
/// The timer lives inside the controller task. Dropping it cancels it, so
/// it can never fire into a stopped controller.
pub struct RefreshTimer {
    interval: Interval,
}

impl RefreshTimer {
    /// Arms the timer; the first tick is one full period away
    ///
    /// A zero period falls back to the default refresh interval.
    pub fn start(period: Duration) -> Self {
        let period = if period.is_zero() {
            tracing::warn!(
                fallback_secs = REFRESH_INTERVAL_SECS,
                "Refresh interval must be non-zero, using default"
            );
            Duration::from_secs(REFRESH_INTERVAL_SECS)
        } else {
            period
        };
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Re-arms the timer so the next tick is one full period from now
    pub fn reset(&mut self) {
        self.interval.reset();
    }

    /// Waits for the next tick
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_a_full_period() {
        let mut timer = RefreshTimer::start(Duration::from_secs(60));
        let started = Instant::now();

        timer.tick().await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(60));
        assert!(elapsed < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_uses_default_interval() {
        let mut timer = RefreshTimer::start(Duration::ZERO);
        assert_eq!(timer.period(), Duration::from_secs(REFRESH_INTERVAL_SECS));

        tokio::time::advance(Duration::from_secs(REFRESH_INTERVAL_SECS - 1)).await;
        assert!(timer.tick().now_or_never().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restarts_period() {
        let mut timer = RefreshTimer::start(Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(45)).await;
        timer.reset();
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(timer.tick().now_or_never().is_none());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(timer.tick().now_or_never().is_some());
    }
}
