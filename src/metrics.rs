//! Fetch metrics collection and reporting
//!
//! Tracks request latency, success rate and how many results arrived too
//! late to be applied.
//!
//! Recording never awaits: the controller task records from inside the
//! futures it polls, so the lock is only ever held for a push or a copy.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Snapshot of fetch statistics
#[derive(Debug, Clone, PartialEq)]
pub struct FetchStats {
    /// Name of the provider
    pub provider_name: String,
    /// 50th percentile latency of successful requests in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful requests in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of requests tracked
    pub total_requests: u64,
    /// Number of failed requests
    pub failed_requests: u64,
    /// Results dropped because a newer epoch superseded them
    pub discarded_results: u64,
}

impl FetchStats {
    /// Creates stats with no data
    pub fn empty(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            failed_requests: 0,
            discarded_results: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct Counters {
    samples: VecDeque<LatencySample>,
    total_requests: u64,
    failed_requests: u64,
    discarded_results: u64,
}

/// Collects and computes fetch metrics
pub struct FetchMetrics {
    provider_name: String,
    counters: Mutex<Counters>,
}

impl FetchMetrics {
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            counters: Mutex::new(Counters {
                samples: VecDeque::with_capacity(MAX_SAMPLES),
                ..Counters::default()
            }),
        }
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        // counters stay consistent even if a holder panicked
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a request with its duration and success status
    pub fn record_request(&self, duration: Duration, success: bool) {
        let mut counters = self.counters();
        counters.total_requests += 1;
        if !success {
            counters.failed_requests += 1;
        }

        if counters.samples.len() >= MAX_SAMPLES {
            counters.samples.pop_front();
        }
        counters.samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    /// Records a result dropped by the staleness guard
    pub fn record_discarded(&self) {
        self.counters().discarded_results += 1;
    }

    /// Computes current stats from collected samples
    pub fn stats(&self) -> FetchStats {
        let (mut latencies, total_requests, failed_requests, discarded_results) = {
            let counters = self.counters();
            let latencies: Vec<f64> = counters
                .samples
                .iter()
                .filter(|s| s.success)
                .map(|s| s.duration_ms)
                .collect();
            (
                latencies,
                counters.total_requests,
                counters.failed_requests,
                counters.discarded_results,
            )
        };

        let mut stats = FetchStats::empty(&self.provider_name);
        stats.discarded_results = discarded_results;
        if total_requests == 0 {
            return stats;
        }

        latencies.sort_by(|a, b| a.total_cmp(b));
        stats.latency_p50_ms = percentile(&latencies, 50.0);
        stats.latency_p99_ms = percentile(&latencies, 99.0);
        stats.total_requests = total_requests;
        stats.failed_requests = failed_requests;
        stats.success_rate = (total_requests - failed_requests) as f64 / total_requests as f64;
        stats
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_metrics() {
        let metrics = FetchMetrics::new("test");

        metrics.record_request(Duration::from_millis(100), true);
        metrics.record_request(Duration::from_millis(200), true);
        metrics.record_request(Duration::from_millis(150), false);
        metrics.record_discarded();

        let stats = metrics.stats();

        assert_eq!(stats.provider_name, "test");
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.discarded_results, 1);
        assert!(stats.success_rate > 0.6 && stats.success_rate < 0.7);
    }

    #[test]
    fn test_empty_stats_keep_discards() {
        let metrics = FetchMetrics::new("test");
        metrics.record_discarded();

        let stats = metrics.stats();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.success_rate, 1.0);
        assert_eq!(stats.discarded_results, 1);
    }

    #[test]
    fn test_recording_from_many_threads() {
        let metrics = std::sync::Arc::new(FetchMetrics::new("test"));

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        metrics.record_request(Duration::from_millis(10), i % 2 == 0);
                        metrics.record_discarded();
                        let _ = metrics.stats();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let stats = metrics.stats();
        assert_eq!(stats.total_requests, 200);
        assert_eq!(stats.failed_requests, 100);
        assert_eq!(stats.discarded_results, 200);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
        assert_eq!(percentile(&values, 99.0), 9.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
