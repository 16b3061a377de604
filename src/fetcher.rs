//! One-shot fetches tagged with their epoch

use crate::{
    metrics::FetchMetrics,
    provider::MarketDataProvider,
    types::{FetchOutcome, FetchRequest},
};
use std::sync::Arc;
use std::time::Instant;

/// Runs a single provider request per [`FetchRequest`]
///
/// There is no retry and no caching: every call is a fresh round trip and
/// its outcome carries the epoch of the request that caused it.
#[derive(Clone)]
pub struct DataFetcher {
    provider: Arc<dyn MarketDataProvider>,
    metrics: Arc<FetchMetrics>,
}

impl DataFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        let metrics = Arc::new(FetchMetrics::new(provider.provider_name()));
        Self { provider, metrics }
    }

    pub fn metrics(&self) -> &Arc<FetchMetrics> {
        &self.metrics
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Fetches the page described by `request`
    pub async fn fetch(&self, request: FetchRequest) -> FetchOutcome {
        let start = Instant::now();
        let result = self.provider.fetch_markets(&request.params).await;
        let elapsed = start.elapsed();
        self.metrics.record_request(elapsed, result.is_ok());

        match result {
            Ok(rows) => {
                tracing::debug!(
                    epoch = request.epoch.get(),
                    count = rows.len(),
                    provider = self.provider.provider_name(),
                    latency_ms = elapsed.as_millis() as u64,
                    "Fetch succeeded"
                );
                FetchOutcome::Success {
                    epoch: request.epoch,
                    rows,
                }
            }
            Err(error) => {
                tracing::warn!(
                    epoch = request.epoch.get(),
                    provider = self.provider.provider_name(),
                    error = %error,
                    "Fetch failed"
                );
                FetchOutcome::Failure {
                    epoch: request.epoch,
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{rows, MockProvider};
    use crate::types::{Epoch, ViewState};

    fn request(epoch: Epoch) -> FetchRequest {
        FetchRequest {
            params: ViewState::default(),
            epoch,
        }
    }

    #[tokio::test]
    async fn test_success_carries_request_epoch() {
        let provider = Arc::new(MockProvider::new());
        provider.set_rows(rows(3));
        let fetcher = DataFetcher::new(provider.clone());

        let epoch = Epoch::ZERO.next().next();
        let outcome = fetcher.fetch(request(epoch)).await;

        assert_eq!(outcome.epoch(), epoch);
        match outcome {
            FetchOutcome::Success { rows, .. } => assert_eq!(rows.len(), 3),
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(provider.calls(), vec![ViewState::default()]);
    }

    #[tokio::test]
    async fn test_failure_is_not_retried() {
        let provider = Arc::new(MockProvider::new());
        provider.fail_next("boom");
        let fetcher = DataFetcher::new(provider.clone());

        let outcome = fetcher.fetch(request(Epoch::ZERO.next())).await;

        assert!(!outcome.is_success());
        assert_eq!(provider.call_count(), 1);

        let stats = fetcher.metrics().stats();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.failed_requests, 1);
    }
}
