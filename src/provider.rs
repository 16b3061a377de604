//! Provider abstraction for fetching market rows from external APIs

use crate::{
    error::ProviderError,
    types::{MarketRow, ViewState},
};
use async_trait::async_trait;

/// Trait for market data providers
///
/// Implementations return one page of assets ordered by market
/// capitalization, descending.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches the page of rows described by `params`
    ///
    /// # Arguments
    /// * `params` - Page, page size and quote currency
    ///
    /// # Returns
    /// Rows in upstream order, or an error if the request or decoding failed
    async fn fetch_markets(&self, params: &ViewState) -> Result<Vec<MarketRow>, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}
