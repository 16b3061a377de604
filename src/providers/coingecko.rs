//! CoinGecko market listing provider

use crate::{
    config::TableConfig,
    constants::{COINGECKO_API_URL, COINGECKO_MARKETS_ENDPOINT, MARKETS_ORDER, USER_AGENT},
    error::ProviderError,
    provider::MarketDataProvider,
    types::{MarketRow, ViewState},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// CoinGecko `/coins/markets` provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    /// Creates a provider against the public CoinGecko API
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(COINGECKO_API_URL, None)
    }

    /// Creates a provider against `base_url`
    ///
    /// Without `timeout` the transport default applies.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        Self::build(base_url.into(), timeout, USER_AGENT)
    }

    /// Creates a provider from the table configuration
    pub fn from_config(config: &TableConfig) -> Result<Self, ProviderError> {
        Self::build(
            config.api_base_url.clone(),
            config.request_timeout,
            &config.user_agent,
        )
    }

    fn build(
        base_url: String,
        timeout: Option<Duration>,
        user_agent: &str,
    ) -> Result<Self, ProviderError> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the markets URL for one page
    fn build_url(&self, params: &ViewState) -> String {
        format!(
            "{}{}?vs_currency={}&order={}&per_page={}&page={}&sparkline=false",
            self.base_url,
            COINGECKO_MARKETS_ENDPOINT,
            params.currency.code(),
            MARKETS_ORDER,
            params.rows_per_page,
            params.page
        )
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn fetch_markets(&self, params: &ViewState) -> Result<Vec<MarketRow>, ProviderError> {
        let url = self.build_url(params);
        tracing::debug!(url = %url, "Fetching markets from CoinGecko");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::NetworkError)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimitExceeded);
        }

        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let response_text = response.text().await.map_err(ProviderError::NetworkError)?;

        let rows: Vec<MarketRow> = serde_json::from_str(&response_text).map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "Failed to parse CoinGecko markets response: {}",
                e
            ))
        })?;

        tracing::debug!(
            count = rows.len(),
            currency = params.currency.code(),
            page = params.page.get(),
            "Fetched markets from CoinGecko"
        );

        Ok(rows)
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}
