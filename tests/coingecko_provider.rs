//! CoinGecko provider tests using wiremock.
//!
//! These tests verify the query sent to `/coins/markets` and how responses
//! map onto rows or errors.

use market_table_sdk::provider::MarketDataProvider;
use market_table_sdk::providers::CoinGeckoProvider;
use market_table_sdk::{Currency, Page, ProviderError, RowsPerPage, ViewState};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> CoinGeckoProvider {
    CoinGeckoProvider::with_base_url(server.uri(), None).unwrap()
}

fn eur_page_two() -> ViewState {
    ViewState::new(
        Page::new(2).unwrap(),
        RowsPerPage::new(20).unwrap(),
        Currency::Eur,
    )
}

#[tokio::test]
async fn test_sends_view_state_as_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .and(query_param("vs_currency", "eur"))
        .and(query_param("order", "market_cap_desc"))
        .and(query_param("per_page", "20"))
        .and(query_param("page", "2"))
        .and(query_param("sparkline", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = provider(&server).fetch_markets(&eur_page_two()).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_rows_keep_upstream_order_and_missing_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "bitcoin",
                "symbol": "btc",
                "name": "Bitcoin",
                "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
                "current_price": 61234.5,
                "market_cap": 1205000000000u64,
                "market_cap_rank": 1,
                "total_volume": 25000000000u64,
                "price_change_percentage_24h": -1.25,
                "circulating_supply": 19700000.0,
                "max_supply": 21000000.0,
                "roi": null,
                "last_updated": "2024-05-01T12:00:00.000Z",
                "sparkline_in_7d": { "price": [1.0, 2.0] }
            },
            {
                "id": "ethereum",
                "symbol": "eth",
                "name": null,
                "current_price": 3012.0,
                "market_cap": 362000000000u64,
                "max_supply": null
            }
        ])))
        .mount(&server)
        .await;

    let rows = provider(&server)
        .fetch_markets(&ViewState::default())
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "bitcoin");
    assert_eq!(rows[0].market_cap_rank, Some(1));
    assert_eq!(rows[0].price_change_percentage_24h, Some(-1.25));
    assert_eq!(rows[0].last_updated.as_deref(), Some("2024-05-01T12:00:00.000Z"));
    assert_eq!(rows[1].id, "ethereum");
    assert_eq!(rows[1].name, "");
    assert_eq!(rows[1].max_supply, None);
    assert_eq!(rows[1].total_volume, None);
}

#[tokio::test]
async fn test_server_error_is_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = provider(&server).fetch_markets(&ViewState::default()).await;

    match result {
        Err(ProviderError::HttpStatus { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = provider(&server).fetch_markets(&ViewState::default()).await;
    assert!(matches!(result, Err(ProviderError::RateLimitExceeded)));
}

#[tokio::test]
async fn test_non_array_body_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": { "error_code": 10002 } })),
        )
        .mount(&server)
        .await;

    let result = provider(&server).fetch_markets(&ViewState::default()).await;
    assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let provider = CoinGeckoProvider::with_base_url(uri, None).unwrap();
    let result = provider.fetch_markets(&ViewState::default()).await;
    assert!(matches!(result, Err(ProviderError::NetworkError(_))));
}
