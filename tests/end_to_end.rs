//! End-to-end journeys: client adapter -> running proxy -> stubbed vendor
//!
//! The proxy is served on an ephemeral port and the adapters talk to it
//! through the real reqwest transport.

use std::net::SocketAddr;
use std::sync::Arc;

use moodmeter_core::{
    CoinMarketCapClient, ProxyEndpoints, ReqwestHttpClient, SentimentClient, SentimentLabel, Symbol,
};
use moodmeter_proxy::{build_router, ProxyConfig, ProxyState, Secret};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_proxy(config: ProxyConfig) -> SocketAddr {
    let state = ProxyState::new(config).expect("valid config");
    let router = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("proxy serves");
    });
    addr
}

fn cmc_record(
    id: u64,
    name: &str,
    symbol: &str,
    rank: u32,
    price: f64,
    change_24h: f64,
) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "symbol": symbol,
        "slug": name.to_lowercase(),
        "cmc_rank": rank,
        "last_updated": "2024-03-01T12:00:00.000Z",
        "quote": {
            "USD": {
                "price": price,
                "volume_24h": 1.0e9,
                "percent_change_24h": change_24h,
                "market_cap": price * 1.0e9,
                "last_updated": "2024-03-01T12:00:00.000Z"
            }
        }
    })
}

// =============================================================================
// Market Data Journey
// =============================================================================

#[tokio::test]
async fn when_client_requests_tickers_system_returns_vendor_moves_through_proxy() {
    // Given: A CoinMarketCap stub behind a running proxy
    let vendor = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cryptocurrency/quotes/latest"))
        .and(query_param("symbol", "AAPL,TSLA"))
        .and(header("x-cmc_pro_api_key", "e2e-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": { "error_code": 0, "error_message": null, "credit_count": 1 },
            "data": {
                "AAPL": cmc_record(10, "Apple", "AAPL", 40, 189.5, 2.35),
                "TSLA": cmc_record(11, "Tesla", "TSLA", 90, 175.0, -4.1)
            }
        })))
        .expect(1)
        .mount(&vendor)
        .await;

    let mut config = ProxyConfig::default().with_upstream_base(&vendor.uri());
    config.coinmarketcap_api_key = Some(Secret::new("e2e-key"));
    let addr = spawn_proxy(config).await;

    let endpoints = ProxyEndpoints::new(format!("http://{addr}"));
    let client = CoinMarketCapClient::new(
        endpoints.coinmarketcap(),
        Arc::new(ReqwestHttpClient::new()),
    );

    // When: The client asks for two tickers
    let symbols = Symbol::parse_list("AAPL,TSLA").expect("valid symbols");
    let tickers = client.get_tickers(&symbols).await.expect("proxy relays quotes");

    // Then: Both arrive in request order with the vendor's 24h move verbatim
    assert_eq!(tickers.len(), 2);
    assert_eq!(tickers[0].symbol().as_str(), "AAPL");
    assert_eq!(tickers[0].quote.change_percent, 2.35);
    assert_eq!(tickers[1].symbol().as_str(), "TSLA");
    assert_eq!(tickers[1].quote.change_percent, -4.1);
    assert_eq!(tickers[0].exchange, "CMC");
}

#[tokio::test]
async fn when_proxy_lacks_vendor_key_client_sees_proxy_error() {
    // Given: A running proxy without a CoinMarketCap key
    let addr = spawn_proxy(ProxyConfig::default()).await;
    let endpoints = ProxyEndpoints::new(format!("http://{addr}"));
    let client = CoinMarketCapClient::new(
        endpoints.coinmarketcap(),
        Arc::new(ReqwestHttpClient::new()),
    );

    // When: The client asks for quotes
    let error = client
        .get_tickers(&[Symbol::parse("BTC").expect("valid")])
        .await
        .expect_err("key missing");

    // Then: The proxy's message surfaces and the failure is counted
    assert!(error.message().contains("COINMARKETCAP_API_KEY"));
    assert_eq!(error.status(), Some(500));
    assert_eq!(client.circuit_breaker().failure_count(), 1);
}

// =============================================================================
// Sentiment Journey
// =============================================================================

#[tokio::test]
async fn when_client_requests_unknown_ticker_sentiment_system_returns_not_found_template() {
    // Given: A running proxy
    let addr = spawn_proxy(ProxyConfig::default()).await;
    let endpoints = ProxyEndpoints::new(format!("http://{addr}"));
    let client = SentimentClient::new(endpoints.ai(), Arc::new(ReqwestHttpClient::new()));

    // When: Sentiment for an untracked ticker is requested
    let report = client
        .analyze(&Symbol::parse("ZZZZ").expect("valid"))
        .await
        .expect("proxy answers");

    // Then: A neutral not-found report comes back
    assert!(!report.found);
    assert_eq!(report.sentiment, SentimentLabel::Neutral);
    assert_eq!(report.score, 50);
    assert!(report.summary.starts_with("Ticker ZZZZ not found"));
}

#[tokio::test]
async fn when_client_requests_tracked_ticker_sentiment_system_returns_analysis() {
    // Given: A running proxy
    let addr = spawn_proxy(ProxyConfig::default()).await;
    let endpoints = ProxyEndpoints::new(format!("http://{addr}"));
    let client = SentimentClient::new(endpoints.ai(), Arc::new(ReqwestHttpClient::new()));

    // When: Sentiment for NVDA is requested
    let report = client
        .analyze(&Symbol::parse("NVDA").expect("valid"))
        .await
        .expect("proxy answers");

    // Then: The tracked score and its label are returned
    assert!(report.found);
    assert_eq!(report.score, 84);
    assert_eq!(report.sentiment, SentimentLabel::Bullish);
    assert!(!report.drivers.is_empty());
}
