use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapters::channel::ProxyChannel;
use crate::adapters::error::VendorApiError;
use crate::circuit_breaker::CircuitBreaker;
use crate::http_client::HttpClient;
use crate::vendor_policy::VendorPolicy;
use crate::{AssetKind, QuoteSnapshot, Symbol, Ticker, UtcDateTime, VendorId};

/// CoinMarketCap response status block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmcStatus {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub elapsed: Option<u64>,
    #[serde(default)]
    pub credit_count: Option<u64>,
    #[serde(default)]
    pub notice: Option<String>,
}

/// Market data for one cryptocurrency in one convert currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmcQuote {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub volume_change_24h: Option<f64>,
    #[serde(default)]
    pub percent_change_1h: Option<f64>,
    #[serde(default)]
    pub percent_change_24h: Option<f64>,
    #[serde(default)]
    pub percent_change_7d: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_dominance: Option<f64>,
    #[serde(default)]
    pub fully_diluted_market_cap: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmcCryptocurrency {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub cmc_rank: Option<u32>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub max_supply: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub quote: HashMap<String, CmcQuote>,
}

/// `/cryptocurrency/quotes/latest` payload, keyed by symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmcQuotesResponse {
    pub status: CmcStatus,
    #[serde(default)]
    pub data: HashMap<String, CmcCryptocurrency>,
}

/// `/cryptocurrency/listings/latest` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmcListingsResponse {
    pub status: CmcStatus,
    #[serde(default)]
    pub data: Vec<CmcCryptocurrency>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmcGlobalQuote {
    #[serde(default)]
    pub total_market_cap: Option<f64>,
    #[serde(default)]
    pub total_volume_24h: Option<f64>,
    #[serde(default)]
    pub total_market_cap_yesterday_percentage_change: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmcGlobalMetrics {
    #[serde(default)]
    pub active_cryptocurrencies: Option<u64>,
    #[serde(default)]
    pub total_cryptocurrencies: Option<u64>,
    #[serde(default)]
    pub active_exchanges: Option<u64>,
    #[serde(default)]
    pub btc_dominance: Option<f64>,
    #[serde(default)]
    pub eth_dominance: Option<f64>,
    #[serde(default)]
    pub quote: HashMap<String, CmcGlobalQuote>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// `/global-metrics/quotes/latest` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmcGlobalMetricsResponse {
    pub status: CmcStatus,
    pub data: CmcGlobalMetrics,
}

/// Sort keys accepted by the listings endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingSort {
    #[default]
    MarketCap,
    Volume24h,
    PercentChange24h,
}

impl ListingSort {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MarketCap => "market_cap",
            Self::Volume24h => "volume_24h",
            Self::PercentChange24h => "percent_change_24h",
        }
    }
}

/// CoinMarketCap adapter. Calls go to the proxy, which injects the API key.
#[derive(Clone)]
pub struct CoinMarketCapClient {
    channel: ProxyChannel,
}

impl CoinMarketCapClient {
    /// `base_url` is the proxy prefix, e.g. `http://localhost:3001/api/proxy/coinmarketcap`.
    pub fn new(base_url: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_policy(base_url, http_client, &VendorPolicy::coinmarketcap_default())
    }

    pub fn with_policy(
        base_url: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
        policy: &VendorPolicy,
    ) -> Self {
        Self {
            channel: ProxyChannel::new(base_url, http_client, policy),
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.channel = self.channel.with_circuit_breaker(circuit_breaker);
        self
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        self.channel.circuit_breaker()
    }

    /// Closes the circuit and forgets a previously detected proxy outage.
    pub fn reset_circuit_breaker(&self) {
        self.channel.circuit_breaker().reset();
    }

    pub async fn get_quotes_by_symbol(
        &self,
        symbols: &[Symbol],
        convert: &str,
    ) -> Result<CmcQuotesResponse, VendorApiError> {
        if symbols.is_empty() {
            return Err(VendorApiError::invalid_request(
                VendorId::CoinMarketCap,
                "quote request must include at least one symbol",
            ));
        }

        let body = self
            .channel
            .get_json(
                "/quotes",
                &[
                    ("symbol", Symbol::join(symbols)),
                    ("convert", convert.to_owned()),
                ],
            )
            .await?;
        serde_json::from_value(body)
            .map_err(|e| VendorApiError::payload(VendorId::CoinMarketCap, e))
    }

    pub async fn get_listings_latest(
        &self,
        start: u32,
        limit: u32,
        convert: &str,
        sort: ListingSort,
    ) -> Result<CmcListingsResponse, VendorApiError> {
        let body = self
            .channel
            .get_json(
                "/listings",
                &[
                    ("start", start.max(1).to_string()),
                    ("limit", limit.to_string()),
                    ("convert", convert.to_owned()),
                    ("sort", sort.as_str().to_owned()),
                ],
            )
            .await?;
        serde_json::from_value(body)
            .map_err(|e| VendorApiError::payload(VendorId::CoinMarketCap, e))
    }

    pub async fn get_global_metrics(
        &self,
        convert: &str,
    ) -> Result<CmcGlobalMetricsResponse, VendorApiError> {
        let body = self
            .channel
            .get_json("/global-metrics", &[("convert", convert.to_owned())])
            .await?;
        serde_json::from_value(body)
            .map_err(|e| VendorApiError::payload(VendorId::CoinMarketCap, e))
    }

    /// Quotes converted to tickers, in the order the symbols were requested.
    pub async fn get_tickers(&self, symbols: &[Symbol]) -> Result<Vec<Ticker>, VendorApiError> {
        let response = self.get_quotes_by_symbol(symbols, "USD").await?;
        Ok(response.tickers_for(symbols, "USD"))
    }
}

impl CmcQuotesResponse {
    /// Tickers for `symbols` in request order; symbols missing from the payload are skipped.
    pub fn tickers_for(&self, symbols: &[Symbol], convert: &str) -> Vec<Ticker> {
        symbols
            .iter()
            .filter_map(|symbol| {
                self.data
                    .get(symbol.as_str())
                    .or_else(|| {
                        self.data
                            .values()
                            .find(|crypto| crypto.symbol.eq_ignore_ascii_case(symbol.as_str()))
                    })
            })
            .filter_map(|crypto| convert_cmc_to_ticker(crypto, convert))
            .collect()
    }
}

/// Converts a CoinMarketCap record into a ticker.
///
/// `change_percent` is the vendor's `percent_change_24h` verbatim; the
/// absolute change is derived from it. Returns `None` for unusable symbols.
pub fn convert_cmc_to_ticker(crypto: &CmcCryptocurrency, convert: &str) -> Option<Ticker> {
    let symbol = Symbol::parse(&crypto.symbol).ok()?;
    let quote = crypto
        .quote
        .get(convert)
        .or_else(|| crypto.quote.values().next());

    let price = quote.and_then(|q| q.price).unwrap_or_default();
    let change_percent = quote.and_then(|q| q.percent_change_24h).unwrap_or_default();
    let volume = quote.and_then(|q| q.volume_24h).unwrap_or_default();
    let market_cap = quote.and_then(|q| q.market_cap);
    let last_updated = quote
        .and_then(|q| q.last_updated.as_deref())
        .or(crypto.last_updated.as_deref())
        .map(UtcDateTime::parse_or_now)
        .unwrap_or_else(UtcDateTime::now);

    Some(Ticker {
        name: crypto.name.clone(),
        asset_kind: AssetKind::Crypto,
        exchange: String::from("CMC"),
        quote: QuoteSnapshot::from_percent_change(
            symbol,
            price,
            change_percent,
            volume,
            market_cap,
            last_updated,
        ),
        sentiment_score: 0.0,
        trending_score: crypto
            .cmc_rank
            .map(|rank| (1000.0 - f64::from(rank)) / 10.0)
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quotes_payload() -> serde_json::Value {
        json!({
            "status": {"error_code": 0, "error_message": null},
            "data": {
                "BTC": {
                    "id": 1, "name": "Bitcoin", "symbol": "BTC", "cmc_rank": 1,
                    "quote": {"USD": {
                        "price": 60000.0, "volume_24h": 1.0e10,
                        "percent_change_24h": 2.0, "market_cap": 1.2e12,
                        "last_updated": "2024-03-01T12:00:00.000Z"
                    }}
                },
                "ETH": {
                    "id": 1027, "name": "Ethereum", "symbol": "ETH",
                    "quote": {"USD": {"price": 3000.0, "percent_change_24h": -1.5}}
                }
            }
        })
    }

    #[test]
    fn converts_record_using_percent_change_verbatim() {
        let response: CmcQuotesResponse =
            serde_json::from_value(quotes_payload()).expect("payload parses");
        let btc = convert_cmc_to_ticker(&response.data["BTC"], "USD").expect("converts");

        assert_eq!(btc.quote.change_percent, 2.0);
        assert!((btc.quote.change - 1200.0).abs() < 1e-9);
        assert_eq!(btc.exchange, "CMC");
        assert_eq!(btc.asset_kind, AssetKind::Crypto);
        assert!((btc.trending_score - 99.9).abs() < 1e-9);
        assert_eq!(btc.quote.last_updated.format_rfc3339(), "2024-03-01T12:00:00Z");
    }

    #[test]
    fn tickers_follow_request_order_and_skip_missing() {
        let response: CmcQuotesResponse =
            serde_json::from_value(quotes_payload()).expect("payload parses");
        let symbols = Symbol::parse_list("ETH,DOGE,BTC").expect("valid symbols");

        let tickers = response.tickers_for(&symbols, "USD");
        let order: Vec<&str> = tickers.iter().map(|t| t.symbol().as_str()).collect();

        assert_eq!(order, vec!["ETH", "BTC"]);
        assert_eq!(tickers[0].trending_score, 0.0);
    }

    #[test]
    fn listing_sort_wire_names() {
        assert_eq!(ListingSort::default().as_str(), "market_cap");
        assert_eq!(ListingSort::PercentChange24h.as_str(), "percent_change_24h");
    }
}
