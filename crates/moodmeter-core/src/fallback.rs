//! Terminal fallback for market and news data.
//!
//! [`FallbackProvider`] never fails: it serves the last good payload stored
//! under a request key, or generates mock data with the same shape the
//! adapters return. The cache has no eviction of its own; long-running
//! callers trim it with [`FallbackProvider::prune_older_than`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::adapters::coinmarketcap::{CmcGlobalMetrics, CmcGlobalQuote};
use crate::domain::derive_news_id;
use crate::sentiment::generate_sentiment_score;
use crate::{AssetKind, NewsItem, NewsSource, QuoteSnapshot, Symbol, Ticker, UtcDateTime};

/// Maximum relative price jitter applied to mock quotes.
pub const PRICE_JITTER: f64 = 0.02;

struct KnownAsset {
    symbol: &'static str,
    name: &'static str,
    kind: AssetKind,
    exchange: &'static str,
    base_price: f64,
    supply: f64,
}

const KNOWN_ASSETS: &[KnownAsset] = &[
    KnownAsset {
        symbol: "AAPL",
        name: "Apple Inc.",
        kind: AssetKind::Stock,
        exchange: "NASDAQ",
        base_price: 175.0,
        supply: 15.5e9,
    },
    KnownAsset {
        symbol: "MSFT",
        name: "Microsoft Corporation",
        kind: AssetKind::Stock,
        exchange: "NASDAQ",
        base_price: 380.0,
        supply: 7.4e9,
    },
    KnownAsset {
        symbol: "GOOGL",
        name: "Alphabet Inc.",
        kind: AssetKind::Stock,
        exchange: "NASDAQ",
        base_price: 140.0,
        supply: 12.5e9,
    },
    KnownAsset {
        symbol: "AMZN",
        name: "Amazon.com Inc.",
        kind: AssetKind::Stock,
        exchange: "NASDAQ",
        base_price: 155.0,
        supply: 10.4e9,
    },
    KnownAsset {
        symbol: "NVDA",
        name: "NVIDIA Corporation",
        kind: AssetKind::Stock,
        exchange: "NASDAQ",
        base_price: 480.0,
        supply: 2.5e9,
    },
    KnownAsset {
        symbol: "TSLA",
        name: "Tesla Inc.",
        kind: AssetKind::Stock,
        exchange: "NASDAQ",
        base_price: 245.0,
        supply: 3.2e9,
    },
    KnownAsset {
        symbol: "META",
        name: "Meta Platforms Inc.",
        kind: AssetKind::Stock,
        exchange: "NASDAQ",
        base_price: 350.0,
        supply: 2.6e9,
    },
    KnownAsset {
        symbol: "JPM",
        name: "JPMorgan Chase & Co.",
        kind: AssetKind::Stock,
        exchange: "NYSE",
        base_price: 170.0,
        supply: 2.9e9,
    },
    KnownAsset {
        symbol: "BTC",
        name: "Bitcoin",
        kind: AssetKind::Crypto,
        exchange: "CMC",
        base_price: 65_000.0,
        supply: 19.6e6,
    },
    KnownAsset {
        symbol: "ETH",
        name: "Ethereum",
        kind: AssetKind::Crypto,
        exchange: "CMC",
        base_price: 3_500.0,
        supply: 120e6,
    },
    KnownAsset {
        symbol: "BNB",
        name: "BNB",
        kind: AssetKind::Crypto,
        exchange: "CMC",
        base_price: 580.0,
        supply: 150e6,
    },
    KnownAsset {
        symbol: "SOL",
        name: "Solana",
        kind: AssetKind::Crypto,
        exchange: "CMC",
        base_price: 150.0,
        supply: 440e6,
    },
    KnownAsset {
        symbol: "XRP",
        name: "XRP",
        kind: AssetKind::Crypto,
        exchange: "CMC",
        base_price: 0.6,
        supply: 54e9,
    },
    KnownAsset {
        symbol: "DOGE",
        name: "Dogecoin",
        kind: AssetKind::Crypto,
        exchange: "CMC",
        base_price: 0.15,
        supply: 143e9,
    },
];

/// Top of the crypto listing, in market-cap order.
const MOCK_LISTING_SYMBOLS: &[&str] = &[
    "BTC", "ETH", "BNB", "XRP", "ADA", "SOL", "DOT", "DOGE", "AVAX", "SHIB", "MATIC", "LINK",
    "UNI", "LTC", "BCH", "ATOM", "ICP", "NEAR", "ALGO", "FTM",
];

const MOCK_HEADLINES: &[(&str, &str, &str)] = &[
    (
        "Tech stocks rally as earnings beat expectations",
        "Major technology companies report strong quarterly growth.",
        "MarketWatch",
    ),
    (
        "Federal Reserve holds rates steady amid inflation concern",
        "Policy makers signal a cautious path for the rest of the year.",
        "Reuters",
    ),
    (
        "Bitcoin climbs as institutional demand returns",
        "Spot volumes rise across major exchanges.",
        "CoinDesk",
    ),
    (
        "Retail sales decline for second straight month",
        "Consumers pull back on discretionary spending.",
        "Bloomberg",
    ),
    (
        "Energy sector steady as oil prices hold",
        "Analysts expect range-bound trading into next quarter.",
        "Financial Times",
    ),
];

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// Mock data generator plus last-known-good cache.
#[derive(Debug, Clone, Default)]
pub struct FallbackProvider {
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl FallbackProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a successful payload under `key`, replacing any previous entry.
    pub async fn set_cached_data<T: Serialize>(&self, key: impl Into<String>, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(%error, "skipping unserializable fallback cache entry");
                return;
            }
        };

        self.cache.write().await.insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Cached payload for `key`, if present and shaped like `T`.
    pub async fn get_cached_data<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cache = self.cache.read().await;
        let entry = cache.get(key)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    /// How long ago `key` was stored.
    pub async fn cached_age(&self, key: &str) -> Option<Duration> {
        let cache = self.cache.read().await;
        cache.get(key).map(|entry| entry.stored_at.elapsed())
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Drops entries stored more than `age` ago and returns how many were removed.
    pub async fn prune_older_than(&self, age: Duration) -> usize {
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|_, entry| entry.stored_at.elapsed() <= age);
        before - cache.len()
    }

    pub fn get_mock_tickers(&self, symbols: &[Symbol]) -> Vec<Ticker> {
        symbols.iter().map(|symbol| self.get_mock_ticker(symbol)).collect()
    }

    /// Mock crypto listing of at most `limit` coins, ranked by position.
    pub fn get_mock_listings(&self, limit: usize) -> Vec<Ticker> {
        MOCK_LISTING_SYMBOLS
            .iter()
            .take(limit)
            .filter_map(|raw| Symbol::parse(raw).ok())
            .enumerate()
            .map(|(index, symbol)| {
                let mut ticker = self.get_mock_ticker(&symbol);
                ticker.asset_kind = AssetKind::Crypto;
                ticker.exchange = String::from("CMC");
                ticker.trending_score = (1000.0 - (index + 1) as f64) / 10.0;
                ticker
            })
            .collect()
    }

    /// Fixed market-wide figures in USD.
    pub fn get_mock_global_metrics(&self) -> CmcGlobalMetrics {
        let updated = UtcDateTime::now().format_rfc3339();
        let usd = CmcGlobalQuote {
            total_market_cap: Some(2_387_654_321_098.0),
            total_volume_24h: Some(98_765_432_109.0),
            total_market_cap_yesterday_percentage_change: Some(2.45),
            last_updated: Some(updated.clone()),
        };

        CmcGlobalMetrics {
            active_cryptocurrencies: Some(26_950),
            total_cryptocurrencies: Some(26_950),
            active_exchanges: Some(756),
            btc_dominance: Some(52.1456),
            eth_dominance: Some(17.8234),
            quote: HashMap::from([(String::from("USD"), usd)]),
            last_updated: Some(updated),
        }
    }

    /// Mock ticker around a known base price; unknown symbols get a random base.
    pub fn get_mock_ticker(&self, symbol: &Symbol) -> Ticker {
        let known = KNOWN_ASSETS
            .iter()
            .find(|asset| asset.symbol == symbol.as_str());

        let (name, kind, exchange, base_price, supply) = match known {
            Some(asset) => (
                asset.name.to_owned(),
                asset.kind,
                asset.exchange,
                asset.base_price,
                asset.supply,
            ),
            None => (
                symbol.as_str().to_owned(),
                AssetKind::Stock,
                "NASDAQ",
                10.0 + fastrand::f64() * 490.0,
                1.0e9,
            ),
        };

        let jitter = (fastrand::f64() * 2.0 - 1.0) * PRICE_JITTER;
        let price = base_price * (1.0 + jitter);
        let volume = 1.0e6 + fastrand::f64() * 4.9e7;

        Ticker {
            name,
            asset_kind: kind,
            exchange: exchange.to_owned(),
            quote: QuoteSnapshot::from_percent_change(
                symbol.clone(),
                price,
                jitter * 100.0,
                volume,
                Some(price * supply),
                UtcDateTime::now(),
            ),
            sentiment_score: 30.0 + fastrand::f64() * 50.0,
            trending_score: fastrand::f64() * 100.0,
        }
    }

    /// Five fixed headlines, newest first, scored with the keyword heuristic.
    pub fn get_mock_news(&self) -> Vec<NewsItem> {
        let now = UtcDateTime::now().into_inner();

        MOCK_HEADLINES
            .iter()
            .enumerate()
            .map(|(index, (headline, summary, source))| {
                let offset = now - time::Duration::hours(index as i64);
                let published_at = UtcDateTime::from_offset(offset).format_rfc3339();
                let url = format!("https://example.com/mock-news/{}", index + 1);

                NewsItem {
                    id: format!("mock_{}", derive_news_id(&[headline])),
                    headline: (*headline).to_owned(),
                    summary: (*summary).to_owned(),
                    sentiment_score: generate_sentiment_score(headline, Some(summary)),
                    source: NewsSource {
                        name: (*source).to_owned(),
                        published_at,
                    },
                    original_url: url,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(input: &str) -> Vec<Symbol> {
        Symbol::parse_list(input).expect("valid symbols")
    }

    #[test]
    fn mock_tickers_match_requested_symbols() {
        let provider = FallbackProvider::new();
        let tickers = provider.get_mock_tickers(&symbols("AAPL,BTC,QQQX"));

        assert_eq!(tickers.len(), 3);
        assert_eq!(tickers[0].name, "Apple Inc.");
        assert_eq!(tickers[1].asset_kind, AssetKind::Crypto);
        assert_eq!(tickers[2].name, "QQQX");
        assert_eq!(tickers[2].symbol().as_str(), "QQQX");
    }

    #[test]
    fn mock_prices_stay_within_jitter_band() {
        let provider = FallbackProvider::new();
        let btc = Symbol::parse("BTC").expect("valid");

        for _ in 0..200 {
            let ticker = provider.get_mock_ticker(&btc);
            assert!(ticker.quote.price >= 65_000.0 * (1.0 - PRICE_JITTER) - 1e-6);
            assert!(ticker.quote.price <= 65_000.0 * (1.0 + PRICE_JITTER) + 1e-6);
            assert!(ticker.quote.change_percent.abs() <= PRICE_JITTER * 100.0 + 1e-9);
        }
    }

    #[test]
    fn mock_listings_are_ranked_crypto_capped_at_limit() {
        let provider = FallbackProvider::new();

        let listings = provider.get_mock_listings(5);
        assert_eq!(listings.len(), 5);
        assert_eq!(listings[0].symbol().as_str(), "BTC");
        assert_eq!(listings[4].symbol().as_str(), "ADA");
        assert!(listings
            .iter()
            .all(|ticker| ticker.asset_kind == AssetKind::Crypto && ticker.exchange == "CMC"));
        assert!(listings[0].trending_score > listings[4].trending_score);

        assert_eq!(provider.get_mock_listings(100).len(), MOCK_LISTING_SYMBOLS.len());
    }

    #[test]
    fn mock_global_metrics_carry_usd_quote() {
        let metrics = FallbackProvider::new().get_mock_global_metrics();

        assert_eq!(metrics.active_cryptocurrencies, Some(26_950));
        assert_eq!(metrics.btc_dominance, Some(52.1456));
        let usd = metrics.quote.get("USD").expect("usd quote");
        assert_eq!(usd.total_market_cap_yesterday_percentage_change, Some(2.45));
    }

    #[test]
    fn mock_news_has_five_scored_items() {
        let news = FallbackProvider::new().get_mock_news();

        assert_eq!(news.len(), 5);
        assert!(news.iter().all(|item| item.sentiment_score <= 100));
        assert!(news[0].source.published_at >= news[4].source.published_at);
    }

    #[tokio::test]
    async fn cache_round_trips_typed_payloads() {
        let provider = FallbackProvider::new();
        let news = provider.get_mock_news();

        provider.set_cached_data("news_headlines_us_business", &news).await;

        let cached: Option<Vec<NewsItem>> =
            provider.get_cached_data("news_headlines_us_business").await;
        assert_eq!(cached, Some(news));
        assert_eq!(provider.cached_len().await, 1);

        let wrong_shape: Option<Vec<Ticker>> =
            provider.get_cached_data("news_headlines_us_business").await;
        assert!(wrong_shape.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn prune_drops_only_stale_entries() {
        let provider = FallbackProvider::new();
        provider.set_cached_data("old", &1_u32).await;
        tokio::time::advance(Duration::from_secs(120)).await;
        provider.set_cached_data("fresh", &2_u32).await;

        let removed = provider.prune_older_than(Duration::from_secs(60)).await;

        assert_eq!(removed, 1);
        assert_eq!(provider.get_cached_data::<u32>("fresh").await, Some(2));
        assert_eq!(provider.get_cached_data::<u32>("old").await, None);
    }
}
