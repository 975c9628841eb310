use std::sync::Arc;
use std::time::Duration;

use super::{DataHook, DataHooks, FetchFuture, Fetcher, MockSource};
use crate::adapters::SentimentReport;
use crate::fallback::FallbackProvider;
use crate::sentiment::{market_mood, MarketMood, SentimentLabel, NEUTRAL_SCORE};
use crate::{Symbol, Ticker, UtcDateTime};

/// Basket whose daily moves drive the market mood.
pub const TOP_STOCKS: [&str; 10] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "META", "BRK.B", "AVGO", "JPM",
];

/// Default polling interval for the market mood hook.
pub const STOCK_SENTIMENT_REFRESH: Duration = Duration::from_secs(300);

impl DataHooks {
    /// Market-wide mood from the CoinMarketCap quotes of [`TOP_STOCKS`].
    ///
    /// Mount it with `HookOptions::polling(STOCK_SENTIMENT_REFRESH)`.
    pub fn use_stock_sentiment(&self) -> DataHook<MarketMood> {
        let basket = top_stocks();

        let client = self.coinmarketcap.clone();
        let fetcher: Fetcher<MarketMood> = Arc::new(move || -> FetchFuture<MarketMood> {
            let client = client.clone();
            let basket = basket.clone();
            Box::pin(async move {
                let tickers = client.get_tickers(&basket).await?;
                Ok(mood_from_tickers(&basket, &tickers))
            })
        });

        let mock: MockSource<MarketMood> = Arc::new(|_: &FallbackProvider| MarketMood::neutral());

        DataHook::new("stock_sentiment", fetcher, mock, self.fallback.clone())
    }

    /// AI sentiment analysis for one ticker.
    pub fn use_ticker_sentiment(&self, ticker: Symbol) -> DataHook<SentimentReport> {
        let key = format!("sentiment_{ticker}");

        let client = self.sentiment.clone();
        let requested = ticker.clone();
        let fetcher: Fetcher<SentimentReport> = Arc::new(move || -> FetchFuture<SentimentReport> {
            let client = client.clone();
            let ticker = requested.clone();
            Box::pin(async move { client.analyze(&ticker).await })
        });

        let mock: MockSource<SentimentReport> =
            Arc::new(move |_: &FallbackProvider| neutral_report(&ticker));

        DataHook::new(key, fetcher, mock, self.fallback.clone())
    }
}

fn top_stocks() -> Vec<Symbol> {
    TOP_STOCKS
        .iter()
        .filter_map(|raw| Symbol::parse(raw).ok())
        .collect()
}

/// One change per basket entry; symbols the vendor did not return count as flat.
pub fn mood_from_tickers(basket: &[Symbol], tickers: &[Ticker]) -> MarketMood {
    let changes: Vec<f64> = basket
        .iter()
        .map(|symbol| {
            tickers
                .iter()
                .find(|ticker| ticker.symbol() == symbol)
                .map(|ticker| ticker.quote.change_percent)
                .unwrap_or(0.0)
        })
        .collect();
    market_mood(&changes)
}

fn neutral_report(ticker: &Symbol) -> SentimentReport {
    SentimentReport {
        ticker: ticker.to_string(),
        found: false,
        sentiment: SentimentLabel::Neutral,
        score: NEUTRAL_SCORE,
        summary: format!(
            "Sentiment for {ticker} is unavailable right now; showing a neutral placeholder."
        ),
        drivers: Vec::new(),
        timestamp: UtcDateTime::now(),
    }
}
