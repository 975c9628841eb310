use std::sync::Arc;

use super::{DataHook, DataHooks, FetchFuture, Fetcher, MockSource};
use crate::adapters::{convert_cmc_to_ticker, CmcGlobalMetrics, ListingSort};
use crate::fallback::FallbackProvider;
use crate::{Symbol, Ticker};

const CONVERT: &str = "USD";

/// Listing size used when the caller has no preference.
pub const DEFAULT_LISTING_LIMIT: u32 = 20;

impl DataHooks {
    /// CoinMarketCap quotes for `symbols`, in request order.
    pub fn use_coin_market_cap(&self, symbols: Vec<Symbol>) -> DataHook<Vec<Ticker>> {
        let key = format!("cmc_quotes_{}", Symbol::join(&symbols).replace(',', "_"));

        let client = self.coinmarketcap.clone();
        let requested = symbols.clone();
        let fetcher: Fetcher<Vec<Ticker>> = Arc::new(move || -> FetchFuture<Vec<Ticker>> {
            let client = client.clone();
            let symbols = requested.clone();
            Box::pin(async move { client.get_tickers(&symbols).await })
        });

        let mock: MockSource<Vec<Ticker>> =
            Arc::new(move |fallback: &FallbackProvider| fallback.get_mock_tickers(&symbols));

        DataHook::new(key, fetcher, mock, self.fallback.clone())
    }

    /// Top `limit` cryptocurrencies by market cap, as tickers.
    pub fn use_crypto_listings(&self, limit: u32) -> DataHook<Vec<Ticker>> {
        let key = format!("cmc_listings_{limit}");

        let client = self.coinmarketcap.clone();
        let fetcher: Fetcher<Vec<Ticker>> = Arc::new(move || -> FetchFuture<Vec<Ticker>> {
            let client = client.clone();
            Box::pin(async move {
                let response = client
                    .get_listings_latest(1, limit, CONVERT, ListingSort::MarketCap)
                    .await?;
                Ok(response
                    .data
                    .iter()
                    .filter_map(|crypto| convert_cmc_to_ticker(crypto, CONVERT))
                    .collect())
            })
        });

        let mock: MockSource<Vec<Ticker>> = Arc::new(move |fallback: &FallbackProvider| {
            fallback.get_mock_listings(limit as usize)
        });

        DataHook::new(key, fetcher, mock, self.fallback.clone())
    }

    /// Market-wide capitalization, volume and dominance figures.
    pub fn use_global_metrics(&self) -> DataHook<CmcGlobalMetrics> {
        let client = self.coinmarketcap.clone();
        let fetcher: Fetcher<CmcGlobalMetrics> = Arc::new(move || -> FetchFuture<CmcGlobalMetrics> {
            let client = client.clone();
            Box::pin(async move { Ok(client.get_global_metrics(CONVERT).await?.data) })
        });

        let mock: MockSource<CmcGlobalMetrics> =
            Arc::new(|fallback: &FallbackProvider| fallback.get_mock_global_metrics());

        DataHook::new("cmc_global_metrics", fetcher, mock, self.fallback.clone())
    }
}
