//! Polling data hooks.
//!
//! A [`DataHook`] owns the `{data, loading, error}` state for one logical
//! query. Fetch failures never escape: the hook records a readable error and
//! substitutes the last cached payload for its key, or mock data when nothing
//! was cached. [`DataHook::mount`] starts the fetch-then-poll loop; dropping
//! the returned [`MountedHook`] stops it.

mod market;
mod news;
mod sentiment;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::adapters::{
    CoinMarketCapClient, NewsApiClient, SentimentClient, SerpApiClient, VendorApiError,
};
use crate::config::ProxyEndpoints;
use crate::fallback::FallbackProvider;
use crate::http_client::HttpClient;

pub use market::DEFAULT_LISTING_LIMIT;
pub use news::{merge_news, MAX_COMBINED_ARTICLES};
pub use sentiment::{mood_from_tickers, STOCK_SENTIMENT_REFRESH, TOP_STOCKS};

pub type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, VendorApiError>> + Send>>;

/// Produces one fetch attempt per call.
pub type Fetcher<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// Builds placeholder data when neither the vendor nor the cache can answer.
pub type MockSource<T> = Arc<dyn Fn(&FallbackProvider) -> T + Send + Sync>;

/// Observable hook state.
#[derive(Debug, Clone, PartialEq)]
pub struct HookState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// False while `data` comes from the cache or the mock generator.
    pub is_real_data: bool,
}

impl<T> Default for HookState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            is_real_data: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookOptions {
    pub enabled: bool,
    /// Zero disables polling: one fetch per mount.
    pub refresh_interval: Duration,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_interval: Duration::ZERO,
        }
    }
}

impl HookOptions {
    pub fn polling(refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

struct HookInner<T> {
    cache_key: String,
    fetcher: Fetcher<T>,
    mock: MockSource<T>,
    fallback: FallbackProvider,
    state: Mutex<HookState<T>>,
}

/// State holder for one query. Clones share state.
pub struct DataHook<T> {
    inner: Arc<HookInner<T>>,
}

impl<T> Clone for DataHook<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> DataHook<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(
        cache_key: impl Into<String>,
        fetcher: Fetcher<T>,
        mock: MockSource<T>,
        fallback: FallbackProvider,
    ) -> Self {
        Self {
            inner: Arc::new(HookInner {
                cache_key: cache_key.into(),
                fetcher,
                mock,
                fallback,
                state: Mutex::new(HookState::default()),
            }),
        }
    }

    pub fn cache_key(&self) -> &str {
        &self.inner.cache_key
    }

    pub fn snapshot(&self) -> HookState<T> {
        self.lock().clone()
    }

    /// Runs one fetch and updates state. Never fails.
    pub async fn refetch(&self) {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }

        match (self.inner.fetcher)().await {
            Ok(data) => {
                self.inner
                    .fallback
                    .set_cached_data(self.inner.cache_key.clone(), &data)
                    .await;

                let mut state = self.lock();
                state.data = Some(data);
                state.loading = false;
                state.error = None;
                state.is_real_data = true;
            }
            Err(error) => {
                let cached = self
                    .inner
                    .fallback
                    .get_cached_data::<T>(&self.inner.cache_key)
                    .await;
                let (data, origin) = match cached {
                    Some(data) => (data, "cached"),
                    None => ((self.inner.mock)(&self.inner.fallback), "mock"),
                };

                tracing::warn!(
                    key = %self.inner.cache_key,
                    vendor = %error.vendor(),
                    code = error.error_code(),
                    origin,
                    "fetch failed; serving fallback data"
                );

                let mut state = self.lock();
                state.data = Some(data);
                state.loading = false;
                state.error = Some(format!("Using {origin} data - {}", error.user_message()));
                state.is_real_data = false;
            }
        }
    }

    /// Fetches once (when enabled) and then every `refresh_interval` until
    /// the returned guard is dropped. Must be called inside a tokio runtime.
    pub fn mount(&self, options: HookOptions) -> MountedHook {
        if !options.enabled {
            return MountedHook { task: None };
        }

        let hook = self.clone();
        let period = options.refresh_interval;
        let task = tokio::spawn(async move {
            hook.refetch().await;
            if period.is_zero() {
                return;
            }

            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                hook.refetch().await;
            }
        });

        MountedHook { task: Some(task) }
    }

    fn lock(&self) -> MutexGuard<'_, HookState<T>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live subscription returned by [`DataHook::mount`].
///
/// Dropping it aborts the polling task, including a fetch still in flight.
#[derive(Debug)]
pub struct MountedHook {
    task: Option<JoinHandle<()>>,
}

impl MountedHook {
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn unmount(self) {}
}

impl Drop for MountedHook {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Hook factory wired to one proxy and one shared fallback provider.
#[derive(Clone)]
pub struct DataHooks {
    coinmarketcap: CoinMarketCapClient,
    newsapi: NewsApiClient,
    serpapi: SerpApiClient,
    sentiment: SentimentClient,
    fallback: FallbackProvider,
}

impl DataHooks {
    pub fn new(endpoints: &ProxyEndpoints, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            coinmarketcap: CoinMarketCapClient::new(
                endpoints.coinmarketcap(),
                Arc::clone(&http_client),
            ),
            newsapi: NewsApiClient::new(endpoints.newsapi(), Arc::clone(&http_client)),
            serpapi: SerpApiClient::new(endpoints.serpapi(), Arc::clone(&http_client)),
            sentiment: SentimentClient::new(endpoints.ai(), http_client),
            fallback: FallbackProvider::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackProvider) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn fallback(&self) -> &FallbackProvider {
        &self.fallback
    }

    pub fn coinmarketcap(&self) -> &CoinMarketCapClient {
        &self.coinmarketcap
    }

    pub fn newsapi(&self) -> &NewsApiClient {
        &self.newsapi
    }

    pub fn serpapi(&self) -> &SerpApiClient {
        &self.serpapi
    }

    pub fn sentiment(&self) -> &SentimentClient {
        &self.sentiment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::VendorId;

    fn counting_hook(
        calls: Arc<AtomicUsize>,
        fail: bool,
        fallback: FallbackProvider,
    ) -> DataHook<Vec<u32>> {
        let fetcher: Fetcher<Vec<u32>> = Arc::new(move || {
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) as u32;
                if fail {
                    Err(VendorApiError::vendor_reported(
                        VendorId::NewsApi,
                        "rate limit exceeded",
                        Some(String::from("rateLimited")),
                        Some(429),
                    ))
                } else {
                    Ok(vec![attempt])
                }
            })
        });
        let mock: MockSource<Vec<u32>> = Arc::new(|_: &FallbackProvider| vec![999]);
        DataHook::new("numbers", fetcher, mock, fallback)
    }

    // ==========================================================================
    // Polling lifecycle
    // ==========================================================================

    #[tokio::test(start_paused = true)]
    async fn when_refresh_interval_is_zero_system_fetches_exactly_once() {
        // Given
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = counting_hook(Arc::clone(&calls), false, FallbackProvider::new());

        // When
        let mounted = hook.mount(HookOptions::default());
        tokio::time::sleep(Duration::from_secs(3600)).await;

        // Then
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!mounted.is_active());
        assert_eq!(hook.snapshot().data, Some(vec![0]));
    }

    #[tokio::test(start_paused = true)]
    async fn when_polling_system_waits_full_interval_and_stops_after_unmount() {
        // Given
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = counting_hook(Arc::clone(&calls), false, FallbackProvider::new());

        // When
        let mounted = hook.mount(HookOptions::polling(Duration::from_millis(100)));
        tokio::time::sleep(Duration::from_millis(99)).await;

        // Then
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        drop(mounted);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn when_disabled_system_never_fetches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = counting_hook(Arc::clone(&calls), false, FallbackProvider::new());

        let mounted = hook.mount(HookOptions::disabled());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!mounted.is_active());
        assert_eq!(hook.snapshot(), HookState::default());
    }

    // ==========================================================================
    // Fallback substitution
    // ==========================================================================

    #[tokio::test]
    async fn when_fetch_fails_without_cache_system_serves_mock_data() {
        // Given
        let hook = counting_hook(Arc::new(AtomicUsize::new(0)), true, FallbackProvider::new());

        // When
        hook.refetch().await;

        // Then
        let state = hook.snapshot();
        assert_eq!(state.data, Some(vec![999]));
        assert!(!state.loading);
        assert!(!state.is_real_data);
        assert_eq!(
            state.error.as_deref(),
            Some("Using mock data - API rate limit reached")
        );
    }

    #[tokio::test]
    async fn when_fetch_fails_after_success_system_serves_cached_payload() {
        // Given
        let fallback = FallbackProvider::new();
        let good = counting_hook(Arc::new(AtomicUsize::new(0)), false, fallback.clone());
        good.refetch().await;
        assert!(good.snapshot().is_real_data);

        // When
        let failing = counting_hook(Arc::new(AtomicUsize::new(0)), true, fallback);
        failing.refetch().await;

        // Then
        let state = failing.snapshot();
        assert_eq!(state.data, Some(vec![0]));
        assert_eq!(
            state.error.as_deref(),
            Some("Using cached data - API rate limit reached")
        );
    }
}
