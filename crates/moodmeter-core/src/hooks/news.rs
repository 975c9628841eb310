use std::cmp::Reverse;
use std::sync::Arc;

use super::{DataHook, DataHooks, FetchFuture, Fetcher, MockSource};
use crate::adapters::{NewsCategory, NewsSortBy};
use crate::fallback::FallbackProvider;
use crate::{NewsItem, UtcDateTime};

const PAGE_SIZE: u32 = 20;

/// Cap on merged business news.
pub const MAX_COMBINED_ARTICLES: usize = 30;

/// Headlines sharing this many leading characters are treated as duplicates.
const SIMILAR_PREFIX_CHARS: usize = 50;

impl DataHooks {
    pub fn use_top_headlines(
        &self,
        country: &str,
        category: NewsCategory,
    ) -> DataHook<Vec<NewsItem>> {
        let key = format!("news_headlines_{country}_{category}");

        let client = self.newsapi.clone();
        let country = country.to_owned();
        let fetcher: Fetcher<Vec<NewsItem>> = Arc::new(move || -> FetchFuture<Vec<NewsItem>> {
            let client = client.clone();
            let country = country.clone();
            Box::pin(async move {
                let response = client
                    .get_top_headlines(&country, Some(category), PAGE_SIZE)
                    .await?;
                Ok(response.news_items())
            })
        });

        DataHook::new(key, fetcher, mock_news(), self.fallback.clone())
    }

    pub fn use_news_search(&self, query: &str) -> DataHook<Vec<NewsItem>> {
        let key = format!("news_search_{query}");

        let client = self.newsapi.clone();
        let query = query.to_owned();
        let fetcher: Fetcher<Vec<NewsItem>> = Arc::new(move || -> FetchFuture<Vec<NewsItem>> {
            let client = client.clone();
            let query = query.clone();
            Box::pin(async move {
                let response = client
                    .search_news(&query, NewsSortBy::PublishedAt, PAGE_SIZE)
                    .await?;
                Ok(response.news_items())
            })
        });

        DataHook::new(key, fetcher, mock_news(), self.fallback.clone())
    }

    /// Google News results for cryptocurrency and bitcoin.
    pub fn use_crypto_news(&self) -> DataHook<Vec<NewsItem>> {
        let client = self.serpapi.clone();
        let fetcher: Fetcher<Vec<NewsItem>> = Arc::new(move || -> FetchFuture<Vec<NewsItem>> {
            let client = client.clone();
            Box::pin(async move { Ok(client.get_crypto_news(PAGE_SIZE).await?.news_items()) })
        });

        DataHook::new("serp_crypto_news", fetcher, mock_news(), self.fallback.clone())
    }

    /// NewsAPI business headlines merged with Google News business results.
    ///
    /// One failing source is tolerated; the hook only falls back when both fail.
    pub fn use_combined_business_news(&self) -> DataHook<Vec<NewsItem>> {
        let newsapi = self.newsapi.clone();
        let serpapi = self.serpapi.clone();
        let fetcher: Fetcher<Vec<NewsItem>> = Arc::new(move || -> FetchFuture<Vec<NewsItem>> {
            let newsapi = newsapi.clone();
            let serpapi = serpapi.clone();
            Box::pin(async move {
                let (headlines, google) = tokio::join!(
                    newsapi.get_business_news(PAGE_SIZE),
                    serpapi.get_business_news(PAGE_SIZE)
                );

                match (headlines, google) {
                    (Err(first), Err(second)) => {
                        tracing::warn!(other = %second, "both business news sources failed");
                        Err(first)
                    }
                    (headlines, google) => {
                        let mut lists = Vec::with_capacity(2);
                        match headlines {
                            Ok(response) => lists.push(response.news_items()),
                            Err(error) => {
                                tracing::warn!(%error, "NewsAPI business news unavailable")
                            }
                        }
                        match google {
                            Ok(response) => lists.push(response.news_items()),
                            Err(error) => {
                                tracing::warn!(%error, "SerpAPI business news unavailable")
                            }
                        }
                        Ok(merge_news(lists, MAX_COMBINED_ARTICLES))
                    }
                }
            })
        });

        DataHook::new("combined_business_news", fetcher, mock_news(), self.fallback.clone())
    }
}

fn mock_news() -> MockSource<Vec<NewsItem>> {
    Arc::new(|fallback: &FallbackProvider| fallback.get_mock_news())
}

/// Concatenates `lists`, drops duplicates, sorts newest first (ties broken by
/// higher sentiment) and keeps at most `max` items.
///
/// Two items are duplicates when their trimmed lower-cased headlines match,
/// their URLs match, or their headlines share the first 50 characters. The
/// first occurrence wins.
pub fn merge_news(lists: Vec<Vec<NewsItem>>, max: usize) -> Vec<NewsItem> {
    let mut merged: Vec<NewsItem> = Vec::new();

    for item in lists.into_iter().flatten() {
        if !merged.iter().any(|existing| is_duplicate(existing, &item)) {
            merged.push(item);
        }
    }

    merged.sort_by_key(|item| {
        (
            Reverse(UtcDateTime::parse(&item.source.published_at).ok()),
            Reverse(item.sentiment_score),
        )
    });
    merged.truncate(max);
    merged
}

fn is_duplicate(a: &NewsItem, b: &NewsItem) -> bool {
    let headline_a = a.headline.trim().to_lowercase();
    let headline_b = b.headline.trim().to_lowercase();

    headline_a == headline_b
        || (!a.original_url.is_empty() && a.original_url == b.original_url)
        || prefix(&a.headline) == prefix(&b.headline)
}

fn prefix(headline: &str) -> String {
    headline.to_lowercase().chars().take(SIMILAR_PREFIX_CHARS).collect()
}
