use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapters::channel::ProxyChannel;
use crate::adapters::error::VendorApiError;
use crate::circuit_breaker::CircuitBreaker;
use crate::domain::{derive_news_id, NO_DESCRIPTION};
use crate::http_client::HttpClient;
use crate::sentiment::generate_sentiment_score;
use crate::vendor_policy::VendorPolicy;
use crate::{NewsItem, NewsSource, VendorId};

/// Top-headline categories supported by NewsAPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    #[default]
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
}

impl NewsCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Entertainment => "entertainment",
            Self::General => "general",
            Self::Health => "health",
            Self::Science => "science",
            Self::Sports => "sports",
            Self::Technology => "technology",
        }
    }
}

impl Display for NewsCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "business" => Ok(Self::Business),
            "entertainment" => Ok(Self::Entertainment),
            "general" => Ok(Self::General),
            "health" => Ok(Self::Health),
            "science" => Ok(Self::Science),
            "sports" => Ok(Self::Sports),
            "technology" => Ok(Self::Technology),
            other => Err(format!("unknown news category '{other}'")),
        }
    }
}

/// Ordering for `/everything` searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewsSortBy {
    Relevancy,
    Popularity,
    #[default]
    PublishedAt,
}

impl NewsSortBy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevancy => "relevancy",
            Self::Popularity => "popularity",
            Self::PublishedAt => "publishedAt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsApiSource {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    pub source: NewsApiSource,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
}

impl NewsApiResponse {
    pub fn news_items(&self) -> Vec<NewsItem> {
        self.articles.iter().map(convert_newsapi_article).collect()
    }
}

/// NewsAPI adapter routed through `/api/proxy/newsapi`.
#[derive(Clone)]
pub struct NewsApiClient {
    channel: ProxyChannel,
}

impl NewsApiClient {
    pub fn new(base_url: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_policy(base_url, http_client, &VendorPolicy::newsapi_default())
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

    pub fn reset_circuit_breaker(&self) {
        self.channel.circuit_breaker().reset();
    }

    pub async fn get_top_headlines(
        &self,
        country: &str,
        category: Option<NewsCategory>,
        page_size: u32,
    ) -> Result<NewsApiResponse, VendorApiError> {
        let mut params = vec![
            ("country", country.to_owned()),
            ("pageSize", page_size.to_string()),
        ];
        if let Some(category) = category {
            params.push(("category", category.as_str().to_owned()));
        }

        let body = self.channel.get_json("/top-headlines", &params).await?;
        serde_json::from_value(body).map_err(|e| VendorApiError::payload(VendorId::NewsApi, e))
    }

    pub async fn search_news(
        &self,
        query: &str,
        sort_by: NewsSortBy,
        page_size: u32,
    ) -> Result<NewsApiResponse, VendorApiError> {
        if query.trim().is_empty() {
            return Err(VendorApiError::invalid_request(
                VendorId::NewsApi,
                "search query must not be empty",
            ));
        }

        let body = self
            .channel
            .get_json(
                "/everything",
                &[
                    ("q", query.trim().to_owned()),
                    ("sortBy", sort_by.as_str().to_owned()),
                    ("pageSize", page_size.to_string()),
                ],
            )
            .await?;
        serde_json::from_value(body).map_err(|e| VendorApiError::payload(VendorId::NewsApi, e))
    }

    pub async fn get_business_news(
        &self,
        page_size: u32,
    ) -> Result<NewsApiResponse, VendorApiError> {
        self.get_top_headlines("us", Some(NewsCategory::Business), page_size)
            .await
    }
}

/// Maps a NewsAPI article onto a `NewsItem`, scoring it with the base lexicon.
pub fn convert_newsapi_article(article: &NewsApiArticle) -> NewsItem {
    NewsItem {
        id: derive_news_id(&[&article.url, &article.title, &article.published_at]),
        headline: article.title.clone(),
        summary: article
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_owned()),
        sentiment_score: generate_sentiment_score(&article.title, article.description.as_deref()),
        source: NewsSource {
            name: article.source.name.clone(),
            published_at: article.published_at.clone(),
        },
        original_url: article.url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_article_with_defaults() {
        let response: NewsApiResponse = serde_json::from_value(json!({
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": "Reuters"},
                "title": "Stocks surge on strong earnings",
                "description": null,
                "url": "https://news.test/a",
                "publishedAt": "2024-03-01T09:00:00Z"
            }]
        }))
        .expect("payload parses");

        let items = response.news_items();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].summary, NO_DESCRIPTION);
        assert_eq!(items[0].sentiment_score, 60);
        assert_eq!(items[0].source.name, "Reuters");
        assert_eq!(items[0].id, "httpsnewstestaStocks");
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Technology".parse::<NewsCategory>(), Ok(NewsCategory::Technology));
        assert!("weather".parse::<NewsCategory>().is_err());
        assert_eq!(NewsSortBy::default().as_str(), "publishedAt");
    }
}
