use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::adapters::channel::ProxyChannel;
use crate::adapters::error::VendorApiError;
use crate::circuit_breaker::CircuitBreaker;
use crate::domain::{derive_news_id, NO_DESCRIPTION};
use crate::http_client::HttpClient;
use crate::sentiment::{score_with, Lexicon};
use crate::vendor_policy::VendorPolicy;
use crate::{NewsItem, NewsSource, UtcDateTime, VendorId};

/// Google News reports the publisher either as a bare name or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerpSource {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        icon: Option<String>,
    },
}

impl SerpSource {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed { name, .. } => name,
        }
    }
}

impl Default for SerpSource {
    fn default() -> Self {
        Self::Name(String::from("Google News"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpStory {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub source: SerpSource,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpNewsArticle {
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub source: SerpSource,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub stories: Vec<SerpStory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpApiResponse {
    #[serde(default)]
    pub search_metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub search_parameters: Option<serde_json::Value>,
    #[serde(default)]
    pub news_results: Vec<SerpNewsArticle>,
}

impl SerpApiResponse {
    pub fn news_items(&self) -> Vec<NewsItem> {
        self.news_results.iter().map(convert_serp_article).collect()
    }
}

/// SerpAPI Google News adapter routed through `/api/proxy/serpapi`.
#[derive(Clone)]
pub struct SerpApiClient {
    channel: ProxyChannel,
}

impl SerpApiClient {
    pub fn new(base_url: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_policy(base_url, http_client, &VendorPolicy::serpapi_default())
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

    pub async fn search_news(
        &self,
        query: &str,
        country: &str,
        language: &str,
        num: u32,
    ) -> Result<SerpApiResponse, VendorApiError> {
        if query.trim().is_empty() {
            return Err(VendorApiError::invalid_request(
                VendorId::SerpApi,
                "search query must not be empty",
            ));
        }

        let body = self
            .channel
            .get_json(
                "/search",
                &[
                    ("q", query.trim().to_owned()),
                    ("gl", country.to_owned()),
                    ("hl", language.to_owned()),
                    ("num", num.to_string()),
                ],
            )
            .await?;
        serde_json::from_value(body).map_err(|e| VendorApiError::payload(VendorId::SerpApi, e))
    }

    pub async fn get_business_news(&self, num: u32) -> Result<SerpApiResponse, VendorApiError> {
        self.search_news("business news", "us", "en", num).await
    }

    pub async fn get_crypto_news(&self, num: u32) -> Result<SerpApiResponse, VendorApiError> {
        self.search_news("cryptocurrency bitcoin", "us", "en", num)
            .await
    }
}

/// Maps a Google News result onto a `NewsItem`, scoring it with the extended lexicon.
pub fn convert_serp_article(article: &SerpNewsArticle) -> NewsItem {
    NewsItem {
        id: format!("serp_{}", derive_news_id(&[&article.link, &article.title])),
        headline: article.title.clone(),
        summary: article
            .snippet
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_owned()),
        sentiment_score: score_with(&Lexicon::EXTENDED, &article.title, article.snippet.as_deref()),
        source: NewsSource {
            name: article.source.name().to_owned(),
            published_at: parse_serp_date(&article.date).format_rfc3339(),
        },
        original_url: article.link.clone(),
    }
}

/// Accepts RFC3339 or the Google News form `03/01/2024, 08:00 AM, +0000 UTC`.
/// Anything else becomes the current time.
pub fn parse_serp_date(input: &str) -> UtcDateTime {
    if let Ok(parsed) = UtcDateTime::parse(input) {
        return parsed;
    }

    parse_google_news_date(input)
        .map(|value| UtcDateTime::from_offset(value.assume_utc()))
        .unwrap_or_else(UtcDateTime::now)
}

fn parse_google_news_date(input: &str) -> Option<PrimitiveDateTime> {
    let local_part = input.split(", +").next()?.trim();
    let format = format_description!("[month]/[day]/[year], [hour repr:12]:[minute] [period]");
    PrimitiveDateTime::parse(local_part, format).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_google_news_dates() {
        let parsed = parse_serp_date("03/01/2024, 08:05 PM, +0000 UTC");
        assert_eq!(parsed.format_rfc3339(), "2024-03-01T20:05:00Z");

        let rfc = parse_serp_date("2024-03-01T10:00:00+02:00");
        assert_eq!(rfc.format_rfc3339(), "2024-03-01T08:00:00Z");
    }

    #[test]
    fn google_news_twelve_hour_clock_maps_midnight_and_noon() {
        let midnight = parse_serp_date("12/31/2023, 12:30 AM, +0000 UTC");
        assert_eq!(midnight.format_rfc3339(), "2023-12-31T00:30:00Z");

        let noon = parse_serp_date("12/31/2023, 12:30 PM, +0000 UTC");
        assert_eq!(noon.format_rfc3339(), "2023-12-31T12:30:00Z");

        assert!(parse_google_news_date("13/45/2023, 99:00 XM").is_none());
    }

    #[test]
    fn converts_results_with_either_source_shape() {
        let response: SerpApiResponse = serde_json::from_value(json!({
            "news_results": [
                {
                    "position": 1,
                    "title": "Crypto rally continues",
                    "link": "https://news.test/1",
                    "source": {"name": "CoinDesk", "icon": "https://icon"},
                    "date": "03/01/2024, 08:00 AM, +0000 UTC"
                },
                {
                    "title": "Recession fears deepen",
                    "link": "https://news.test/2",
                    "source": "Bloomberg",
                    "date": "yesterday",
                    "snippet": "Analysts flag crisis risk"
                }
            ]
        }))
        .expect("payload parses");

        let items = response.news_items();

        assert_eq!(items[0].source.name, "CoinDesk");
        assert_eq!(items[0].sentiment_score, 55);
        assert_eq!(items[0].summary, NO_DESCRIPTION);
        assert!(items[0].id.starts_with("serp_httpsnewstest1"));
        assert_eq!(items[1].source.name, "Bloomberg");
        assert_eq!(items[1].sentiment_score, 40);
    }
}
