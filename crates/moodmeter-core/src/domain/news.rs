use serde::{Deserialize, Serialize};

/// Where and when a news item was published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSource {
    pub name: String,
    pub published_at: String,
}

/// Normalized headline with a keyword-derived sentiment score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub headline: String,
    pub summary: String,
    pub sentiment_score: u8,
    pub source: NewsSource,
    pub original_url: String,
}

pub(crate) const NO_DESCRIPTION: &str = "No description available";

/// Stable id: alphanumerics of `parts` concatenated, truncated to 20 chars.
pub(crate) fn derive_news_id(parts: &[&str]) -> String {
    let id: String = parts
        .iter()
        .flat_map(|part| part.chars())
        .filter(char::is_ascii_alphanumeric)
        .take(20)
        .collect();

    if id.is_empty() {
        format!("news_{:016x}", fastrand::u64(..))
    } else {
        id
    }
}
