use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::adapters::channel::ProxyChannel;
use crate::adapters::error::VendorApiError;
use crate::circuit_breaker::CircuitBreaker;
use crate::http_client::HttpClient;
use crate::sentiment::SentimentLabel;
use crate::vendor_policy::VendorPolicy;
use crate::{Symbol, UtcDateTime, VendorId};

/// Body of `POST /api/ai/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Body of `POST /api/ai/sentiment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentRequest {
    pub ticker: String,
}

/// Which engine produced a chat reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    DeepSeek,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub source: ReplySource,
    pub timestamp: UtcDateTime,
}

/// Templated sentiment analysis for one ticker.
///
/// Unknown tickers still produce a report: `found` is false, the label is
/// neutral and `summary` carries the "ticker not found" text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentReport {
    pub ticker: String,
    pub found: bool,
    pub sentiment: SentimentLabel,
    pub score: u8,
    pub summary: String,
    #[serde(default)]
    pub drivers: Vec<String>,
    pub timestamp: UtcDateTime,
}

/// Client for the proxy's AI endpoints (`/api/ai`).
#[derive(Clone)]
pub struct SentimentClient {
    channel: ProxyChannel,
}

impl SentimentClient {
    pub fn new(base_url: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_policy(base_url, http_client, &VendorPolicy::deepseek_default())
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

    pub async fn analyze(&self, ticker: &Symbol) -> Result<SentimentReport, VendorApiError> {
        let body = self
            .channel
            .post_json("/sentiment", &json!({ "ticker": ticker.as_str() }))
            .await?;
        serde_json::from_value(body).map_err(|e| VendorApiError::payload(VendorId::DeepSeek, e))
    }

    pub async fn chat(&self, message: &str) -> Result<ChatReply, VendorApiError> {
        if message.trim().is_empty() {
            return Err(VendorApiError::invalid_request(
                VendorId::DeepSeek,
                "chat message must not be empty",
            ));
        }

        let body = self
            .channel
            .post_json("/chat", &json!({ "message": message }))
            .await?;
        serde_json::from_value(body).map_err(|e| VendorApiError::payload(VendorId::DeepSeek, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_source_uses_lowercase_wire_names() {
        let reply: ChatReply = serde_json::from_value(serde_json::json!({
            "response": "hi",
            "source": "deepseek",
            "timestamp": "2024-03-01T00:00:00Z"
        }))
        .expect("reply parses");

        assert_eq!(reply.source, ReplySource::DeepSeek);
        assert_eq!(
            serde_json::to_value(ReplySource::Fallback).expect("serializes"),
            serde_json::json!("fallback")
        );
    }

    #[test]
    fn report_labels_serialize_as_display_text() {
        let report = SentimentReport {
            ticker: "AAPL".into(),
            found: true,
            sentiment: SentimentLabel::CautiouslyOptimistic,
            score: 64,
            summary: "steady".into(),
            drivers: Vec::new(),
            timestamp: UtcDateTime::now(),
        };

        let value = serde_json::to_value(&report).expect("serializes");
        assert_eq!(value["sentiment"], "Cautiously Optimistic");
        assert_eq!(value["found"], true);
    }
}
