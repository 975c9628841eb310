use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use moodmeter_core::{ChatReply, HttpAuth, HttpRequest, ReplySource, SentimentReport, UtcDateTime};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Secret;
use crate::responder::sentiment_report;
use crate::upstream::UpstreamFailure;
use crate::{ProxyError, ProxyState};

const DEEPSEEK_MODEL: &str = "deepseek-chat";
const MAX_TOKENS: u32 = 500;
const SYSTEM_PROMPT: &str = "You are MoodMeter, a concise assistant for retail traders. \
Discuss market sentiment, stocks and crypto. Do not give personalised financial advice.";

pub fn router() -> Router<Arc<ProxyState>> {
    Router::new()
        .route("/api/ai/chat", post(chat))
        .route("/api/ai/sentiment", post(sentiment))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SentimentBody {
    #[serde(default)]
    pub ticker: Option<String>,
}

fn required(value: Option<String>, message: &str) -> Result<String, ProxyError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProxyError::bad_request(message))
}

async fn chat(
    State(state): State<Arc<ProxyState>>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ProxyError> {
    let Json(body) = body.map_err(|rejection| ProxyError::bad_request(rejection.body_text()))?;
    let message = required(body.message, "Message is required")?;

    if let Some(key) = state
        .config
        .deepseek_api_key
        .as_ref()
        .filter(|key| !key.expose().is_empty())
    {
        match deepseek_completion(&state, key, &message).await {
            Ok(response) => {
                return Ok(Json(ChatReply {
                    response,
                    source: ReplySource::DeepSeek,
                    timestamp: UtcDateTime::now(),
                }))
            }
            Err(failure) => {
                tracing::warn!(
                    error = %failure,
                    "DeepSeek unavailable; using rule-based responder"
                );
            }
        }
    }

    Ok(Json(ChatReply {
        response: state.responder.reply(&message),
        source: ReplySource::Fallback,
        timestamp: UtcDateTime::now(),
    }))
}

async fn deepseek_completion(
    state: &ProxyState,
    key: &Secret,
    message: &str,
) -> Result<String, UpstreamFailure> {
    let request = HttpRequest::post(format!(
        "{}/chat/completions",
        state.config.deepseek_base_url.trim_end_matches('/')
    ))
    .with_header("accept", "application/json")
    .with_json(&json!({
        "model": DEEPSEEK_MODEL,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": message },
        ],
        "max_tokens": MAX_TOKENS,
        "temperature": 0.7,
    }))
    .with_auth(&HttpAuth::BearerToken(key.expose().to_owned()));

    let body = state.upstream.fetch_json(request, key).await?;
    completion_text(&body).ok_or_else(|| UpstreamFailure::InvalidJson {
        status: 200,
        message: String::from("missing choices[0].message.content"),
    })
}

fn completion_text(body: &Value) -> Option<String> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

async fn sentiment(
    body: Result<Json<SentimentBody>, JsonRejection>,
) -> Result<Json<SentimentReport>, ProxyError> {
    let Json(body) = body.map_err(|rejection| ProxyError::bad_request(rejection.body_text()))?;
    let ticker = required(body.ticker, "Ticker is required")?;
    Ok(Json(sentiment_report(&ticker)))
}
