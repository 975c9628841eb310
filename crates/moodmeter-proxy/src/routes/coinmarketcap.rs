use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use moodmeter_core::{HttpAuth, HttpRequest};
use serde::Deserialize;
use serde_json::Value;

use super::{non_empty, parsed_query};
use crate::config::Secret;
use crate::{require_secret, ProxyError, ProxyState};

const API_KEY_ENV: &str = "COINMARKETCAP_API_KEY";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";
const DEFAULT_SYMBOLS: &str = "BTC,ETH,BNB";
const DEFAULT_CONVERT: &str = "USD";
const DEFAULT_LISTING_LIMIT: u32 = 100;

pub fn router() -> Router<Arc<ProxyState>> {
    Router::new()
        .route("/api/proxy/coinmarketcap/quotes", get(quotes))
        .route("/api/proxy/coinmarketcap/listings", get(listings))
        .route("/api/proxy/coinmarketcap/global-metrics", get(global_metrics))
}

#[derive(Debug, Default, Deserialize)]
pub struct QuotesQuery {
    pub symbol: Option<String>,
    /// Accepted alias of `symbol`.
    pub symbols: Option<String>,
    pub convert: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingsQuery {
    pub start: Option<u32>,
    pub limit: Option<u32>,
    pub convert: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GlobalMetricsQuery {
    pub convert: Option<String>,
}

fn request(state: &ProxyState, path: &str, key: &Secret) -> HttpRequest {
    HttpRequest::get(format!(
        "{}{}",
        state.config.coinmarketcap_base_url.trim_end_matches('/'),
        path
    ))
    .with_header("accept", "application/json")
    .with_auth(&HttpAuth::Header {
        name: API_KEY_HEADER.to_owned(),
        value: key.expose().to_owned(),
    })
}

async fn quotes(
    State(state): State<Arc<ProxyState>>,
    query: Result<Query<QuotesQuery>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let query = parsed_query(query)?;
    let key = require_secret(&state.config.coinmarketcap_api_key, API_KEY_ENV)?;
    let symbols = non_empty(query.symbol)
        .or_else(|| non_empty(query.symbols))
        .unwrap_or_else(|| DEFAULT_SYMBOLS.to_owned());
    let convert = non_empty(query.convert).unwrap_or_else(|| DEFAULT_CONVERT.to_owned());

    let request = request(&state, "/cryptocurrency/quotes/latest", key)
        .with_query("symbol", &symbols)
        .with_query("convert", &convert);

    state
        .upstream
        .fetch_json(request, key)
        .await
        .map(Json)
        .map_err(|failure| ProxyError::upstream("Failed to fetch cryptocurrency data", failure))
}

async fn listings(
    State(state): State<Arc<ProxyState>>,
    query: Result<Query<ListingsQuery>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let query = parsed_query(query)?;
    let key = require_secret(&state.config.coinmarketcap_api_key, API_KEY_ENV)?;
    let convert = non_empty(query.convert).unwrap_or_else(|| DEFAULT_CONVERT.to_owned());

    let mut request = request(&state, "/cryptocurrency/listings/latest", key)
        .with_query("start", query.start.unwrap_or(1).max(1).to_string())
        .with_query("limit", query.limit.unwrap_or(DEFAULT_LISTING_LIMIT).to_string())
        .with_query("convert", &convert);
    if let Some(sort) = non_empty(query.sort) {
        request = request.with_query("sort", &sort);
    }

    state
        .upstream
        .fetch_json(request, key)
        .await
        .map(Json)
        .map_err(|failure| ProxyError::upstream("Failed to fetch cryptocurrency listings", failure))
}

async fn global_metrics(
    State(state): State<Arc<ProxyState>>,
    query: Result<Query<GlobalMetricsQuery>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let query = parsed_query(query)?;
    let key = require_secret(&state.config.coinmarketcap_api_key, API_KEY_ENV)?;
    let convert = non_empty(query.convert).unwrap_or_else(|| DEFAULT_CONVERT.to_owned());

    let request = request(&state, "/global-metrics/quotes/latest", key)
        .with_query("convert", &convert);

    state
        .upstream
        .fetch_json(request, key)
        .await
        .map(Json)
        .map_err(|failure| ProxyError::upstream("Failed to fetch global metrics", failure))
}
