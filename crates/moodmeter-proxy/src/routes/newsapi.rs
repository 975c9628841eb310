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

const API_KEY_ENV: &str = "NEWSAPI_KEY";
const DEFAULT_COUNTRY: &str = "us";
const DEFAULT_CATEGORY: &str = "business";
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_SORT_BY: &str = "publishedAt";

pub fn router() -> Router<Arc<ProxyState>> {
    Router::new()
        .route("/api/proxy/newsapi/top-headlines", get(top_headlines))
        .route("/api/proxy/newsapi/everything", get(everything))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopHeadlinesQuery {
    pub country: Option<String>,
    pub category: Option<String>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EverythingQuery {
    pub q: Option<String>,
    pub page_size: Option<u32>,
    pub sort_by: Option<String>,
}

fn request(state: &ProxyState, path: &str) -> HttpRequest {
    HttpRequest::get(format!(
        "{}{}",
        state.config.newsapi_base_url.trim_end_matches('/'),
        path
    ))
    .with_header("accept", "application/json")
}

fn with_key(request: HttpRequest, key: &Secret) -> HttpRequest {
    request.with_auth(&HttpAuth::QueryParam {
        name: String::from("apiKey"),
        value: key.expose().to_owned(),
    })
}

async fn top_headlines(
    State(state): State<Arc<ProxyState>>,
    query: Result<Query<TopHeadlinesQuery>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let query = parsed_query(query)?;
    let key = require_secret(&state.config.newsapi_key, API_KEY_ENV)?;
    let country = non_empty(query.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_owned());
    let category = non_empty(query.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_owned());

    let request = request(&state, "/top-headlines")
        .with_query("country", &country)
        .with_query("category", &category)
        .with_query("pageSize", query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).to_string());

    state
        .upstream
        .fetch_json(with_key(request, key), key)
        .await
        .map(Json)
        .map_err(|failure| ProxyError::upstream("Failed to fetch news headlines", failure))
}

async fn everything(
    State(state): State<Arc<ProxyState>>,
    query: Result<Query<EverythingQuery>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let query = parsed_query(query)?;
    let q = non_empty(query.q)
        .ok_or_else(|| ProxyError::bad_request("Query parameter 'q' is required"))?;
    let key = require_secret(&state.config.newsapi_key, API_KEY_ENV)?;
    let sort_by = non_empty(query.sort_by).unwrap_or_else(|| DEFAULT_SORT_BY.to_owned());

    let request = request(&state, "/everything")
        .with_query("q", &q)
        .with_query("pageSize", query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).to_string())
        .with_query("sortBy", &sort_by);

    state
        .upstream
        .fetch_json(with_key(request, key), key)
        .await
        .map(Json)
        .map_err(|failure| ProxyError::upstream("Failed to search news", failure))
}
