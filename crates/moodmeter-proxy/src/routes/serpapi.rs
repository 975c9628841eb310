use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use moodmeter_core::{HttpAuth, HttpRequest};
use serde::Deserialize;
use serde_json::Value;

use super::{non_empty, parsed_query};
use crate::{require_secret, ProxyError, ProxyState};

const API_KEY_ENV: &str = "SERPAPI_KEY";
const ENGINE: &str = "google_news";
const DEFAULT_NUM: u32 = 20;
const DEFAULT_COUNTRY: &str = "us";
const DEFAULT_LANGUAGE: &str = "en";

pub fn router() -> Router<Arc<ProxyState>> {
    Router::new().route("/api/proxy/serpapi/search", get(search))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub num: Option<u32>,
    pub gl: Option<String>,
    pub hl: Option<String>,
}

async fn search(
    State(state): State<Arc<ProxyState>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let query = parsed_query(query)?;
    let q = non_empty(query.q)
        .ok_or_else(|| ProxyError::bad_request("Query parameter 'q' is required"))?;
    let key = require_secret(&state.config.serpapi_key, API_KEY_ENV)?;

    let request = HttpRequest::get(format!(
        "{}/search",
        state.config.serpapi_base_url.trim_end_matches('/')
    ))
    .with_header("accept", "application/json")
    .with_query("engine", ENGINE)
    .with_query("q", &q)
    .with_query("gl", non_empty(query.gl).unwrap_or_else(|| DEFAULT_COUNTRY.to_owned()))
    .with_query("hl", non_empty(query.hl).unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()))
    .with_query("num", query.num.unwrap_or(DEFAULT_NUM).to_string())
    .with_auth(&HttpAuth::QueryParam {
        name: String::from("api_key"),
        value: key.expose().to_owned(),
    });

    state
        .upstream
        .fetch_json(request, key)
        .await
        .map(Json)
        .map_err(|failure| {
            ProxyError::upstream_with_details("Failed to fetch news from SerpAPI", failure)
        })
}
