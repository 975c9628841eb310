//! # MoodMeter Proxy
//!
//! axum server that fronts the market-data and news vendors for the
//! MoodMeter client. Vendor API keys live only here; the client calls
//! `/api/proxy/*` and `/api/ai/*` and receives vendor JSON verbatim.
//!
//! | Route | Method | Upstream |
//! |-------|--------|----------|
//! | `/api/proxy/coinmarketcap/quotes` | GET | CoinMarketCap quotes/latest |
//! | `/api/proxy/coinmarketcap/listings` | GET | CoinMarketCap listings/latest |
//! | `/api/proxy/coinmarketcap/global-metrics` | GET | CoinMarketCap global-metrics |
//! | `/api/proxy/newsapi/top-headlines` | GET | NewsAPI top-headlines |
//! | `/api/proxy/newsapi/everything` | GET | NewsAPI everything |
//! | `/api/proxy/serpapi/search` | GET | SerpAPI Google News |
//! | `/api/ai/chat` | POST | DeepSeek, else rule-based responder |
//! | `/api/ai/sentiment` | POST | rule-based sentiment templates |
//! | `/api/health` | GET | none |

pub mod config;
pub mod error;
pub mod responder;
pub mod routes;
pub mod telemetry;
pub mod upstream;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::Router;
use moodmeter_core::{HttpClient, ReqwestHttpClient};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{ProxyConfig, Secret};
pub use error::{ProxyError, StartupError};
pub use responder::{Intent, Responder};
pub use upstream::{UpstreamClient, UpstreamFailure};

/// Shared state handed to every route.
pub struct ProxyState {
    pub config: ProxyConfig,
    pub upstream: UpstreamClient,
    pub responder: Responder,
}

impl ProxyState {
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(
        config: ProxyConfig,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, ProxyError> {
        config.validate()?;
        let responder = Responder::new().map_err(|e| ProxyError::Internal(e.to_string()))?;

        Ok(Self {
            upstream: UpstreamClient::new(http, config.upstream_timeout_ms),
            config,
            responder,
        })
    }
}

/// Looks up a vendor key, failing the request when it is not configured.
pub(crate) fn require_secret<'a>(
    secret: &'a Option<Secret>,
    env_var: &'static str,
) -> Result<&'a Secret, ProxyError> {
    secret
        .as_ref()
        .filter(|secret| !secret.expose().is_empty())
        .ok_or(ProxyError::MissingSecret { env_var })
}

pub fn build_router(state: Arc<ProxyState>) -> Router {
    let origins = state.config.cors_origins().unwrap_or_default();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::coinmarketcap::router())
        .merge(routes::newsapi::router())
        .merge(routes::serpapi::router())
        .merge(routes::ai::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
