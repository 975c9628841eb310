//! # MoodMeter Core
//!
//! Client-side data layer for the MoodMeter market-sentiment dashboard.
//!
//! ## Overview
//!
//! - **Domain models** for quotes, tickers and news items
//! - **Vendor adapters** for CoinMarketCap, NewsAPI, SerpAPI and the AI endpoints,
//!   all routed through the MoodMeter proxy
//! - **Circuit breaker** and **rate limiters** guarding every adapter
//! - **Fallback provider** with a last-known-good cache and mock generators
//! - **Data hooks** that poll, cache and degrade to fallback data without failing
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Proxy-backed vendor clients and payload types |
//! | [`circuit_breaker`] | Two-state breaker with rate-limit escalation |
//! | [`config`] | Proxy endpoint configuration |
//! | [`domain`] | Domain models (Ticker, QuoteSnapshot, NewsItem) |
//! | [`error`] | Validation errors |
//! | [`fallback`] | Mock data and fallback cache |
//! | [`hooks`] | Polling data hooks |
//! | [`http_client`] | HTTP client abstraction |
//! | [`sentiment`] | Keyword sentiment heuristic and market mood |
//! | [`throttling`] | Client-side rate limiting |
//! | [`vendor`] | Vendor identifiers |
//! | [`vendor_policy`] | Per-vendor quotas and breaker settings |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use moodmeter_core::{DataHooks, HookOptions, ProxyEndpoints, ReqwestHttpClient, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hooks = DataHooks::new(&ProxyEndpoints::from_env(), Arc::new(ReqwestHttpClient::new()));
//!     let quotes = hooks.use_coin_market_cap(Symbol::parse_list("BTC,ETH")?);
//!
//!     quotes.refetch().await;
//!     let state = quotes.snapshot();
//!     if let Some(error) = state.error {
//!         eprintln!("{error}");
//!     }
//!     for ticker in state.data.unwrap_or_default() {
//!         println!("{} {:.2} ({:+.2}%)", ticker.symbol(), ticker.quote.price, ticker.quote.change_percent);
//!     }
//!
//!     let _polling = quotes.mount(HookOptions::polling(std::time::Duration::from_secs(60)));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │  DataHook       │────▶│ FallbackProvider │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Vendor Adapter  │────▶│ Circuit Breaker  │
//! │ (ProxyChannel)  │     │ + Rate Limiter   │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ HTTP Client     │──▶ moodmeter-proxy ──▶ vendor APIs
//! └─────────────────┘
//! ```

pub mod adapters;
pub mod circuit_breaker;
pub mod config;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod hooks;
pub mod http_client;
pub mod sentiment;
pub mod throttling;
pub mod vendor;
pub mod vendor_policy;

pub use adapters::{
    ChatReply, CoinMarketCapClient, NewsApiClient, NewsCategory, ReplySource, SentimentClient,
    SentimentReport, SerpApiClient, VendorApiError, VendorErrorKind,
};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState};
pub use config::ProxyEndpoints;
pub use domain::{AssetKind, NewsItem, NewsSource, QuoteSnapshot, Symbol, Ticker, UtcDateTime};
pub use error::ValidationError;
pub use fallback::FallbackProvider;
pub use hooks::{DataHook, DataHooks, HookOptions, HookState, MountedHook};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use sentiment::{generate_sentiment_score, market_mood, MarketMood, SentimentLabel};
pub use throttling::RateLimiter;
pub use vendor::VendorId;
pub use vendor_policy::VendorPolicy;
