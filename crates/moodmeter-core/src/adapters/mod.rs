//! Vendor adapters.
//!
//! Every adapter talks to the proxy server rather than the vendor directly and
//! shares the [`ProxyChannel`] call pipeline, so circuit breaking, throttling
//! and envelope validation behave identically across vendors.

pub mod ai;
pub mod channel;
pub mod coinmarketcap;
pub mod error;
pub mod newsapi;
pub mod serpapi;

pub use ai::{
    ChatReply, ChatRequest, ReplySource, SentimentClient, SentimentReport, SentimentRequest,
};
pub use channel::ProxyChannel;
pub use coinmarketcap::{
    convert_cmc_to_ticker, CmcCryptocurrency, CmcGlobalMetrics, CmcGlobalMetricsResponse,
    CmcListingsResponse, CmcQuote, CmcQuotesResponse, CmcStatus, CoinMarketCapClient, ListingSort,
};
pub use error::{VendorApiError, VendorErrorKind};
pub use newsapi::{
    convert_newsapi_article, NewsApiArticle, NewsApiClient, NewsApiResponse, NewsCategory,
    NewsSortBy,
};
pub use serpapi::{
    convert_serp_article, parse_serp_date, SerpApiClient, SerpApiResponse, SerpNewsArticle,
};
