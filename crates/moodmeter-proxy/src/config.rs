//! Server configuration.
//!
//! Every option can be given as a flag or through the environment (a `.env`
//! file is loaded first by the binary). Vendor keys are optional at start-up:
//! a route whose key is missing answers 500 without calling the vendor.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORT` | `3001` | Listen port |
//! | `HOST` | `0.0.0.0` | Listen address |
//! | `COINMARKETCAP_API_KEY` | none | CoinMarketCap Pro key |
//! | `NEWSAPI_KEY` | none | NewsAPI key |
//! | `SERPAPI_KEY` | none | SerpAPI key |
//! | `DEEPSEEK_API_KEY` | none | DeepSeek key; without it chat uses the rule-based responder |
//! | `ALLOWED_ORIGINS` | `http://localhost:5173,http://localhost:3000` | CORS origins |
//! | `UPSTREAM_TIMEOUT_MS` | `10000` | Per-request upstream timeout |

use std::fmt::{Debug, Formatter};
use std::net::SocketAddr;

use axum::http::HeaderValue;
use clap::Parser;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];
pub const DEFAULT_COINMARKETCAP_URL: &str = "https://pro-api.coinmarketcap.com/v1";
pub const DEFAULT_NEWSAPI_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_SERPAPI_URL: &str = "https://serpapi.com";
pub const DEFAULT_DEEPSEEK_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;

/// API key that never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid listen address '{value}'")]
    InvalidListenAddress { value: String },

    #[error("invalid CORS origin '{value}'")]
    InvalidOrigin { value: String },

    #[error("{name} must be an http(s) URL, got '{value}'")]
    InvalidUpstreamUrl { name: &'static str, value: String },
}

/// MoodMeter proxy server: injects vendor API keys for the dashboard client.
#[derive(Debug, Clone, Parser)]
#[command(name = "moodmeter-proxy", author, version, about)]
pub struct ProxyConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, env = "COINMARKETCAP_API_KEY", hide_env_values = true)]
    pub coinmarketcap_api_key: Option<Secret>,

    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub newsapi_key: Option<Secret>,

    #[arg(long, env = "SERPAPI_KEY", hide_env_values = true)]
    pub serpapi_key: Option<Secret>,

    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub deepseek_api_key: Option<Secret>,

    /// Comma separated list of origins allowed by CORS.
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_ALLOWED_ORIGINS.map(String::from)
    )]
    pub allowed_origins: Vec<String>,

    #[arg(long, env = "COINMARKETCAP_BASE_URL", default_value = DEFAULT_COINMARKETCAP_URL)]
    pub coinmarketcap_base_url: String,

    #[arg(long, env = "NEWSAPI_BASE_URL", default_value = DEFAULT_NEWSAPI_URL)]
    pub newsapi_base_url: String,

    #[arg(long, env = "SERPAPI_BASE_URL", default_value = DEFAULT_SERPAPI_URL)]
    pub serpapi_base_url: String,

    #[arg(long, env = "DEEPSEEK_BASE_URL", default_value = DEFAULT_DEEPSEEK_URL)]
    pub deepseek_base_url: String,

    /// Timeout for each upstream request, in milliseconds.
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value_t = DEFAULT_UPSTREAM_TIMEOUT_MS)]
    pub upstream_timeout_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_owned(),
            coinmarketcap_api_key: None,
            newsapi_key: None,
            serpapi_key: None,
            deepseek_api_key: None,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.map(String::from).to_vec(),
            coinmarketcap_base_url: DEFAULT_COINMARKETCAP_URL.to_owned(),
            newsapi_base_url: DEFAULT_NEWSAPI_URL.to_owned(),
            serpapi_base_url: DEFAULT_SERPAPI_URL.to_owned(),
            deepseek_base_url: DEFAULT_DEEPSEEK_URL.to_owned(),
            upstream_timeout_ms: DEFAULT_UPSTREAM_TIMEOUT_MS,
        }
    }
}

impl ProxyConfig {
    /// Points every vendor at one base URL, for local stubs.
    pub fn with_upstream_base(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.coinmarketcap_base_url = base.to_owned();
        self.newsapi_base_url = base.to_owned();
        self.serpapi_base_url = base.to_owned();
        self.deepseek_base_url = base.to_owned();
        self
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddress {
                value: format!("{}:{}", self.host, self.port),
            })
    }

    pub fn cors_origins(&self) -> Result<Vec<HeaderValue>, ConfigError> {
        self.allowed_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidOrigin {
                    value: origin.to_owned(),
                })
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        self.cors_origins()?;

        let upstreams = [
            ("COINMARKETCAP_BASE_URL", &self.coinmarketcap_base_url),
            ("NEWSAPI_BASE_URL", &self.newsapi_base_url),
            ("SERPAPI_BASE_URL", &self.serpapi_base_url),
            ("DEEPSEEK_BASE_URL", &self.deepseek_base_url),
        ];
        for (name, value) in upstreams {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::InvalidUpstreamUrl {
                    name,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Vendors whose keys are configured, for the start-up log line.
    pub fn configured_vendors(&self) -> Vec<&'static str> {
        [
            ("coinmarketcap", self.coinmarketcap_api_key.is_some()),
            ("newsapi", self.newsapi_key.is_some()),
            ("serpapi", self.serpapi_key.is_some()),
            ("deepseek", self.deepseek_api_key.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_with_defaults() {
        let config = ProxyConfig::try_parse_from([
            "moodmeter-proxy",
            "--port",
            "8080",
            "--newsapi-key",
            "n-key",
            "--allowed-origins",
            "http://a.test,http://b.test",
        ])
        .expect("flags parse");

        assert_eq!(config.port, 8080);
        assert_eq!(config.newsapi_key, Some(Secret::new("n-key")));
        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.coinmarketcap_base_url, DEFAULT_COINMARKETCAP_URL);
        assert_eq!(config.configured_vendors(), vec!["newsapi"]);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = ProxyConfig {
            serpapi_key: Some(Secret::new("super-secret-value")),
            ..ProxyConfig::default()
        };

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("Secret(***)"));
    }

    #[test]
    fn validate_rejects_bad_upstreams_and_origins() {
        let bad_url = ProxyConfig {
            newsapi_base_url: String::from("ftp://news"),
            ..ProxyConfig::default()
        };
        assert!(matches!(
            bad_url.validate(),
            Err(ConfigError::InvalidUpstreamUrl { name: "NEWSAPI_BASE_URL", .. })
        ));

        let bad_origin = ProxyConfig {
            allowed_origins: vec![
                String::from("http://ok.test"),
                String::from("http://bad\u{1}.test"),
            ],
            ..ProxyConfig::default()
        };
        assert!(matches!(
            bad_origin.cors_origins(),
            Err(ConfigError::InvalidOrigin { .. })
        ));

        let defaults = ProxyConfig::default();
        assert_eq!(defaults.validate(), Ok(()));
        assert_eq!(defaults.listen_addr().map(|a| a.port()), Ok(3001));
    }
}
