use std::env;

/// Environment variable overriding the proxy base URL.
pub const PROXY_URL_ENV: &str = "MOODMETER_PROXY_URL";

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3001";

/// Where client adapters find the proxy routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoints {
    base_url: String,
}

impl Default for ProxyEndpoints {
    fn default() -> Self {
        Self::new(DEFAULT_PROXY_URL)
    }
}

impl ProxyEndpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Reads [`PROXY_URL_ENV`], falling back to [`DEFAULT_PROXY_URL`].
    pub fn from_env() -> Self {
        match env::var(PROXY_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::new(value.trim()),
            _ => Self::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn coinmarketcap(&self) -> String {
        format!("{}/api/proxy/coinmarketcap", self.base_url)
    }

    pub fn newsapi(&self) -> String {
        format!("{}/api/proxy/newsapi", self.base_url)
    }

    pub fn serpapi(&self) -> String {
        format!("{}/api/proxy/serpapi", self.base_url)
    }

    pub fn ai(&self) -> String {
        format!("{}/api/ai", self.base_url)
    }

    pub fn health(&self) -> String {
        format!("{}/api/health", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_route_prefixes_without_double_slashes() {
        let endpoints = ProxyEndpoints::new("http://proxy.test:8080/");

        assert_eq!(endpoints.base_url(), "http://proxy.test:8080");
        assert_eq!(endpoints.coinmarketcap(), "http://proxy.test:8080/api/proxy/coinmarketcap");
        assert_eq!(endpoints.ai(), "http://proxy.test:8080/api/ai");
    }

    #[test]
    fn defaults_to_local_proxy() {
        assert_eq!(ProxyEndpoints::default().newsapi(), "http://localhost:3001/api/proxy/newsapi");
    }
}
