use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::VendorId;

/// Per-vendor request budget and breaker tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorPolicy {
    pub vendor: VendorId,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub circuit: CircuitBreakerConfig,
}

impl VendorPolicy {
    /// Basic plan: 333 calls per minute.
    pub fn coinmarketcap_default() -> Self {
        Self {
            vendor: VendorId::CoinMarketCap,
            quota_window: Duration::from_secs(60),
            quota_limit: 333,
            circuit: CircuitBreakerConfig::default(),
        }
    }

    /// Developer plan: 1000 calls per day.
    pub fn newsapi_default() -> Self {
        Self {
            vendor: VendorId::NewsApi,
            quota_window: Duration::from_secs(86_400),
            quota_limit: 1_000,
            circuit: CircuitBreakerConfig::default(),
        }
    }

    /// Free plan: 100 searches per hour.
    pub fn serpapi_default() -> Self {
        Self {
            vendor: VendorId::SerpApi,
            quota_window: Duration::from_secs(3_600),
            quota_limit: 100,
            circuit: CircuitBreakerConfig::default(),
        }
    }

    pub fn deepseek_default() -> Self {
        Self {
            vendor: VendorId::DeepSeek,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            circuit: CircuitBreakerConfig::default(),
        }
    }

    pub fn default_for(vendor: VendorId) -> Self {
        match vendor {
            VendorId::CoinMarketCap => Self::coinmarketcap_default(),
            VendorId::NewsApi => Self::newsapi_default(),
            VendorId::SerpApi => Self::serpapi_default(),
            VendorId::DeepSeek => Self::deepseek_default(),
        }
    }

    pub fn with_quota(mut self, quota_window: Duration, quota_limit: u32) -> Self {
        self.quota_window = quota_window;
        self.quota_limit = quota_limit;
        self
    }

    pub fn with_circuit(mut self, circuit: CircuitBreakerConfig) -> Self {
        self.circuit = circuit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_quotas_match_vendor_plans() {
        let cmc = VendorPolicy::coinmarketcap_default();
        assert_eq!(cmc.quota_window, Duration::from_secs(60));
        assert_eq!(cmc.quota_limit, 333);

        let news = VendorPolicy::newsapi_default();
        assert_eq!(news.quota_window, Duration::from_secs(86_400));
        assert_eq!(news.quota_limit, 1_000);

        let serp = VendorPolicy::default_for(VendorId::SerpApi);
        assert_eq!(serp.quota_window, Duration::from_secs(3_600));
        assert_eq!(serp.quota_limit, 100);
    }

    #[test]
    fn every_vendor_shares_the_breaker_defaults() {
        for vendor in VendorId::ALL {
            let policy = VendorPolicy::default_for(vendor);
            assert_eq!(policy.vendor, vendor);
            assert_eq!(policy.circuit.failure_threshold, 2);
        }
    }
}
