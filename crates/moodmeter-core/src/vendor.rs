use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Upstream vendors reachable through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorId {
    CoinMarketCap,
    NewsApi,
    SerpApi,
    DeepSeek,
}

impl VendorId {
    pub const ALL: [Self; 4] = [Self::CoinMarketCap, Self::NewsApi, Self::SerpApi, Self::DeepSeek];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CoinMarketCap => "coinmarketcap",
            Self::NewsApi => "newsapi",
            Self::SerpApi => "serpapi",
            Self::DeepSeek => "deepseek",
        }
    }
}

impl Display for VendorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VendorId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "coinmarketcap" | "cmc" => Ok(Self::CoinMarketCap),
            "newsapi" => Ok(Self::NewsApi),
            "serpapi" => Ok(Self::SerpApi),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(ValidationError::InvalidVendor {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vendor_names_case_insensitively() {
        assert_eq!("CMC".parse::<VendorId>(), Ok(VendorId::CoinMarketCap));
        assert_eq!(" NewsAPI ".parse::<VendorId>(), Ok(VendorId::NewsApi));
        assert!(matches!(
            "finnhub".parse::<VendorId>(),
            Err(ValidationError::InvalidVendor { .. })
        ));
    }

    #[test]
    fn display_matches_serde_name() {
        for vendor in VendorId::ALL {
            let json = serde_json::to_string(&vendor).expect("serializes");
            assert_eq!(json, format!("\"{vendor}\""));
        }
    }
}
