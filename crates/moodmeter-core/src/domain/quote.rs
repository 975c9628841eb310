use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime};

/// Point-in-time price snapshot for one symbol.
///
/// Snapshots are replaced wholesale on every refetch; there is no merge step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub symbol: Symbol,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub market_cap: Option<f64>,
    pub last_updated: UtcDateTime,
}

impl QuoteSnapshot {
    /// Builds a snapshot from a price and a percentage move, deriving the absolute change.
    pub fn from_percent_change(
        symbol: Symbol,
        price: f64,
        change_percent: f64,
        volume: f64,
        market_cap: Option<f64>,
        last_updated: UtcDateTime,
    ) -> Self {
        Self {
            symbol,
            price,
            change: price * change_percent / 100.0,
            change_percent,
            volume,
            market_cap,
            last_updated,
        }
    }
}

/// Instrument family shown by the screener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Stock,
    Crypto,
}

/// Renderable ticker row: a quote plus display and social metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub name: String,
    #[serde(rename = "type")]
    pub asset_kind: AssetKind,
    pub exchange: String,
    #[serde(flatten)]
    pub quote: QuoteSnapshot,
    pub sentiment_score: f64,
    pub trending_score: f64,
}

impl Ticker {
    pub fn symbol(&self) -> &Symbol {
        &self.quote.symbol
    }
}
