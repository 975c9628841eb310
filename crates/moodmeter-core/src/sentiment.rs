//! Keyword sentiment heuristic for headlines.
//!
//! This is not a model: the score starts at [`NEUTRAL_SCORE`], moves by
//! [`KEYWORD_WEIGHT`] for every lexicon keyword contained in the text, and is
//! clamped to `0..=100`. Matching is plain substring containment on the
//! lower-cased text, so `"up"` also matches `"update"`.
//!
//! [`market_mood`] is the market-wide counterpart: it buckets the daily move
//! of each tracked stock and scales the average bucket around the same
//! neutral midpoint.

use serde::{Deserialize, Serialize};

/// Score for text with no keyword hits.
pub const NEUTRAL_SCORE: u8 = 50;

/// Points added or removed per keyword hit.
pub const KEYWORD_WEIGHT: i32 = 5;

/// Positive and negative keyword lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexicon {
    pub positive: &'static [&'static str],
    pub negative: &'static [&'static str],
}

const BASE_POSITIVE: &[&str] = &[
    "gains", "growth", "surge", "rise", "boost", "positive", "success", "profit", "strong", "up",
];
const BASE_NEGATIVE: &[&str] = &[
    "loss", "decline", "fall", "drop", "crash", "negative", "fail", "down", "weak", "concern",
];
const EXTENDED_POSITIVE: &[&str] = &[
    "gains",
    "growth",
    "surge",
    "rise",
    "boost",
    "positive",
    "success",
    "profit",
    "strong",
    "up",
    "rally",
    "bull",
    "breakthrough",
];
const EXTENDED_NEGATIVE: &[&str] = &[
    "loss",
    "decline",
    "fall",
    "drop",
    "crash",
    "negative",
    "fail",
    "down",
    "weak",
    "concern",
    "bear",
    "recession",
    "crisis",
];

impl Lexicon {
    /// Lexicon applied to NewsAPI articles.
    pub const BASE: Self = Self {
        positive: BASE_POSITIVE,
        negative: BASE_NEGATIVE,
    };

    /// Lexicon applied to Google News (SerpAPI) articles.
    pub const EXTENDED: Self = Self {
        positive: EXTENDED_POSITIVE,
        negative: EXTENDED_NEGATIVE,
    };
}

/// Scores `title` plus optional `description` with the base lexicon.
pub fn generate_sentiment_score(title: &str, description: Option<&str>) -> u8 {
    score_with(&Lexicon::BASE, title, description)
}

pub fn score_with(lexicon: &Lexicon, title: &str, description: Option<&str>) -> u8 {
    let text = format!("{} {}", title, description.unwrap_or_default()).to_lowercase();

    let hits = |words: &[&str]| -> i32 {
        words
            .iter()
            .filter(|word| text.contains(*word))
            .count() as i32
    };

    let score = i32::from(NEUTRAL_SCORE) + KEYWORD_WEIGHT * hits(lexicon.positive)
        - KEYWORD_WEIGHT * hits(lexicon.negative);

    score.clamp(0, 100) as u8
}

/// Dashboard label for a 0-100 mood score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Bullish,
    #[serde(rename = "Cautiously Optimistic")]
    CautiouslyOptimistic,
    Neutral,
    #[serde(rename = "Cautiously Bearish")]
    CautiouslyBearish,
    Bearish,
}

impl SentimentLabel {
    /// Bands are measured from the neutral midpoint: +30 and up is bullish,
    /// -30 and below is bearish.
    pub fn from_score(score: u8) -> Self {
        Self::from_offset(f64::from(i32::from(score) - i32::from(NEUTRAL_SCORE)))
    }

    /// Label for a signed distance from the neutral midpoint.
    pub fn from_offset(offset: f64) -> Self {
        match offset {
            o if o >= 30.0 => Self::Bullish,
            o if o >= 10.0 => Self::CautiouslyOptimistic,
            o if o >= -9.0 => Self::Neutral,
            o if o >= -29.0 => Self::CautiouslyBearish,
            _ => Self::Bearish,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "Bullish",
            Self::CautiouslyOptimistic => "Cautiously Optimistic",
            Self::Neutral => "Neutral",
            Self::CautiouslyBearish => "Cautiously Bearish",
            Self::Bearish => "Bearish",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Each bucket point moves the market score by this much.
pub const BUCKET_SCALE: f64 = 5.0;

/// Synthetic sample size reported per tracked stock.
pub const SAMPLES_PER_STOCK: u32 = 1000;

/// Buckets one stock's daily percent change.
///
/// `>= 3` is 10, `>= 1` is 5, anything strictly between -1 and 1 is 0,
/// `>= -3` is -5 and the rest is -10. Non-finite input counts as flat.
pub fn change_bucket(change_percent: f64) -> i32 {
    if !change_percent.is_finite() {
        return 0;
    }
    match change_percent {
        c if c >= 3.0 => 10,
        c if c >= 1.0 => 5,
        c if c > -1.0 => 0,
        c if c >= -3.0 => -5,
        _ => -10,
    }
}

/// Market-wide mood derived from the daily moves of a stock basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketMood {
    pub score: u8,
    pub label: SentimentLabel,
    /// Average daily change of the basket, rounded to two decimals.
    pub change: f64,
    pub samples: u32,
}

impl MarketMood {
    /// Placeholder shown while no quotes are available.
    pub fn neutral() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            label: SentimentLabel::Neutral,
            change: 0.5,
            samples: 5 * SAMPLES_PER_STOCK,
        }
    }
}

/// Computes the market mood from one daily change per tracked stock.
///
/// Stocks without a quote should be passed as `0.0`. Flat entries are left
/// out of the averages unless every entry is flat; `samples` always counts
/// the whole basket.
pub fn market_mood(changes: &[f64]) -> MarketMood {
    if changes.is_empty() {
        return MarketMood {
            score: NEUTRAL_SCORE,
            label: SentimentLabel::Neutral,
            change: 0.0,
            samples: 0,
        };
    }

    let moving: Vec<f64> = changes
        .iter()
        .copied()
        .filter(|change| *change != 0.0)
        .collect();
    let considered: &[f64] = if moving.is_empty() { changes } else { &moving };

    let count = considered.len() as f64;
    let average_bucket =
        considered.iter().map(|change| f64::from(change_bucket(*change))).sum::<f64>() / count;
    let average_change = considered
        .iter()
        .map(|change| if change.is_finite() { *change } else { 0.0 })
        .sum::<f64>()
        / count;

    let offset = average_bucket * BUCKET_SCALE;
    let score = (offset + f64::from(NEUTRAL_SCORE)).clamp(0.0, 100.0).round() as u8;

    MarketMood {
        score,
        label: SentimentLabel::from_offset(offset),
        change: (average_change * 100.0).round() / 100.0,
        samples: (changes.len() as u32).saturating_mul(SAMPLES_PER_STOCK),
    }
}
