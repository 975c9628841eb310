//! Rule-based assistant used when DeepSeek is unavailable.
//!
//! Messages are classified into an [`Intent`] by whole-word keyword rules,
//! checked in table order, and each intent has its own reply builder.

use moodmeter_core::{SentimentLabel, SentimentReport, UtcDateTime};
use regex::Regex;

const TICKER_PATTERN: &str = r"\$([A-Za-z][A-Za-z0-9.]{0,9})";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Sentiment,
    MarketOverview,
    Crypto,
    News,
    Greeting,
    Help,
    General,
}

struct IntentRule {
    intent: Intent,
    keywords: &'static [&'static str],
}

const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::Sentiment,
        keywords: &["sentiment", "mood", "bullish", "bearish", "feeling"],
    },
    IntentRule {
        intent: Intent::MarketOverview,
        keywords: &["market", "markets", "overview", "s&p", "dow", "nasdaq", "stocks"],
    },
    IntentRule {
        intent: Intent::Crypto,
        keywords: &["crypto", "cryptocurrency", "bitcoin", "btc", "ethereum", "eth"],
    },
    IntentRule {
        intent: Intent::News,
        keywords: &["news", "headline", "headlines"],
    },
    IntentRule {
        intent: Intent::Greeting,
        keywords: &["hi", "hello", "hey", "good morning", "good afternoon"],
    },
    IntentRule {
        intent: Intent::Help,
        keywords: &["help", "what can you do", "how does this work"],
    },
];

impl Intent {
    pub fn classify(message: &str) -> Self {
        let words = normalize(message);
        INTENT_RULES
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|keyword| words.contains(&format!(" {keyword} ")))
            })
            .map(|rule| rule.intent)
            .unwrap_or(Self::General)
    }
}

/// Lower-cases and pads `message` so keywords match on word boundaries.
fn normalize(message: &str) -> String {
    let cleaned: String = message
        .to_lowercase()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '&' | '$' | '.') {
                ch
            } else {
                ' '
            }
        })
        .collect();
    let joined = cleaned
        .split_whitespace()
        .map(|word| word.trim_end_matches('.'))
        .collect::<Vec<_>>()
        .join(" ");
    format!(" {joined} ")
}

struct KnownTicker {
    symbol: &'static str,
    name: &'static str,
    score: u8,
    summary: &'static str,
    drivers: &'static [&'static str],
}

const KNOWN_TICKERS: &[KnownTicker] = &[
    KnownTicker {
        symbol: "AAPL",
        name: "Apple",
        score: 68,
        summary: "Social chatter around Apple is constructive, led by services growth and steady iPhone demand.",
        drivers: &["Services revenue growth", "Share buybacks", "China demand concerns"],
    },
    KnownTicker {
        symbol: "TSLA",
        name: "Tesla",
        score: 55,
        summary: "Tesla sentiment is split between delivery worries and enthusiasm for autonomy and energy storage.",
        drivers: &["Delivery numbers", "Price cuts", "Robotaxi expectations"],
    },
    KnownTicker {
        symbol: "NVDA",
        name: "NVIDIA",
        score: 84,
        summary: "NVIDIA remains a crowd favourite on the back of data-center demand for AI accelerators.",
        drivers: &["AI chip demand", "Data-center revenue", "Valuation debate"],
    },
    KnownTicker {
        symbol: "MSFT",
        name: "Microsoft",
        score: 72,
        summary: "Microsoft discussion is upbeat, driven by Azure growth and Copilot adoption.",
        drivers: &["Azure growth", "AI integration", "Enterprise spending"],
    },
    KnownTicker {
        symbol: "AMZN",
        name: "Amazon",
        score: 66,
        summary: "Amazon sentiment tilts positive as AWS re-accelerates and retail margins improve.",
        drivers: &["AWS growth", "Retail margins", "Advertising business"],
    },
    KnownTicker {
        symbol: "GOOGL",
        name: "Alphabet",
        score: 61,
        summary: "Alphabet draws cautious optimism: search is resilient while AI competition keeps traders watchful.",
        drivers: &["Search share", "Cloud growth", "Regulatory pressure"],
    },
    KnownTicker {
        symbol: "META",
        name: "Meta Platforms",
        score: 70,
        summary: "Meta enjoys positive sentiment from advertising strength and cost discipline.",
        drivers: &["Ad revenue", "Efficiency push", "Reality Labs spending"],
    },
    KnownTicker {
        symbol: "BTC",
        name: "Bitcoin",
        score: 74,
        summary: "Bitcoin sentiment is bullish with ETF inflows and post-halving supply narratives.",
        drivers: &["ETF inflows", "Halving cycle", "Macro liquidity"],
    },
    KnownTicker {
        symbol: "ETH",
        name: "Ethereum",
        score: 63,
        summary: "Ethereum sentiment is constructive but trails Bitcoin as traders weigh L2 activity against fees.",
        drivers: &["Layer-2 adoption", "Staking yields", "ETF approval hopes"],
    },
];

/// Deterministic replies for chat and sentiment requests.
#[derive(Debug, Clone)]
pub struct Responder {
    ticker_pattern: Regex,
}

impl Responder {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            ticker_pattern: Regex::new(TICKER_PATTERN)?,
        })
    }

    pub fn reply(&self, message: &str) -> String {
        match Intent::classify(message) {
            Intent::Sentiment => self.sentiment_reply(message),
            Intent::MarketOverview => market_overview_reply(),
            Intent::Crypto => crypto_reply(),
            Intent::News => news_reply(),
            Intent::Greeting => greeting_reply(),
            Intent::Help => help_reply(),
            Intent::General => general_reply(),
        }
    }

    /// `$TICKER` mentions in `message`, upper-cased, in order of appearance.
    pub fn extract_tickers(&self, message: &str) -> Vec<String> {
        let mut tickers: Vec<String> = Vec::new();
        for capture in self.ticker_pattern.captures_iter(message) {
            let ticker = capture[1].trim_end_matches('.').to_ascii_uppercase();
            if !tickers.contains(&ticker) {
                tickers.push(ticker);
            }
        }
        tickers
    }

    fn sentiment_reply(&self, message: &str) -> String {
        let tickers = self.extract_tickers(message);
        if tickers.is_empty() {
            return String::from(
                "Which ticker should I check? Mention it with a dollar sign, for example: \"What's the sentiment on $AAPL?\"",
            );
        }

        tickers
            .iter()
            .map(|ticker| {
                let report = sentiment_report(ticker);
                if report.found {
                    format!(
                        "${} sentiment: {} ({}/100). {}",
                        report.ticker, report.sentiment, report.score, report.summary
                    )
                } else {
                    report.summary
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Templated analysis for `ticker`. Unknown tickers get the not-found template.
pub fn sentiment_report(ticker: &str) -> SentimentReport {
    let symbol = ticker.trim().trim_start_matches('$').to_ascii_uppercase();

    match KNOWN_TICKERS.iter().find(|known| known.symbol == symbol) {
        Some(known) => SentimentReport {
            ticker: symbol,
            found: true,
            sentiment: SentimentLabel::from_score(known.score),
            score: known.score,
            summary: format!("{} ({}): {}", known.name, known.symbol, known.summary),
            drivers: known.drivers.iter().map(|d| (*d).to_owned()).collect(),
            timestamp: UtcDateTime::now(),
        },
        None => SentimentReport {
            summary: format!(
                "Ticker {symbol} not found. I currently track {}.",
                supported_symbols().join(", ")
            ),
            ticker: symbol,
            found: false,
            sentiment: SentimentLabel::Neutral,
            score: moodmeter_core::sentiment::NEUTRAL_SCORE,
            drivers: Vec::new(),
            timestamp: UtcDateTime::now(),
        },
    }
}

pub fn supported_symbols() -> Vec<&'static str> {
    KNOWN_TICKERS.iter().map(|known| known.symbol).collect()
}

fn market_overview_reply() -> String {
    let (bullish, bearish): (Vec<&KnownTicker>, Vec<&KnownTicker>) =
        KNOWN_TICKERS.iter().partition(|known| known.score >= 60);
    let leaders = bullish
        .iter()
        .map(|known| format!("${}", known.symbol))
        .collect::<Vec<_>>()
        .join(", ");
    let average = KNOWN_TICKERS.iter().map(|known| u32::from(known.score)).sum::<u32>()
        / KNOWN_TICKERS.len().max(1) as u32;

    format!(
        "Overall market mood is {} ({average}/100). Strongest sentiment: {leaders}. {} tracked names are neutral or weaker.",
        SentimentLabel::from_score(average.min(100) as u8),
        bearish.len()
    )
}

fn crypto_reply() -> String {
    let crypto: Vec<String> = ["BTC", "ETH"]
        .iter()
        .map(|symbol| {
            let report = sentiment_report(symbol);
            format!("${} is {} ({}/100)", report.ticker, report.sentiment, report.score)
        })
        .collect();
    format!(
        "Crypto sentiment snapshot: {}. Ask about a coin with $SYMBOL for details.",
        crypto.join("; ")
    )
}

fn news_reply() -> String {
    String::from(
        "The news feed combines NewsAPI business headlines with Google News results, each scored for sentiment. Open the news panel for the latest stories.",
    )
}

fn greeting_reply() -> String {
    String::from(
        "Hello! I'm the MoodMeter assistant. Ask me about market mood, crypto, or a ticker like $TSLA.",
    )
}

fn help_reply() -> String {
    format!(
        "I can summarize market mood, crypto sentiment and headlines, or analyze a ticker: try \"sentiment for $NVDA\". Tracked tickers: {}.",
        supported_symbols().join(", ")
    )
}

fn general_reply() -> String {
    String::from(
        "I'm not sure I understood. Ask about market sentiment, crypto, the news, or a specific ticker such as $AAPL.",
    )
}
