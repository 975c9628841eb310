//! # Domain Models
//!
//! Transient, in-memory types exchanged between adapters, hooks and the
//! fallback provider. Nothing here is persisted.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`QuoteSnapshot`] | Price, change and volume for one symbol |
//! | [`Ticker`] | Quote plus display metadata for screeners |
//! | [`NewsItem`] | Headline with keyword sentiment score |
//! | [`Symbol`] | Validated ticker symbol |
//! | [`UtcDateTime`] | UTC timestamp |

mod news;
mod quote;
mod symbol;
mod timestamp;

pub(crate) use news::{derive_news_id, NO_DESCRIPTION};
pub use news::{NewsItem, NewsSource};
pub use quote::{AssetKind, QuoteSnapshot, Ticker};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
