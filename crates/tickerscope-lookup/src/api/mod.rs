//! API clients for quote and news providers

pub mod finnhub;
pub mod google_news;
pub mod yahoo;

pub use finnhub::{FinnhubClient, FinnhubNewsArticle};
pub use google_news::GoogleNewsClient;
pub use yahoo::YahooFinanceClient;
