//! Market Data Integration
//!
//! Abstraction over the external financial-data provider and its
//! implementations.

mod mock;
mod yahoo;

pub use mock::MockMarketData;
pub use yahoo::YahooFinanceClient;

use async_trait::async_trait;

use crate::error::{MarketError, Result};
use crate::model::{Fundamentals, NewsItem, PriceBar, Quote, RecommendationTrend};

/// Look-back windows accepted for price history
pub const PERIODS: &[&str] = &["1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"];

/// Bar sizes accepted for price history
pub const INTERVALS: &[&str] = &["1d", "5d", "1wk", "1mo", "3mo"];

/// Check a history request before it reaches the provider
pub fn validate_history_range(period: &str, interval: &str) -> Result<()> {
    if !PERIODS.contains(&period) {
        return Err(MarketError::Unsupported { field: "period", value: period.to_string() });
    }
    if !INTERVALS.contains(&interval) {
        return Err(MarketError::Unsupported { field: "interval", value: interval.to_string() });
    }
    Ok(())
}

/// Market-data client trait (Strategy pattern)
///
/// One method per finance capability. Implementations talk to a real
/// provider or serve canned data.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Latest price
    async fn current_price(&self, symbol: &str) -> Result<Quote>;

    /// Analyst rating counts, most recent period first
    async fn analyst_recommendations(&self, symbol: &str) -> Result<Vec<RecommendationTrend>>;

    /// Valuation and profile snapshot
    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals>;

    /// Recent headlines, newest first
    async fn company_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>>;

    /// OHLCV bars, oldest first
    async fn historical_prices(&self, symbol: &str, period: &str, interval: &str)
    -> Result<Vec<PriceBar>>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> bool;

    /// Provider name
    fn name(&self) -> &str;
}
