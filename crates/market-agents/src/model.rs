//! Domain Models
//!
//! Data returned by the external search and market-data providers.
//! Prices and ratios use `rust_decimal`; counts stay integral.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest trade price for a ticker
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker symbol (e.g., "META")
    pub symbol: String,

    /// Company name when the provider reports one
    pub name: Option<String>,

    /// Quote currency (e.g., "USD")
    pub currency: String,

    pub price: Decimal,

    pub previous_close: Option<Decimal>,

    pub as_of: DateTime<Utc>,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, currency: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            name: None,
            currency: currency.into(),
            price,
            previous_close: None,
            as_of: Utc::now(),
        }
    }

    /// Percentage move against the previous close
    pub fn change_percent(&self) -> Option<Decimal> {
        let previous = self.previous_close.filter(|p| !p.is_zero())?;
        Some(((self.price - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2))
    }
}

/// Company fundamentals snapshot
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Fundamentals {
    pub symbol: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<Decimal>,
    pub pe_ratio: Option<Decimal>,
    pub eps: Option<Decimal>,
    pub dividend_yield: Option<Decimal>,
    pub fifty_two_week_high: Option<Decimal>,
    pub fifty_two_week_low: Option<Decimal>,
    pub summary: Option<String>,
}

/// Analyst rating counts for one period ("0m" = current month, "-1m" = last month)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationTrend {
    pub period: String,
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

impl RecommendationTrend {
    pub const fn total(&self) -> u32 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }

    /// Bucket with the most analysts; ties resolve toward the more cautious rating
    pub fn consensus(&self) -> &'static str {
        let buckets = [
            ("Strong Buy", self.strong_buy),
            ("Buy", self.buy),
            ("Hold", self.hold),
            ("Sell", self.sell),
            ("Strong Sell", self.strong_sell),
        ];
        buckets
            .iter()
            .max_by_key(|(_, count)| *count)
            .filter(|(_, count)| *count > 0)
            .map_or("No coverage", |(label, _)| *label)
    }
}

/// Headline about a company
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub publisher: Option<String>,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// One OHLCV bar
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// A single web search result with its source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_change_percent() {
        let mut quote = Quote::new("meta", "USD", dec!(110));
        assert_eq!(quote.symbol, "META");
        assert_eq!(quote.change_percent(), None);

        quote.previous_close = Some(dec!(100));
        assert_eq!(quote.change_percent(), Some(dec!(10)));
    }

    #[test]
    fn test_consensus() {
        let trend = RecommendationTrend {
            period: "0m".into(),
            strong_buy: 12,
            buy: 40,
            hold: 8,
            sell: 1,
            strong_sell: 0,
        };
        assert_eq!(trend.total(), 61);
        assert_eq!(trend.consensus(), "Buy");

        let tie = RecommendationTrend { buy: 5, hold: 5, ..trend.clone() };
        assert_eq!(RecommendationTrend { strong_buy: 0, ..tie }.consensus(), "Hold");

        let empty = RecommendationTrend {
            period: "0m".into(),
            strong_buy: 0,
            buy: 0,
            hold: 0,
            sell: 0,
            strong_sell: 0,
        };
        assert_eq!(empty.consensus(), "No coverage");
    }
}
