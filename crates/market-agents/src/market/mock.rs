//! Mock Market Data
//!
//! For tests and offline demos. Serves static, plausible figures for a
//! handful of large-cap tickers.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{MarketDataClient, validate_history_range};
use crate::error::{MarketError, Result};
use crate::model::{Fundamentals, NewsItem, PriceBar, Quote, RecommendationTrend};

struct Listing {
    name: &'static str,
    price: Decimal,
    previous_close: Decimal,
    sector: &'static str,
    industry: &'static str,
    market_cap: Decimal,
    pe_ratio: Decimal,
    eps: Decimal,
    ratings: [u32; 5],
}

/// Mock market-data client with static listings
#[derive(Default)]
pub struct MockMarketData;

impl MockMarketData {
    pub const fn new() -> Self {
        Self
    }

    fn listing(symbol: &str) -> Result<Listing> {
        let listing = match symbol.trim().to_uppercase().as_str() {
            "META" => Listing {
                name: "Meta Platforms, Inc.",
                price: dec!(612.40),
                previous_close: dec!(604.10),
                sector: "Communication Services",
                industry: "Internet Content & Information",
                market_cap: dec!(1_545_000_000_000),
                pe_ratio: dec!(28.7),
                eps: dec!(21.34),
                ratings: [12, 46, 7, 1, 1],
            },
            "AAPL" => Listing {
                name: "Apple Inc.",
                price: dec!(229.87),
                previous_close: dec!(231.30),
                sector: "Technology",
                industry: "Consumer Electronics",
                market_cap: dec!(3_475_000_000_000),
                pe_ratio: dec!(35.1),
                eps: dec!(6.55),
                ratings: [8, 22, 14, 2, 1],
            },
            "NVDA" => Listing {
                name: "NVIDIA Corporation",
                price: dec!(138.25),
                previous_close: dec!(135.40),
                sector: "Technology",
                industry: "Semiconductors",
                market_cap: dec!(3_390_000_000_000),
                pe_ratio: dec!(54.6),
                eps: dec!(2.53),
                ratings: [14, 42, 5, 0, 0],
            },
            "MSFT" => Listing {
                name: "Microsoft Corporation",
                price: dec!(418.16),
                previous_close: dec!(415.00),
                sector: "Technology",
                industry: "Software - Infrastructure",
                market_cap: dec!(3_108_000_000_000),
                pe_ratio: dec!(34.5),
                eps: dec!(12.12),
                ratings: [10, 38, 6, 0, 0],
            },
            "AMD" => Listing {
                name: "Advanced Micro Devices, Inc.",
                price: dec!(124.60),
                previous_close: dec!(126.31),
                sector: "Technology",
                industry: "Semiconductors",
                market_cap: dec!(202_200_000_000),
                pe_ratio: dec!(110.3),
                eps: dec!(1.13),
                ratings: [9, 27, 13, 0, 0],
            },
            "TSLA" => Listing {
                name: "Tesla, Inc.",
                price: dec!(352.56),
                previous_close: dec!(361.62),
                sector: "Consumer Cyclical",
                industry: "Auto Manufacturers",
                market_cap: dec!(1_131_000_000_000),
                pe_ratio: dec!(96.3),
                eps: dec!(3.66),
                ratings: [7, 14, 17, 6, 4],
            },
            _ => return Err(MarketError::UnknownSymbol(symbol.to_string())),
        };
        Ok(listing)
    }

    const fn bar_step_days(interval: &str) -> i64 {
        match interval.as_bytes() {
            b"5d" | b"1wk" => 7,
            b"1mo" => 30,
            b"3mo" => 91,
            _ => 1,
        }
    }

    const fn period_days(period: &str) -> i64 {
        match period.as_bytes() {
            b"1d" => 1,
            b"5d" => 5,
            b"1mo" => 30,
            b"3mo" => 91,
            b"6mo" => 182,
            b"2y" => 730,
            b"5y" => 1826,
            b"10y" | b"max" => 3652,
            _ => 365,
        }
    }
}

#[async_trait]
impl MarketDataClient for MockMarketData {
    async fn current_price(&self, symbol: &str) -> Result<Quote> {
        let listing = Self::listing(symbol)?;
        let mut quote = Quote::new(symbol.trim(), "USD", listing.price);
        quote.name = Some(listing.name.into());
        quote.previous_close = Some(listing.previous_close);
        Ok(quote)
    }

    async fn analyst_recommendations(&self, symbol: &str) -> Result<Vec<RecommendationTrend>> {
        let [strong_buy, buy, hold, sell, strong_sell] = Self::listing(symbol)?.ratings;
        Ok(vec![
            RecommendationTrend {
                period: "0m".into(),
                strong_buy,
                buy,
                hold,
                sell,
                strong_sell,
            },
            RecommendationTrend {
                period: "-1m".into(),
                strong_buy: strong_buy.saturating_sub(1),
                buy,
                hold: hold + 1,
                sell,
                strong_sell,
            },
        ])
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        let listing = Self::listing(symbol)?;
        Ok(Fundamentals {
            symbol: symbol.trim().to_uppercase(),
            company_name: Some(listing.name.into()),
            sector: Some(listing.sector.into()),
            industry: Some(listing.industry.into()),
            market_cap: Some(listing.market_cap),
            pe_ratio: Some(listing.pe_ratio),
            eps: Some(listing.eps),
            dividend_yield: None,
            fifty_two_week_high: Some((listing.price * dec!(1.12)).round_dp(2)),
            fifty_two_week_low: Some((listing.price * dec!(0.68)).round_dp(2)),
            summary: None,
        })
    }

    async fn company_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let listing = Self::listing(symbol)?;
        let symbol = symbol.trim().to_uppercase();
        let now = Utc::now();
        let headlines = [
            (format!("{} shares move after quarterly results", listing.name), "Reuters", 2),
            (format!("Analysts revisit {symbol} price targets"), "Bloomberg", 20),
            (format!("What's next for {}", listing.name), "Yahoo Finance", 46),
        ];

        Ok(headlines
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (title, publisher, hours))| NewsItem {
                title,
                publisher: Some(publisher.into()),
                link: format!("https://finance.example.com/{}/news/{}", symbol.to_lowercase(), i + 1),
                published_at: Some(now - Duration::hours(hours)),
            })
            .collect())
    }

    async fn historical_prices(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<PriceBar>> {
        validate_history_range(period, interval)?;
        let listing = Self::listing(symbol)?;

        let step = Self::bar_step_days(interval);
        let span = Self::period_days(period);
        let bars = (span / step).clamp(1, 60);
        let today: NaiveDate = Utc::now().date_naive();

        // Straight-line walk from 10% below today's price up to it
        let start = listing.price * dec!(0.9);
        let increment = (listing.price - start) / Decimal::from(bars);

        Ok((0..bars)
            .map(|i| {
                let close = (start + increment * Decimal::from(i + 1)).round_dp(2);
                PriceBar {
                    date: today - Duration::days(step * (bars - 1 - i)),
                    open: (close - increment).round_dp(2),
                    high: (close * dec!(1.01)).round_dp(2),
                    low: (close * dec!(0.99)).round_dp(2),
                    close,
                    volume: 12_000_000,
                }
            })
            .collect())
    }

    async fn health_check(&self) -> bool {
        true // Mock always healthy
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}
