//! Yahoo Finance Client
//!
//! Reads the public chart, quote-summary and search endpoints. No API key
//! is needed but the service rejects requests without a browser-like
//! user agent, and quote-summary also wants a session cookie plus the
//! matching crumb.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::{MarketDataClient, validate_history_range};
use crate::error::{MarketError, Result};
use crate::model::{Fundamentals, NewsItem, PriceBar, Quote, RecommendationTrend};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
/// Sets the session cookie the crumb is tied to (answers 404, that is fine)
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

const SERVICE: &str = "Yahoo Finance";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const SUMMARY_MODULES: &str = "recommendationTrend,summaryDetail,defaultKeyStatistics,assetProfile,price";

// Chart endpoint

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    description: Option<String>,
}

// Quote summary endpoint

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    recommendation_trend: Option<TrendModule>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
    asset_profile: Option<AssetProfile>,
    price: Option<PriceModule>,
}

#[derive(Debug, Deserialize)]
struct TrendModule {
    #[serde(default)]
    trend: Vec<ApiTrend>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTrend {
    period: String,
    #[serde(default)]
    strong_buy: u32,
    #[serde(default)]
    buy: u32,
    #[serde(default)]
    hold: u32,
    #[serde(default)]
    sell: u32,
    #[serde(default)]
    strong_sell: u32,
}

/// Yahoo wraps numbers as `{"raw": 1.5, "fmt": "1.50"}`
#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    market_cap: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    dividend_yield: Option<RawValue>,
    fifty_two_week_high: Option<RawValue>,
    fifty_two_week_low: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    trailing_eps: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    long_business_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
}

// Search endpoint (news)

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    news: Vec<ApiNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiNews {
    title: String,
    publisher: Option<String>,
    link: String,
    provider_publish_time: Option<i64>,
}

fn decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64)
}

fn raw(value: Option<&RawValue>) -> Option<Decimal> {
    decimal(value.and_then(|v| v.raw))
}

fn api_error(error: Option<ApiError>, symbol: &str) -> MarketError {
    match error {
        Some(e) if e.code.as_deref() == Some("Not Found") => {
            MarketError::UnknownSymbol(symbol.to_string())
        }
        Some(e) => MarketError::Parse(
            e.description
                .or(e.code)
                .unwrap_or_else(|| "unknown error".into()),
        ),
        None => MarketError::NoData { what: "data", symbol: symbol.to_string() },
    }
}

/// Yahoo Finance market-data client
pub struct YahooFinanceClient {
    client: reqwest::Client,
    base_url: String,
    cookie_url: String,
    crumb: Mutex<Option<String>>,
}

impl YahooFinanceClient {
    pub fn new() -> Result<Self> {
        Self::with_urls(DEFAULT_BASE_URL, DEFAULT_COOKIE_URL)
    }

    /// Point the client at another host (tests use a local mock server);
    /// the session cookie is fetched from the same host
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let cookie_url = format!("{}/", base_url.trim_end_matches('/'));
        Self::with_urls(base_url, cookie_url)
    }

    pub fn with_urls(base_url: impl Into<String>, cookie_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie_url: cookie_url.into(),
            crumb: Mutex::new(None),
        })
    }

    /// Cached crumb, fetched on first use or when `refresh` is set
    async fn crumb(&self, refresh: bool) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if !refresh {
            if let Some(crumb) = cached.as_ref() {
                return Ok(crumb.clone());
            }
        }

        // Only the Set-Cookie header matters here
        self.client.get(&self.cookie_url).send().await?;

        let response = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await?;
        let status = response.status();
        let crumb = response.text().await?.trim().to_string();

        if !status.is_success() || crumb.is_empty() || crumb.starts_with('{') {
            return Err(MarketError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body: format!("no crumb issued: {}", crumb.chars().take(200).collect::<String>()),
            });
        }

        tracing::debug!("Yahoo Finance crumb refreshed");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    fn normalize(symbol: &str) -> Result<String> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty()
            || !symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
        {
            return Err(MarketError::UnknownSymbol(symbol));
        }
        Ok(symbol)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        symbol: &str,
    ) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!(%url, ?query, "Yahoo Finance request");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(MarketError::UnknownSymbol(symbol.to_string()));
        }
        if !status.is_success() {
            return Err(MarketError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn chart(&self, symbol: &str, range: &str, interval: &str) -> Result<ChartResult> {
        let symbol = Self::normalize(symbol)?;
        let envelope: ChartEnvelope = self
            .get_json(
                &format!("v8/finance/chart/{symbol}"),
                &[("range", range), ("interval", interval)],
                &symbol,
            )
            .await?;

        match envelope.chart.result.and_then(|r| r.into_iter().next()) {
            Some(result) => Ok(result),
            None => Err(api_error(envelope.chart.error, &symbol)),
        }
    }

    async fn summary(&self, symbol: &str) -> Result<SummaryResult> {
        let symbol = Self::normalize(symbol)?;
        let path = format!("v10/finance/quoteSummary/{symbol}");

        let crumb = self.crumb(false).await?;
        let first: Result<SummaryEnvelope> = self
            .get_json(&path, &[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())], &symbol)
            .await;

        // A 401 means the session expired; retry once with a fresh crumb
        let envelope: SummaryEnvelope = match first {
            Err(MarketError::Status { status: 401, .. }) => {
                let crumb = self.crumb(true).await?;
                self.get_json(&path, &[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())], &symbol)
                    .await?
            }
            other => other?,
        };

        match envelope.quote_summary.result.and_then(|r| r.into_iter().next()) {
            Some(result) => Ok(result),
            None => Err(api_error(envelope.quote_summary.error, &symbol)),
        }
    }
}

#[async_trait]
impl MarketDataClient for YahooFinanceClient {
    async fn current_price(&self, symbol: &str) -> Result<Quote> {
        let chart = self.chart(symbol, "1d", "1d").await?;
        let meta = chart.meta;

        let price = decimal(meta.regular_market_price).ok_or_else(|| MarketError::NoData {
            what: "price",
            symbol: meta.symbol.clone(),
        })?;

        let mut quote = Quote::new(
            meta.symbol,
            meta.currency.unwrap_or_else(|| "USD".into()),
            price,
        );
        quote.name = meta.long_name.or(meta.short_name);
        quote.previous_close = decimal(meta.chart_previous_close.or(meta.previous_close));
        Ok(quote)
    }

    async fn analyst_recommendations(&self, symbol: &str) -> Result<Vec<RecommendationTrend>> {
        let trends: Vec<_> = self
            .summary(symbol)
            .await?
            .recommendation_trend
            .map(|t| t.trend)
            .unwrap_or_default()
            .into_iter()
            .map(|t| RecommendationTrend {
                period: t.period,
                strong_buy: t.strong_buy,
                buy: t.buy,
                hold: t.hold,
                sell: t.sell,
                strong_sell: t.strong_sell,
            })
            .collect();

        if trends.is_empty() {
            return Err(MarketError::NoData {
                what: "analyst recommendations",
                symbol: symbol.trim().to_uppercase(),
            });
        }
        Ok(trends)
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        let summary = self.summary(symbol).await?;
        let detail = summary.summary_detail.as_ref();
        let profile = summary.asset_profile;

        Ok(Fundamentals {
            symbol: symbol.trim().to_uppercase(),
            company_name: summary.price.and_then(|p| p.long_name.or(p.short_name)),
            sector: profile.as_ref().and_then(|p| p.sector.clone()),
            industry: profile.as_ref().and_then(|p| p.industry.clone()),
            market_cap: raw(detail.and_then(|d| d.market_cap.as_ref())),
            pe_ratio: raw(detail.and_then(|d| d.trailing_pe.as_ref())),
            eps: raw(summary
                .default_key_statistics
                .as_ref()
                .and_then(|s| s.trailing_eps.as_ref())),
            dividend_yield: raw(detail.and_then(|d| d.dividend_yield.as_ref())),
            fifty_two_week_high: raw(detail.and_then(|d| d.fifty_two_week_high.as_ref())),
            fifty_two_week_low: raw(detail.and_then(|d| d.fifty_two_week_low.as_ref())),
            summary: profile.and_then(|p| p.long_business_summary),
        })
    }

    async fn company_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let symbol = Self::normalize(symbol)?;
        let count = limit.to_string();
        let envelope: SearchEnvelope = self
            .get_json(
                "v1/finance/search",
                &[("q", symbol.as_str()), ("newsCount", count.as_str()), ("quotesCount", "0")],
                &symbol,
            )
            .await?;

        Ok(envelope
            .news
            .into_iter()
            .take(limit)
            .map(|n| NewsItem {
                title: n.title,
                publisher: n.publisher,
                link: n.link,
                published_at: n.provider_publish_time.and_then(|ts| DateTime::from_timestamp(ts, 0)),
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
        let chart = self.chart(symbol, period, interval).await?;
        let series = chart
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .unwrap_or_default();

        let at = |values: &[Option<f64>], i: usize| decimal(values.get(i).copied().flatten());

        // Yahoo pads holidays and halted sessions with nulls; skip those rows
        let bars: Vec<_> = chart
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                Some(PriceBar {
                    date: DateTime::from_timestamp(*ts, 0)?.date_naive(),
                    open: at(&series.open, i)?,
                    high: at(&series.high, i)?,
                    low: at(&series.low, i)?,
                    close: at(&series.close, i)?,
                    volume: series.volume.get(i).copied().flatten().unwrap_or(0),
                })
            })
            .collect();

        if bars.is_empty() {
            return Err(MarketError::NoData {
                what: "price history",
                symbol: chart.meta.symbol,
            });
        }
        Ok(bars)
    }

    async fn health_check(&self) -> bool {
        match self.current_price("SPY").await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Yahoo Finance health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use rust_decimal_macros::dec;

    fn client_for(server: &mockito::ServerGuard) -> YahooFinanceClient {
        YahooFinanceClient::with_base_url(server.url()).unwrap()
    }

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "META",
                    "currency": "USD",
                    "longName": "Meta Platforms, Inc.",
                    "regularMarketPrice": 612.4,
                    "chartPreviousClose": 604.1
                },
                "timestamp": [1717164000, 1717423200, 1717509600],
                "indicators": {
                    "quote": [{
                        "open": [465.1, null, 477.0],
                        "high": [469.9, null, 480.3],
                        "low": [462.0, null, 475.2],
                        "close": [466.8, null, 479.1],
                        "volume": [11200000, null, 9800000]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[tokio::test]
    async fn test_current_price() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v8/finance/chart/META")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("range".into(), "1d".into()),
                Matcher::UrlEncoded("interval".into(), "1d".into()),
            ]))
            .with_status(200)
            .with_body(CHART)
            .create_async()
            .await;

        let quote = client_for(&server).current_price("meta").await.unwrap();
        mock.assert_async().await;

        assert_eq!(quote.symbol, "META");
        assert_eq!(quote.price, dec!(612.4));
        assert_eq!(quote.previous_close, Some(dec!(604.1)));
        assert_eq!(quote.name.as_deref(), Some("Meta Platforms, Inc."));
    }

    #[tokio::test]
    async fn test_history_skips_null_rows() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v8/finance/chart/META")
            .match_query(Matcher::UrlEncoded("range".into(), "1mo".into()))
            .with_body(CHART)
            .create_async()
            .await;

        let bars = client_for(&server)
            .historical_prices("META", "1mo", "1d")
            .await
            .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, dec!(479.1));
        assert_eq!(bars[1].volume, 9_800_000);
    }

    #[tokio::test]
    async fn test_history_rejects_bad_period_without_request() {
        let server = mockito::Server::new_async().await;
        let err = client_for(&server)
            .historical_prices("META", "7w", "1d")
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Unsupported { field: "period", .. }));
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v8/finance/chart/NOPE")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#)
            .create_async()
            .await;

        let err = client_for(&server).current_price("NOPE").await.unwrap_err();
        assert!(matches!(err, MarketError::UnknownSymbol(ref s) if s == "NOPE"));
    }

    #[tokio::test]
    async fn test_recommendations_and_fundamentals() {
        let body = r#"{
            "quoteSummary": {
                "result": [{
                    "recommendationTrend": {"trend": [
                        {"period": "0m", "strongBuy": 12, "buy": 46, "hold": 7, "sell": 1, "strongSell": 1},
                        {"period": "-1m", "strongBuy": 11, "buy": 45, "hold": 8, "sell": 1, "strongSell": 1}
                    ]},
                    "summaryDetail": {
                        "marketCap": {"raw": 1545000000000, "fmt": "1.55T"},
                        "trailingPE": {"raw": 28.7, "fmt": "28.70"},
                        "fiftyTwoWeekHigh": {"raw": 638.4},
                        "fiftyTwoWeekLow": {"raw": 414.5}
                    },
                    "defaultKeyStatistics": {"trailingEps": {"raw": 21.34}},
                    "assetProfile": {"sector": "Communication Services", "industry": "Internet Content & Information"},
                    "price": {"longName": "Meta Platforms, Inc."}
                }],
                "error": null
            }
        }"#;

        let mut server = mockito::Server::new_async().await;
        let session = server
            .mock("GET", "/")
            .with_status(404)
            .with_header("set-cookie", "A3=d=session; Path=/")
            .expect(1)
            .create_async()
            .await;
        let crumb = server
            .mock("GET", "/v1/test/getcrumb")
            .with_body("abc123")
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/v10/finance/quoteSummary/META")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("modules=".into()),
                Matcher::UrlEncoded("crumb".into(), "abc123".into()),
            ]))
            .with_body(body)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);

        let trends = client.analyst_recommendations("META").await.unwrap();
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].consensus(), "Buy");

        let fundamentals = client.fundamentals("META").await.unwrap();
        assert_eq!(fundamentals.pe_ratio, Some(dec!(28.7)));
        assert_eq!(fundamentals.eps, Some(dec!(21.34)));
        assert_eq!(fundamentals.sector.as_deref(), Some("Communication Services"));
        assert_eq!(fundamentals.dividend_yield, None);

        // Crumb is fetched once and reused
        session.assert_async().await;
        crumb.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_crumb_is_refreshed_once() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/").with_status(404).create_async().await;
        let refresh = server
            .mock("GET", "/v1/test/getcrumb")
            .with_body("fresh")
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/v10/finance/quoteSummary/META")
            .match_query(Matcher::UrlEncoded("crumb".into(), "stale".into()))
            .with_status(401)
            .with_body(r#"{"finance":{"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/v10/finance/quoteSummary/META")
            .match_query(Matcher::UrlEncoded("crumb".into(), "fresh".into()))
            .with_body(r#"{"quoteSummary":{"result":[{"recommendationTrend":{"trend":[
                {"period":"0m","strongBuy":3,"buy":4,"hold":1,"sell":0,"strongSell":0}
            ]}}],"error":null}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        *client.crumb.lock().await = Some("stale".into());

        let trends = client.analyst_recommendations("META").await.unwrap();
        assert_eq!(trends.len(), 1);
        refresh.assert_async().await;
        assert_eq!(client.crumb.lock().await.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_missing_crumb_is_a_status_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/").with_status(404).create_async().await;
        server
            .mock("GET", "/v1/test/getcrumb")
            .with_status(429)
            .with_body("Too Many Requests")
            .create_async()
            .await;

        let err = client_for(&server).fundamentals("META").await.unwrap_err();
        assert!(matches!(err, MarketError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_company_news() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/finance/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "META".into()),
                Matcher::UrlEncoded("newsCount".into(), "1".into()),
            ]))
            .with_body(r#"{"news": [
                {"title": "Meta unveils new model", "publisher": "Reuters", "link": "https://example.com/a", "providerPublishTime": 1717509600}
            ]}"#)
            .create_async()
            .await;

        let news = client_for(&server).company_news("meta", 1).await.unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].publisher.as_deref(), Some("Reuters"));
        assert!(news[0].published_at.is_some());
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v8/finance/chart/META")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let err = client_for(&server).current_price("META").await.unwrap_err();
        assert!(matches!(err, MarketError::Status { status: 503, .. }));
    }
}
