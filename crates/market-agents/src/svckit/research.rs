//! Research Tools
//!
//! Analyst recommendations, company fundamentals and news headlines.

use std::fmt::Write as _;
use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};
use async_trait::async_trait;
use serde_json::json;

use super::{compact, markdown_table, or_na, symbol_arg};
use crate::capability::FinanceCapability;
use crate::market::MarketDataClient;

const DEFAULT_NEWS_LIMIT: u64 = 5;
const MAX_NEWS_LIMIT: u64 = 20;

fn symbol_param() -> ParameterSchema {
    ParameterSchema::required("symbol", "string", "Stock ticker symbol (e.g., 'META')")
}

/// Tool for analyst rating breakdowns
pub struct AnalystRecommendationsTool {
    market: Arc<dyn MarketDataClient>,
}

impl AnalystRecommendationsTool {
    pub fn new(market: Arc<dyn MarketDataClient>) -> Self {
        Self { market }
    }
}

#[async_trait]
impl Tool for AnalystRecommendationsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: FinanceCapability::AnalystRecommendations.tool_name().into(),
            description: "Get analyst recommendations (strong buy to strong sell counts) for a stock, most recent period first.".into(),
            parameters: vec![symbol_param()],
            category: Some("research".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbol = symbol_arg(call)?;
        let trends = self.market.analyst_recommendations(&symbol).await?;

        let rows: Vec<_> = trends
            .iter()
            .map(|t| {
                vec![
                    t.period.clone(),
                    t.strong_buy.to_string(),
                    t.buy.to_string(),
                    t.hold.to_string(),
                    t.sell.to_string(),
                    t.strong_sell.to_string(),
                    t.consensus().to_string(),
                ]
            })
            .collect();

        let mut output = format!("Analyst recommendations for {symbol}\n\n");
        output.push_str(&markdown_table(
            &["Period", "Strong Buy", "Buy", "Hold", "Sell", "Strong Sell", "Consensus"],
            &rows,
        ));
        if let Some(latest) = trends.first() {
            let _ = write!(
                output,
                "\nLatest consensus: {} ({} analysts)",
                latest.consensus(),
                latest.total()
            );
        }

        Ok(ToolResult::success(self.schema().name, output).with_data(json!(trends)))
    }
}

/// Tool for valuation and company profile
pub struct StockFundamentalsTool {
    market: Arc<dyn MarketDataClient>,
}

impl StockFundamentalsTool {
    pub fn new(market: Arc<dyn MarketDataClient>) -> Self {
        Self { market }
    }
}

#[async_trait]
impl Tool for StockFundamentalsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: FinanceCapability::StockFundamentals.tool_name().into(),
            description: "Get company fundamentals: sector, industry, market cap, P/E, EPS, dividend yield and 52-week range.".into(),
            parameters: vec![symbol_param()],
            category: Some("research".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbol = symbol_arg(call)?;
        let f = self.market.fundamentals(&symbol).await?;

        let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".into());
        let rows = vec![
            vec!["Company".into(), text(&f.company_name)],
            vec!["Sector".into(), text(&f.sector)],
            vec!["Industry".into(), text(&f.industry)],
            vec!["Market Cap".into(), compact(f.market_cap)],
            vec!["P/E (trailing)".into(), or_na(f.pe_ratio)],
            vec!["EPS (trailing)".into(), or_na(f.eps)],
            vec!["Dividend Yield".into(), or_na(f.dividend_yield)],
            vec!["52-Week High".into(), or_na(f.fifty_two_week_high)],
            vec!["52-Week Low".into(), or_na(f.fifty_two_week_low)],
        ];

        let mut output = format!("Fundamentals for {}\n\n", f.symbol);
        output.push_str(&markdown_table(&["Metric", "Value"], &rows));
        if let Some(summary) = &f.summary {
            let _ = write!(output, "\n{summary}");
        }

        Ok(ToolResult::success(self.schema().name, output).with_data(json!(f)))
    }
}

/// Tool for recent company headlines
pub struct CompanyNewsTool {
    market: Arc<dyn MarketDataClient>,
}

impl CompanyNewsTool {
    pub fn new(market: Arc<dyn MarketDataClient>) -> Self {
        Self { market }
    }
}

#[async_trait]
impl Tool for CompanyNewsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: FinanceCapability::CompanyNews.tool_name().into(),
            description: "Get the latest news headlines for a company, with publisher and link.".into(),
            parameters: vec![
                symbol_param(),
                ParameterSchema::optional(
                    "num_stories",
                    "integer",
                    "Number of stories to return",
                    json!(DEFAULT_NEWS_LIMIT),
                ),
            ],
            category: Some("research".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbol = symbol_arg(call)?;
        let limit = call
            .u64_arg("num_stories")
            .unwrap_or(DEFAULT_NEWS_LIMIT)
            .clamp(1, MAX_NEWS_LIMIT);

        let news = self
            .market
            .company_news(&symbol, usize::try_from(limit).unwrap_or(1))
            .await?;

        if news.is_empty() {
            return Ok(ToolResult::success(
                self.schema().name,
                format!("No recent news found for {symbol}"),
            ));
        }

        let rows: Vec<_> = news
            .iter()
            .map(|n| {
                vec![
                    n.published_at
                        .map_or_else(|| "N/A".into(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
                    n.title.clone(),
                    n.publisher.clone().unwrap_or_default(),
                    n.link.clone(),
                ]
            })
            .collect();

        let output = format!(
            "Latest news for {symbol}\n\n{}",
            markdown_table(&["Published (UTC)", "Headline", "Publisher", "Source"], &rows)
        );

        Ok(ToolResult::success(self.schema().name, output).with_data(json!(news)))
    }
}
