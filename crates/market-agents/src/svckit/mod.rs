//! Service Kit - Agent Tools
//!
//! Domain-specific tools that implement `agent_core::Tool` for the web
//! search and finance agents.

mod price_lookup;
mod research;
mod web_search;

pub use price_lookup::{HistoricalPricesTool, StockPriceTool};
pub use research::{AnalystRecommendationsTool, CompanyNewsTool, StockFundamentalsTool};
pub use web_search::WebSearchTool;

use std::fmt::Write as _;
use std::sync::Arc;

use agent_core::{AgentError, Result as CoreResult, Tool, ToolCall};
use rust_decimal::Decimal;

use crate::capability::{Capabilities, FinanceCapability};
use crate::market::MarketDataClient;

/// One tool per enabled capability, in declaration order
pub fn finance_tools(market: &Arc<dyn MarketDataClient>, enabled: Capabilities) -> Vec<Arc<dyn Tool>> {
    enabled
        .iter()
        .map(|capability| -> Arc<dyn Tool> {
            let market = Arc::clone(market);
            match capability {
                FinanceCapability::StockPrice => Arc::new(StockPriceTool::new(market)),
                FinanceCapability::AnalystRecommendations => {
                    Arc::new(AnalystRecommendationsTool::new(market))
                }
                FinanceCapability::StockFundamentals => Arc::new(StockFundamentalsTool::new(market)),
                FinanceCapability::CompanyNews => Arc::new(CompanyNewsTool::new(market)),
                FinanceCapability::HistoricalPrices => Arc::new(HistoricalPricesTool::new(market)),
            }
        })
        .collect()
}

/// Required `symbol` argument, upper-cased
fn symbol_arg(call: &ToolCall) -> CoreResult<String> {
    call.str_arg("symbol")
        .map(str::to_uppercase)
        .ok_or_else(|| AgentError::ToolValidation("symbol must be a non-empty ticker".into()))
}

/// Render a GitHub-flavored markdown table
fn markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = format!("| {} |\n", headers.join(" | "));
    let _ = writeln!(out, "|{}", "---|".repeat(headers.len()));
    for row in rows {
        let cells: Vec<_> = row.iter().map(|c| c.replace('|', "\\|")).collect();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    }
    out
}

fn or_na(value: Option<Decimal>) -> String {
    value.map_or_else(|| "N/A".into(), |v| v.round_dp(2).to_string())
}

/// Compact large figures: 1546000000000 -> 1.55T
fn compact(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return "N/A".into();
    };
    let scales = [
        (Decimal::from(1_000_000_000_000_u64), "T"),
        (Decimal::from(1_000_000_000_u64), "B"),
        (Decimal::from(1_000_000_u64), "M"),
    ];
    scales
        .iter()
        .find(|(scale, _)| value.abs() >= *scale)
        .map_or_else(
            || value.round_dp(2).to_string(),
            |(scale, suffix)| format!("{}{suffix}", (value / scale).round_dp(2).normalize()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockMarketData;
    use rust_decimal_macros::dec;

    #[test]
    fn test_finance_tools_follow_capabilities() {
        let market: Arc<dyn MarketDataClient> = Arc::new(MockMarketData::new());

        let all = finance_tools(&market, Capabilities::all());
        let names: Vec<_> = all.iter().map(|t| t.schema().name).collect();
        assert_eq!(
            names,
            FinanceCapability::ALL.iter().map(|c| c.tool_name()).collect::<Vec<_>>()
        );

        let some = finance_tools(
            &market,
            Capabilities::only(FinanceCapability::CompanyNews).with(FinanceCapability::StockPrice),
        );
        let names: Vec<_> = some.iter().map(|t| t.schema().name).collect();
        assert_eq!(names, vec!["get_current_stock_price", "get_company_news"]);

        assert!(finance_tools(&market, Capabilities::NONE).is_empty());
    }

    #[test]
    fn test_markdown_table() {
        let table = markdown_table(&["A", "B"], &[vec!["1".into(), "x|y".into()]]);
        assert_eq!(table, "| A | B |\n|---|---|\n| 1 | x\\|y |\n");
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact(Some(dec!(1546000000000))), "1.55T");
        assert_eq!(compact(Some(dec!(2500000))), "2.5M");
        assert_eq!(compact(Some(dec!(999.123))), "999.12");
        assert_eq!(compact(None), "N/A");
    }
}
