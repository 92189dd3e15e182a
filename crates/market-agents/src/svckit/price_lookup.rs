//! Price Tools
//!
//! Current quote and OHLCV history from the market-data provider.

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};
use async_trait::async_trait;
use serde_json::json;

use super::{markdown_table, symbol_arg};
use crate::capability::FinanceCapability;
use crate::market::{INTERVALS, MarketDataClient, PERIODS};

const DEFAULT_PERIOD: &str = "1mo";
const DEFAULT_INTERVAL: &str = "1d";

fn symbol_param() -> ParameterSchema {
    ParameterSchema::required("symbol", "string", "Stock ticker symbol (e.g., 'META', 'NVDA')")
}

/// Tool for looking up the latest stock price
pub struct StockPriceTool {
    market: Arc<dyn MarketDataClient>,
}

impl StockPriceTool {
    pub fn new(market: Arc<dyn MarketDataClient>) -> Self {
        Self { market }
    }
}

#[async_trait]
impl Tool for StockPriceTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: FinanceCapability::StockPrice.tool_name().into(),
            description: "Get the current stock price for a ticker symbol.".into(),
            parameters: vec![symbol_param()],
            category: Some("market_data".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbol = symbol_arg(call)?;
        let quote = self.market.current_price(&symbol).await?;

        let mut output = format!("{}: {:.2} {}", quote.symbol, quote.price, quote.currency);
        if let Some(name) = &quote.name {
            output = format!("{name} ({output})");
        }
        if let Some(change) = quote.change_percent() {
            output.push_str(&format!(" ({change:+}% vs previous close)"));
        }

        Ok(ToolResult::success(self.schema().name, output).with_data(json!(quote)))
    }
}

/// Tool for fetching historical OHLCV bars
pub struct HistoricalPricesTool {
    market: Arc<dyn MarketDataClient>,
}

impl HistoricalPricesTool {
    pub fn new(market: Arc<dyn MarketDataClient>) -> Self {
        Self { market }
    }
}

#[async_trait]
impl Tool for HistoricalPricesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: FinanceCapability::HistoricalPrices.tool_name().into(),
            description: "Get historical daily/weekly/monthly prices for a stock as a table of open, high, low, close and volume.".into(),
            parameters: vec![
                symbol_param(),
                ParameterSchema::optional(
                    "period",
                    "string",
                    format!("Look-back window, one of: {}", PERIODS.join(", ")),
                    json!(DEFAULT_PERIOD),
                ),
                ParameterSchema::optional(
                    "interval",
                    "string",
                    format!("Bar size, one of: {}", INTERVALS.join(", ")),
                    json!(DEFAULT_INTERVAL),
                ),
            ],
            category: Some("market_data".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbol = symbol_arg(call)?;
        let period = call.str_arg("period").unwrap_or(DEFAULT_PERIOD);
        let interval = call.str_arg("interval").unwrap_or(DEFAULT_INTERVAL);

        let bars = self
            .market
            .historical_prices(&symbol, period, interval)
            .await?;

        let rows: Vec<_> = bars
            .iter()
            .map(|b| {
                vec![
                    b.date.to_string(),
                    format!("{:.2}", b.open),
                    format!("{:.2}", b.high),
                    format!("{:.2}", b.low),
                    format!("{:.2}", b.close),
                    b.volume.to_string(),
                ]
            })
            .collect();

        let output = format!(
            "{symbol} prices ({period}, {interval} bars)\n\n{}",
            markdown_table(&["Date", "Open", "High", "Low", "Close", "Volume"], &rows)
        );

        Ok(ToolResult::success(self.schema().name, output).with_data(json!(bars)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockMarketData;
    use agent_core::AgentError;

    fn mock() -> Arc<dyn MarketDataClient> {
        Arc::new(MockMarketData::new())
    }

    #[tokio::test]
    async fn test_stock_price() {
        let tool = StockPriceTool::new(mock());
        let call = ToolCall::new("get_current_stock_price").arg("symbol", json!("nvda"));

        let result = tool.execute(&call).await.unwrap();
        assert!(result.success);
        assert!(result.output.contains("NVIDIA Corporation (NVDA: 138.25 USD)"));
        assert!(result.output.contains("vs previous close"));
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_execution_error() {
        let tool = StockPriceTool::new(mock());
        let call = ToolCall::new("get_current_stock_price").arg("symbol", json!("ZZZZ"));

        let err = tool.execute(&call).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(ref m) if m.contains("ZZZZ")));
    }

    #[tokio::test]
    async fn test_history_table() {
        let tool = HistoricalPricesTool::new(mock());
        let call = ToolCall::new("get_historical_stock_prices")
            .arg("symbol", json!("AAPL"))
            .arg("period", json!("5d"));

        let result = tool.execute(&call).await.unwrap();
        assert!(result.output.starts_with("AAPL prices (5d, 1d bars)"));
        assert!(result.output.contains("| Date | Open | High | Low | Close | Volume |"));
        // header + separator + 5 bars
        assert_eq!(result.output.lines().filter(|l| l.starts_with('|')).count(), 7);
    }

    #[tokio::test]
    async fn test_history_rejects_unknown_period() {
        let tool = HistoricalPricesTool::new(mock());
        let call = ToolCall::new("get_historical_stock_prices")
            .arg("symbol", json!("AAPL"))
            .arg("period", json!("forever"));

        let err = tool.execute(&call).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));
    }

    #[tokio::test]
    async fn test_blank_symbol() {
        let tool = StockPriceTool::new(mock());
        let call = ToolCall::new("get_current_stock_price").arg("symbol", json!("  "));
        assert!(matches!(
            tool.execute(&call).await,
            Err(AgentError::ToolValidation(_))
        ));
    }
}
