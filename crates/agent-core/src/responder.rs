//! Agent Facade
//!
//! The boundary every caller talks to: a query goes in, a typed response
//! comes out. How the answer was produced (reasoning steps, tool order,
//! delegation) stays behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::error::Result;
use crate::provider::TokenUsage;

/// A user question plus per-request limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,

    /// Upper bound on generated tokens; falls back to the agent's default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_tokens: None,
        }
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Blank or whitespace-only queries carry no question
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// One external tool invocation made while answering
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Agent that issued the call
    pub agent: String,

    /// Rendered call, e.g. `get_current_stock_price(symbol=META)`
    pub call: String,

    /// Tool name alone
    pub tool: String,

    pub success: bool,
}

/// Answer produced by a facade
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Final answer text (markdown)
    pub content: String,

    /// Model that produced the final answer
    pub model: String,

    /// Tool calls in the order they ran, including delegated ones
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,

    /// Token usage summed over all completions (if reported)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl AgentResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            tool_calls: Vec::new(),
            usage: None,
        }
    }

    /// Distinct tool names used, in first-use order
    pub fn tools_used(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.tool_calls {
            if !seen.contains(&record.tool.as_str()) {
                seen.push(&record.tool);
            }
        }
        seen
    }

    /// Display text; with `show_tool_calls` the calls are listed first
    pub fn render(&self, show_tool_calls: bool) -> String {
        if !show_tool_calls || self.tool_calls.is_empty() {
            return self.content.clone();
        }

        let mut out = String::from("Running:\n");
        for record in &self.tool_calls {
            let _ = writeln!(out, " - {}", record.call);
        }
        out.push('\n');
        out.push_str(&self.content);
        out
    }
}

/// Facade trait: anything that can answer a query
#[async_trait]
pub trait Responder: Send + Sync {
    /// Display name, e.g. "Financial agent"
    fn name(&self) -> &str;

    /// Short role description used when this responder joins a team
    fn role(&self) -> Option<&str> {
        None
    }

    /// Names of the tools this responder can call
    fn tool_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Answer a query
    async fn respond(&self, request: &QueryRequest) -> Result<AgentResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tool: &str, call: &str) -> ToolCallRecord {
        ToolCallRecord {
            agent: "Financial agent".into(),
            call: call.into(),
            tool: tool.into(),
            success: true,
        }
    }

    #[test]
    fn test_blank_queries() {
        assert!(QueryRequest::new("").is_blank());
        assert!(QueryRequest::new(" \n\t ").is_blank());
        assert!(!QueryRequest::new("news for META").is_blank());
    }

    #[test]
    fn test_render_lists_tool_calls_then_content() {
        let mut response = AgentResponse::new("| Symbol | Price |", "llama-3.3-70b-versatile");
        response.tool_calls.push(record(
            "get_current_stock_price",
            "get_current_stock_price(symbol=META)",
        ));

        let rendered = response.render(true);
        assert!(rendered.starts_with("Running:\n - get_current_stock_price(symbol=META)"));
        assert!(rendered.ends_with("| Symbol | Price |"));
        assert_eq!(response.render(false), "| Symbol | Price |");
    }

    #[test]
    fn test_tools_used_deduplicates() {
        let mut response = AgentResponse::new("ok", "m");
        response.tool_calls.push(record("get_company_news", "get_company_news(symbol=META)"));
        response.tool_calls.push(record("get_company_news", "get_company_news(symbol=AAPL)"));
        response.tool_calls.push(record("duckduckgo_search", "duckduckgo_search(query=x)"));
        assert_eq!(response.tools_used(), vec!["get_company_news", "duckduckgo_search"]);
    }
}
