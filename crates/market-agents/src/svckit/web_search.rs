//! Web Search Tool

use std::fmt::Write as _;
use std::sync::Arc;

use agent_core::{AgentError, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};
use async_trait::async_trait;
use serde_json::json;

use crate::search::SearchClient;

pub const TOOL_NAME: &str = "duckduckgo_search";

const MAX_RESULTS_CAP: usize = 10;

/// Tool for searching the web; every hit is reported with its source URL
pub struct WebSearchTool {
    client: Arc<dyn SearchClient>,
    default_max_results: usize,
}

impl WebSearchTool {
    pub fn new(client: Arc<dyn SearchClient>, default_max_results: usize) -> Self {
        Self {
            client,
            default_max_results: default_max_results.clamp(1, MAX_RESULTS_CAP),
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: TOOL_NAME.into(),
            description: "Search the web with DuckDuckGo. Returns titles, snippets and source URLs for the top results.".into(),
            parameters: vec![
                ParameterSchema::required("query", "string", "The search query"),
                ParameterSchema::optional(
                    "max_results",
                    "integer",
                    "Maximum number of results to return",
                    json!(self.default_max_results),
                ),
            ],
            category: Some("search".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call
            .str_arg("query")
            .ok_or_else(|| AgentError::ToolValidation("query must not be empty".into()))?;

        let max_results = call
            .u64_arg("max_results")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(self.default_max_results)
            .clamp(1, MAX_RESULTS_CAP);

        let hits = self.client.search(query, max_results).await?;
        tracing::debug!(query, hits = hits.len(), "Web search finished");

        if hits.is_empty() {
            return Ok(ToolResult::success(TOOL_NAME, format!("No results found for: {query}")));
        }

        let mut output = String::new();
        for (i, hit) in hits.iter().enumerate() {
            let _ = writeln!(output, "{}. {}", i + 1, hit.title);
            if !hit.snippet.is_empty() {
                let _ = writeln!(output, "   {}", hit.snippet);
            }
            let _ = writeln!(output, "   Source: {}\n", hit.url);
        }

        Ok(ToolResult::success(TOOL_NAME, output.trim_end()).with_data(json!(hits)))
    }
}
