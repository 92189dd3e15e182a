//! # market-agents
//!
//! A web-search agent, a finance agent and a team that leads both, wired to
//! DuckDuckGo and Yahoo Finance through `agent-core` tools.
//!
//! ## Layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                  QueryDispatcher (Mode)                       │
//! │     combined ──────────┬──────────── finance ─── search       │
//! │  ┌──────────────────┐  │   ┌─────────────────┐ ┌───────────┐  │
//! │  │ Market research  │──┼──▶│ Financial agent │ │ Web search│  │
//! │  │ team (delegates) │──┴──────────────────────▶│   agent   │  │
//! │  └──────────────────┘      └────────┬────────┘ └─────┬─────┘  │
//! │                              MarketDataClient   SearchClient  │
//! │                              (Yahoo / Mock)     (DuckDuckGo)  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Which finance tools exist is decided by a `Capabilities` bitmask; which
//! tool the model picks is up to the model.

pub mod capability;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod market;
pub mod model;
pub mod search;
pub mod suite;
pub mod svckit;

pub use capability::{Capabilities, FinanceCapability};
pub use config::{MarketBackend, SuiteConfig};
pub use dispatch::{DispatchOutcome, Mode, QueryDispatcher};
pub use error::{MarketError, Result};
pub use suite::{AgentSuite, market_client, search_client};

pub const SEARCH_AGENT_NAME: &str = "Web search agent";
pub const SEARCH_AGENT_ROLE: &str = "Search the web for the information";
pub const SEARCH_INSTRUCTIONS: &[&str] = &["Always include sources"];

pub const FINANCE_AGENT_NAME: &str = "Financial agent";
pub const FINANCE_INSTRUCTIONS: &[&str] = &["Use tables to display data"];

pub const TEAM_NAME: &str = "Market research team";
pub const TEAM_INSTRUCTIONS: &[&str] = &["Always include sources", "Use tables to display the data"];

/// Canned prompts offered by the UI and CLI
pub const EXAMPLE_PROMPTS: &[&str] = &[
    "Summarize analyst recommendation and share the latest news for Meta",
    "Compare the fundamentals of NVDA and AMD in a table",
    "What is the current stock price of Apple and how has it moved over the last month?",
    "Find recent news about Tesla's earnings and include sources",
];

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use agent_core::message::Message;
    use agent_core::provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo};
    use agent_core::{AgentError, AgentResponse, QueryRequest, Responder, ToolCallRecord};
    use async_trait::async_trait;

    use crate::model::SearchHit;
    use crate::search::SearchClient;

    /// Provider that replays scripted completions in order
    pub struct ScriptedProvider {
        replies: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|s| (*s).to_string()).collect()),
            }
        }

        pub fn remaining(&self) -> usize {
            self.replies.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn info(&self) -> agent_core::Result<ProviderInfo> {
            Ok(ProviderInfo { name: "scripted".into(), endpoint: String::new(), models: vec![] })
        }

        async fn health_check(&self) -> agent_core::Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> agent_core::Result<Completion> {
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AgentError::Provider("script exhausted".into()))?;
            Ok(Completion {
                content,
                model: options.model.clone(),
                usage: None,
                truncated: false,
                finish_reason: None,
            })
        }

        async fn list_models(&self) -> agent_core::Result<Vec<ModelInfo>> {
            Ok(vec![])
        }
    }

    /// Facade stub that records every request it receives
    pub struct StubResponder {
        name: &'static str,
        reply: String,
        tool_calls: Vec<ToolCallRecord>,
        error: Mutex<Option<AgentError>>,
        requests: Mutex<Vec<QueryRequest>>,
    }

    impl StubResponder {
        pub fn answering(name: &'static str, reply: &str) -> Self {
            Self {
                name,
                reply: reply.into(),
                tool_calls: Vec::new(),
                error: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(name: &'static str, error: AgentError) -> Self {
            let stub = Self::answering(name, "");
            *stub.error.lock().unwrap() = Some(error);
            stub
        }

        pub fn with_tool_call(mut self, call: &str, tool: &str) -> Self {
            self.tool_calls.push(ToolCallRecord {
                agent: self.name.into(),
                call: call.into(),
                tool: tool.into(),
                success: true,
            });
            self
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn queries(&self) -> Vec<String> {
            self.requests.lock().unwrap().iter().map(|r| r.query.clone()).collect()
        }

        pub fn max_tokens(&self) -> Vec<Option<u32>> {
            self.requests.lock().unwrap().iter().map(|r| r.max_tokens).collect()
        }
    }

    #[async_trait]
    impl Responder for StubResponder {
        fn name(&self) -> &str {
            self.name
        }

        async fn respond(&self, request: &QueryRequest) -> agent_core::Result<AgentResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(error) = self.error.lock().unwrap().take() {
                return Err(error);
            }
            let mut response = AgentResponse::new(self.reply.clone(), "stub-model");
            response.tool_calls.clone_from(&self.tool_calls);
            Ok(response)
        }
    }

    /// Search backend returning `n` numbered hits
    pub struct StaticSearch {
        hits: usize,
        queries: Mutex<Vec<(String, usize)>>,
    }

    impl StaticSearch {
        pub fn with_hits(hits: usize) -> Self {
            Self { hits, queries: Mutex::new(Vec::new()) }
        }

        pub fn queries(&self) -> Vec<(String, usize)> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchClient for StaticSearch {
        async fn search(&self, query: &str, max_results: usize) -> crate::Result<Vec<SearchHit>> {
            self.queries.lock().unwrap().push((query.to_string(), max_results));
            Ok((0..self.hits.min(max_results))
                .map(|i| SearchHit {
                    title: format!("Result {i} for {query}"),
                    url: format!("https://example.com/{i}"),
                    snippet: format!("Snippet {i}"),
                })
                .collect())
        }

        fn name(&self) -> &str {
            "static"
        }
    }
}
