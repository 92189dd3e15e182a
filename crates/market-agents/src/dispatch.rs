//! Query Dispatcher
//!
//! Routes a question to one of the three facades and turns every result,
//! including failures, into a `DispatchOutcome`. Requests are serialized:
//! only one facade call is in flight at a time.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use agent_core::{AgentResponse, QueryRequest, Responder};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Which facade answers the query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Team of both agents
    #[default]
    #[serde(rename = "combined")]
    Combined,
    #[serde(rename = "finance")]
    FinanceOnly,
    #[serde(rename = "search")]
    SearchOnly,
}

impl Mode {
    pub const ALL: [Self; 3] = [Self::Combined, Self::FinanceOnly, Self::SearchOnly];

    pub const fn id(self) -> &'static str {
        match self {
            Self::Combined => "combined",
            Self::FinanceOnly => "finance",
            Self::SearchOnly => "search",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Combined => "Combined",
            Self::FinanceOnly => "Finance only",
            Self::SearchOnly => "Web search only",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Combined => "A team leader that delegates to the web search and finance agents",
            Self::FinanceOnly => "Market data: prices, fundamentals, analyst ratings, news and history",
            Self::SearchOnly => "DuckDuckGo web search with sources",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.id() == wanted)
            .ok_or_else(|| format!("unknown mode '{s}' (expected combined, finance or search)"))
    }
}

/// Result of one dispatch
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The facade answered; `rendered` is the display text
    Answered {
        mode: Mode,
        response: AgentResponse,
        rendered: String,
    },

    /// Input was rejected before any facade was called
    Rejected { warning: String },

    /// The facade call failed; `message` is safe to show to the user
    Failed {
        mode: Mode,
        message: String,
        retryable: bool,
    },
}

impl DispatchOutcome {
    pub const fn is_answered(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }

    /// Text to display, whatever the outcome
    pub fn display_text(&self) -> &str {
        match self {
            Self::Answered { rendered, .. } => rendered,
            Self::Rejected { warning } => warning,
            Self::Failed { message, .. } => message,
        }
    }
}

pub const EMPTY_QUERY_WARNING: &str = "Please enter a question before submitting.";

/// Sends queries to the facade selected by `Mode`
pub struct QueryDispatcher {
    combined: Arc<dyn Responder>,
    finance: Arc<dyn Responder>,
    search: Arc<dyn Responder>,
    in_flight: Mutex<()>,
    show_tool_calls: bool,
}

impl QueryDispatcher {
    pub fn new(
        combined: Arc<dyn Responder>,
        finance: Arc<dyn Responder>,
        search: Arc<dyn Responder>,
    ) -> Self {
        Self {
            combined,
            finance,
            search,
            in_flight: Mutex::new(()),
            show_tool_calls: true,
        }
    }

    #[must_use]
    pub const fn with_show_tool_calls(mut self, show: bool) -> Self {
        self.show_tool_calls = show;
        self
    }

    pub fn facade(&self, mode: Mode) -> &Arc<dyn Responder> {
        match mode {
            Mode::Combined => &self.combined,
            Mode::FinanceOnly => &self.finance,
            Mode::SearchOnly => &self.search,
        }
    }

    /// Whether a request is currently in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Run one query; never returns an error
    pub async fn dispatch(&self, mode: Mode, request: &QueryRequest) -> DispatchOutcome {
        if request.is_blank() {
            tracing::warn!(%mode, "Rejected empty query");
            return DispatchOutcome::Rejected {
                warning: EMPTY_QUERY_WARNING.into(),
            };
        }

        let _guard = self.in_flight.lock().await;
        let facade = self.facade(mode);
        let started = Instant::now();

        tracing::info!(%mode, facade = facade.name(), "Dispatching query");

        match facade.respond(request).await {
            Ok(response) => {
                tracing::info!(
                    %mode,
                    elapsed_ms = started.elapsed().as_millis(),
                    tools = ?response.tools_used(),
                    "Query answered"
                );
                let rendered = response.render(self.show_tool_calls);
                DispatchOutcome::Answered { mode, response, rendered }
            }
            Err(e) => {
                tracing::error!(
                    %mode,
                    elapsed_ms = started.elapsed().as_millis(),
                    retryable = e.is_retryable(),
                    "Query failed: {}",
                    e
                );
                DispatchOutcome::Failed {
                    mode,
                    message: e.user_message(),
                    retryable: e.is_retryable(),
                }
            }
        }
    }
}
