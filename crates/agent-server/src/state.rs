//! Application State

use std::sync::Arc;

use agent_core::LlmProvider;
use market_agents::market::MarketDataClient;
use market_agents::{QueryDispatcher, SuiteConfig};
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Query dispatcher (None when the model provider is not configured)
    pub dispatcher: Option<Arc<QueryDispatcher>>,

    /// LLM provider used by every agent
    pub provider: Option<Arc<dyn LlmProvider>>,

    /// Market-data backend the finance agent reads from
    pub market: Option<Arc<dyn MarketDataClient>>,

    /// Why the query action is disabled, if it is
    pub config_error: Option<String>,

    /// Settings the agents were built with
    pub config: Arc<SuiteConfig>,

    /// Per-process session data
    pub session: Arc<SessionState>,
}

impl AppState {
    pub fn ready(
        dispatcher: QueryDispatcher,
        provider: Arc<dyn LlmProvider>,
        config: SuiteConfig,
    ) -> Self {
        Self {
            dispatcher: Some(Arc::new(dispatcher)),
            provider: Some(provider),
            market: None,
            config_error: None,
            config: Arc::new(config),
            session: Arc::default(),
        }
    }

    /// Server keeps running; only the query action is blocked
    pub fn unconfigured(error: impl Into<String>, config: SuiteConfig) -> Self {
        Self {
            dispatcher: None,
            provider: None,
            market: None,
            config_error: Some(error.into()),
            config: Arc::new(config),
            session: Arc::default(),
        }
    }

    /// Report this backend's reachability on `/health`
    #[must_use]
    pub fn with_market(mut self, market: Arc<dyn MarketDataClient>) -> Self {
        self.market = Some(market);
        self
    }
}

/// Session-scoped values; only the last token estimate today
#[derive(Debug, Default)]
pub struct SessionState {
    token_estimate: RwLock<Option<u32>>,
}

impl SessionState {
    pub async fn token_estimate(&self) -> Option<u32> {
        *self.token_estimate.read().await
    }

    pub async fn record_tokens(&self, tokens: u32) {
        *self.token_estimate.write().await = Some(tokens);
    }
}
