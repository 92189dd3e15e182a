//! Agent Suite
//!
//! The three facades: a web-search agent, a finance agent and the team
//! that leads both.

use std::sync::Arc;

use agent_core::{Agent, AgentBuilder, LlmProvider, Responder, Result};

use crate::config::{MarketBackend, SuiteConfig};
use crate::dispatch::QueryDispatcher;
use crate::market::{MarketDataClient, MockMarketData, YahooFinanceClient};
use crate::search::{DuckDuckGoClient, SearchClient};
use crate::svckit::{WebSearchTool, finance_tools};
use crate::{
    FINANCE_AGENT_NAME, FINANCE_INSTRUCTIONS, SEARCH_AGENT_NAME, SEARCH_AGENT_ROLE,
    SEARCH_INSTRUCTIONS, TEAM_INSTRUCTIONS, TEAM_NAME,
};

/// Market-data client for the configured backend
pub fn market_client(backend: MarketBackend) -> Result<Arc<dyn MarketDataClient>> {
    let client: Arc<dyn MarketDataClient> = match backend {
        MarketBackend::Yahoo => Arc::new(YahooFinanceClient::new()?),
        MarketBackend::Mock => Arc::new(MockMarketData::new()),
    };
    Ok(client)
}

/// Default web search backend
pub fn search_client() -> Result<Arc<dyn SearchClient>> {
    let client: Arc<dyn SearchClient> = Arc::new(DuckDuckGoClient::new()?);
    Ok(client)
}

/// Web search, finance and team agents sharing one provider
pub struct AgentSuite {
    pub web_search: Arc<Agent>,
    pub finance: Arc<Agent>,
    pub team: Arc<Agent>,
}

impl AgentSuite {
    pub fn build(
        config: &SuiteConfig,
        provider: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchClient>,
        market: Arc<dyn MarketDataClient>,
    ) -> Result<Self> {
        config.validate()?;

        let base = || {
            AgentBuilder::new()
                .provider(Arc::clone(&provider))
                .model(config.model.clone())
                .max_tokens(config.max_tokens)
                .temperature(config.temperature)
                .max_iterations(config.max_iterations)
                .show_tool_calls(true)
                .markdown(true)
        };

        let mut web_search = base()
            .name(SEARCH_AGENT_NAME)
            .role(SEARCH_AGENT_ROLE)
            .tool(WebSearchTool::new(search, config.search_max_results));
        for instruction in SEARCH_INSTRUCTIONS {
            web_search = web_search.instruction(*instruction);
        }
        let web_search = Arc::new(web_search.build()?);

        let mut finance = base()
            .name(FINANCE_AGENT_NAME)
            .shared_tools(finance_tools(&market, config.capabilities));
        for instruction in FINANCE_INSTRUCTIONS {
            finance = finance.instruction(*instruction);
        }
        let finance = Arc::new(finance.build()?);

        let mut team = base()
            .name(TEAM_NAME)
            .member(Arc::clone(&web_search) as Arc<dyn Responder>)
            .member(Arc::clone(&finance) as Arc<dyn Responder>);
        for instruction in TEAM_INSTRUCTIONS {
            team = team.instruction(*instruction);
        }
        let team = Arc::new(team.build()?);

        tracing::info!(
            model = %config.model,
            finance_features = %config.capabilities,
            market = market.name(),
            "Agent suite ready"
        );

        Ok(Self { web_search, finance, team })
    }

    /// Dispatcher over the three facades
    pub fn dispatcher(&self) -> QueryDispatcher {
        QueryDispatcher::new(
            Arc::clone(&self.team) as Arc<dyn Responder>,
            Arc::clone(&self.finance) as Arc<dyn Responder>,
            Arc::clone(&self.web_search) as Arc<dyn Responder>,
        )
    }
}
