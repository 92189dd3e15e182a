//! Suite configuration
//!
//! Built once at startup from environment variables and handed to
//! `AgentSuite::build`.

use std::fmt;
use std::str::FromStr;

use agent_core::provider::DEFAULT_MODEL;
use agent_core::{AgentError, Result};

use crate::capability::Capabilities;

/// Which market-data backend the finance agent uses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarketBackend {
    #[default]
    Yahoo,
    Mock,
}

impl FromStr for MarketBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown market data backend '{other}' (expected yahoo or mock)")),
        }
    }
}

impl fmt::Display for MarketBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yahoo => "yahoo",
            Self::Mock => "mock",
        })
    }
}

/// Parameters shared by every agent in the suite
#[derive(Clone, Debug, PartialEq)]
pub struct SuiteConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub capabilities: Capabilities,
    pub market_data: MarketBackend,
    pub search_max_results: usize,
    pub max_iterations: usize,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            max_tokens: 2048,
            temperature: 0.7,
            capabilities: Capabilities::all(),
            market_data: MarketBackend::default(),
            search_max_results: 5,
            max_iterations: 10,
        }
    }
}

impl SuiteConfig {
    /// Read `MODEL_ID`, `MAX_TOKENS`, `TEMPERATURE`, `FINANCE_FEATURES`,
    /// `MARKET_DATA`, `SEARCH_MAX_RESULTS` and `AGENT_MAX_ITERATIONS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(model) = get("MODEL_ID") {
            config.model = model;
        }
        if let Some(raw) = get("MAX_TOKENS") {
            config.max_tokens = parse(&raw, "MAX_TOKENS")?;
        }
        if let Some(raw) = get("TEMPERATURE") {
            config.temperature = parse(&raw, "TEMPERATURE")?;
        }
        if let Some(raw) = get("FINANCE_FEATURES") {
            config.capabilities = parse(&raw, "FINANCE_FEATURES")?;
        }
        if let Some(raw) = get("MARKET_DATA") {
            config.market_data = parse(&raw, "MARKET_DATA")?;
        }
        if let Some(raw) = get("SEARCH_MAX_RESULTS") {
            config.search_max_results = parse(&raw, "SEARCH_MAX_RESULTS")?;
        }
        if let Some(raw) = get("AGENT_MAX_ITERATIONS") {
            config.max_iterations = parse(&raw, "AGENT_MAX_ITERATIONS")?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(AgentError::Config("MAX_TOKENS must be greater than zero".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::Config(format!(
                "TEMPERATURE must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if self.search_max_results == 0 {
            return Err(AgentError::Config("SEARCH_MAX_RESULTS must be at least 1".into()));
        }
        if self.max_iterations == 0 {
            return Err(AgentError::Config("AGENT_MAX_ITERATIONS must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse<T>(raw: &str, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse()
        .map_err(|e| AgentError::Config(format!("{key}: invalid value '{raw}': {e}")))
}
