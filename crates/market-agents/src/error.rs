//! Error Types for search and market-data backends

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarketError>;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("No {what} available for {symbol}")]
    NoData { what: &'static str, symbol: String },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unsupported {field}: {value}")]
    Unsupported { field: &'static str, value: String },

    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<MarketError> for AgentError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Unsupported { .. } => Self::ToolValidation(err.to_string()),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}
