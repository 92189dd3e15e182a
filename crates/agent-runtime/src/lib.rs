//! # agent-runtime
//!
//! Runtime providers for the market-agents system.
//!
//! ## Providers
//!
//! - **Groq** (default): hosted Llama models via Groq's OpenAI-compatible API.
//!   Setting `GROQ_BASE_URL` points the same client at any other
//!   OpenAI-compatible endpoint.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::GroqProvider;
//!
//! let provider = GroqProvider::from_env()?; // fails fast if GROQ_API_KEY is unset
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

#[cfg(feature = "groq")]
pub mod groq;

#[cfg(feature = "groq")]
pub use groq::{GroqConfig, GroqProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, AgentResponse, LlmProvider, Message, QueryRequest, Responder, Result,
    Role, Tool, ToolRegistry,
};
