//! # agent-core
//!
//! Agent facade with a provider-agnostic LLM abstraction, a tool registry and
//! team delegation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Responder (facade)                      │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌────────────────┐  │
//! │  │  Reasoning  │  │  Tools Registry  │  │  LlmProvider   │  │
//! │  │    Loop     │──│ (+ team members) │──│  (Strategy)    │  │
//! │  └─────────────┘  └──────────────────┘  └────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers only see `Responder::respond`; which tools ran and in what order is
//! reported back in the `AgentResponse` but never steered from outside.

pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod responder;
pub mod team;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Message, Role};
pub use provider::{GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use responder::{AgentResponse, QueryRequest, Responder, ToolCallRecord};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
