//! HTTP Handlers

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use agent_core::{AgentResponse, QueryRequest, ToolCallRecord};
use market_agents::{DispatchOutcome, EXAMPLE_PROMPTS, Mode, dispatch::EMPTY_QUERY_WARNING};

use crate::state::AppState;

/// Largest `max_tokens` a client may request
pub const MAX_TOKENS_LIMIT: u32 = 8192;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider_connected: bool,
    pub market_data_connected: bool,
    pub credentials_configured: bool,
    pub token_estimate: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeInfo {
    pub id: Mode,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModesResponse {
    pub modes: Vec<ModeInfo>,
    pub examples: Vec<String>,
    pub default_max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct QueryBody {
    pub query: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Answer text exactly as the facade produced it
    pub content: String,
    /// Display text (tool calls listed first)
    pub rendered: String,
    pub mode: Mode,
    pub model: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub token_estimate: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token_estimate: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Whether sending the same query again may succeed
    #[serde(default)]
    pub retryable: bool,
}

/// Failures surfaced by the query endpoint
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("{0}")]
    EmptyQuery(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{message}")]
    Provider { message: String, retryable: bool },
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::EmptyQuery(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Provider { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "CONFIG_ERROR",
            Self::EmptyQuery(_) => "EMPTY_QUERY",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Provider { .. } => "PROVIDER_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().into(),
            retryable: matches!(self, Self::Provider { retryable: true, .. }),
        };
        (self.status(), Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = match &state.provider {
        Some(provider) => provider.health_check().await.unwrap_or(false),
        None => false,
    };
    let market_data_connected = match &state.market {
        Some(market) => market.health_check().await,
        None => false,
    };

    Json(HealthResponse {
        status: if state.config_error.is_some() { "degraded" } else { "healthy" }.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        provider_connected,
        market_data_connected,
        credentials_configured: state.config_error.is_none(),
        token_estimate: state.session.token_estimate().await,
    })
}

/// Modes and canned example prompts for the form
pub async fn list_modes(State(state): State<AppState>) -> Json<ModesResponse> {
    Json(ModesResponse {
        modes: Mode::ALL
            .into_iter()
            .map(|mode| ModeInfo {
                id: mode,
                label: mode.label().into(),
                description: mode.description().into(),
            })
            .collect(),
        examples: EXAMPLE_PROMPTS.iter().map(|p| (*p).to_string()).collect(),
        default_max_tokens: state.config.max_tokens,
    })
}

/// Run one query through the selected facade
pub async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryBody>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::warn!("Malformed query body: {}", rejection.body_text());
        ApiError::InvalidInput(rejection.body_text())
    })?;
    let mut request = QueryRequest::new(payload.query);
    if let Some(max_tokens) = payload.max_tokens {
        if max_tokens == 0 || max_tokens > MAX_TOKENS_LIMIT {
            return Err(ApiError::InvalidInput(format!(
                "max_tokens must be between 1 and {MAX_TOKENS_LIMIT}"
            )));
        }
        request = request.with_max_tokens(max_tokens);
    }

    let Some(dispatcher) = &state.dispatcher else {
        if request.is_blank() {
            return Err(ApiError::EmptyQuery(EMPTY_QUERY_WARNING.into()));
        }
        let reason = state
            .config_error
            .clone()
            .unwrap_or_else(|| "The agent is not configured.".into());
        tracing::warn!("Query refused: {}", reason);
        return Err(ApiError::NotConfigured(reason));
    };

    match dispatcher.dispatch(payload.mode, &request).await {
        DispatchOutcome::Answered { mode, response, rendered } => {
            let token_estimate = estimate_tokens(&request, &response);
            state.session.record_tokens(token_estimate).await;

            Ok(Json(QueryResponse {
                content: response.content,
                rendered,
                mode,
                model: response.model,
                tool_calls: response.tool_calls,
                token_estimate,
            }))
        }
        DispatchOutcome::Rejected { warning } => Err(ApiError::EmptyQuery(warning)),
        DispatchOutcome::Failed { message, retryable, .. } => {
            Err(ApiError::Provider { message, retryable })
        }
    }
}

/// Cached token estimate of the last answered query
pub async fn session_handler(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        token_estimate: state.session.token_estimate().await,
    })
}

/// Reported usage when the provider gives it, else ~4 characters per token
fn estimate_tokens(request: &QueryRequest, response: &AgentResponse) -> u32 {
    response.usage.map_or_else(
        || {
            let chars = request.query.len() + response.content.len();
            u32::try_from(chars.div_ceil(4)).unwrap_or(u32::MAX)
        },
        |usage| usage.total_tokens,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::provider::TokenUsage;

    #[test]
    fn test_api_error_codes() {
        assert_eq!(ApiError::NotConfigured("x".into()).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::EmptyQuery("x".into()).code(), "EMPTY_QUERY");
        let provider = ApiError::Provider { message: "down".into(), retryable: true };
        assert_eq!(provider.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(provider.code(), "PROVIDER_ERROR");
    }

    #[test]
    fn test_estimate_prefers_reported_usage() {
        let request = QueryRequest::new("12345678");
        let mut response = AgentResponse::new("1234", "m");
        assert_eq!(estimate_tokens(&request, &response), 3);

        response.usage = Some(TokenUsage { prompt_tokens: 40, completion_tokens: 2, total_tokens: 42 });
        assert_eq!(estimate_tokens(&request, &response), 42);
    }
}
