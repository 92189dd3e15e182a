//! API Client

use serde::{Deserialize, Serialize};

/// One selectable mode, as listed by `/api/modes`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ModeInfo {
    pub id: String,
    pub label: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModesResponse {
    pub modes: Vec<ModeInfo>,
    pub examples: Vec<String>,
    pub default_max_tokens: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ToolCallRecord {
    pub agent: String,
    pub call: String,
    pub tool: String,
    pub success: bool,
}

/// Successful answer from `/api/query`
#[derive(Clone, Debug, Deserialize)]
pub struct Answer {
    pub content: String,
    pub mode: String,
    pub model: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub token_estimate: u32,
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    query: &'a str,
    mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Why a query produced no answer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// Input rejected before any agent ran
    Warning(String),
    /// Configuration or provider failure
    Failure(String),
}

fn endpoint(path: &str) -> String {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into());
    format!("{origin}{path}")
}

/// Modes, example prompts and the default response length
pub async fn fetch_modes() -> Result<ModesResponse, String> {
    let response = reqwest::get(endpoint("/api/modes"))
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        Err(format!("Failed to load modes ({})", response.status()))
    }
}

/// Send one query to the selected mode
pub async fn send_query(query: &str, mode: &str, max_tokens: Option<u32>) -> Result<Answer, QueryError> {
    let response = reqwest::Client::new()
        .post(endpoint("/api/query"))
        .json(&QueryBody { query, mode, max_tokens })
        .send()
        .await
        .map_err(|e| QueryError::Failure(e.to_string()))?;

    if response.status().is_success() {
        return response
            .json()
            .await
            .map_err(|e| QueryError::Failure(e.to_string()));
    }

    let data: serde_json::Value = response.json().await.unwrap_or_default();
    let message = data["error"].as_str().unwrap_or("Request failed").to_string();
    match data["code"].as_str() {
        Some("EMPTY_QUERY" | "INVALID_INPUT") => Err(QueryError::Warning(message)),
        _ => Err(QueryError::Failure(message)),
    }
}
