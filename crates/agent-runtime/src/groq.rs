//! Groq LLM Provider
//!
//! Implementation of `LlmProvider` for Groq's OpenAI-compatible chat
//! completions API. Any endpoint speaking the same wire format works by
//! overriding the base URL.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
        TokenUsage,
    },
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Groq's OpenAI-compatible API root
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq provider configuration
#[derive(Clone)]
pub struct GroqConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// API root, without the trailing `/chat/completions`
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GroqConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GroqConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 120,
        }
    }

    /// Read `GROQ_API_KEY`, `GROQ_BASE_URL` and `GROQ_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GROQ_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AgentError::Config("GROQ_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup("GROQ_BASE_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = base_url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("GROQ_TIMEOUT_SECS") {
            config.timeout_secs = raw.trim().parse().map_err(|_| {
                AgentError::Config(format!("GROQ_TIMEOUT_SECS must be a whole number, got '{raw}'"))
            })?;
        }

        Ok(config)
    }
}

// Wire format (OpenAI chat completions subset)

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "no_stop_sequences")]
    stop: &'a [String],
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_stop_sequences(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ApiModel>,
}

#[derive(Debug, Deserialize)]
struct ApiModel {
    id: String,
    owned_by: Option<String>,
    context_window: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Groq LLM provider
pub struct GroqProvider {
    client: reqwest::Client,
    config: GroqConfig,
}

impl GroqProvider {
    /// Create from configuration; fails only if the HTTP client cannot be built
    pub fn from_config(config: GroqConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables; a missing key is a configuration
    /// error raised before any request is made
    pub fn from_env() -> Result<Self> {
        Self::from_config(GroqConfig::from_env()?)
    }

    pub fn config(&self) -> &GroqConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    const fn role_name(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            // Tool output is fed back as user context; the text protocol has no tool_call ids
            Role::Tool => "user",
        }
    }

    fn convert_messages(messages: &[Message]) -> Vec<ApiMessage<'_>> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: Self::role_name(m.role),
                content: &m.content,
            })
            .collect()
    }

    fn convert_completion(response: ChatResponse, requested_model: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("completion has no choices".into()))?;

        let finish_reason = choice.finish_reason.as_deref().map(FinishReason::from_api);

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: response.model.unwrap_or_else(|| requested_model.to_string()),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            truncated: finish_reason == Some(FinishReason::Length),
            finish_reason,
        })
    }

    /// Map a non-success HTTP status to the agent error taxonomy
    fn status_error(status: StatusCode, body: &str) -> AgentError {
        let message = serde_json::from_str::<ApiErrorEnvelope>(body)
            .map_or_else(|_| body.trim().to_string(), |e| e.error.message);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(message),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(message),
            s if s.is_server_error() => AgentError::ProviderUnavailable(format!("{s}: {message}")),
            s => AgentError::Provider(format!("{s}: {message}")),
        }
    }

    fn transport_error(err: &reqwest::Error) -> AgentError {
        if err.is_timeout() || err.is_connect() {
            AgentError::ProviderUnavailable(err.to_string())
        } else {
            AgentError::Provider(err.to_string())
        }
    }

    async fn get_models(&self) -> Result<ModelsResponse> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &body));
        }

        response
            .json::<ModelsResponse>()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Groq".into(),
            endpoint: self.config.base_url.clone(),
            models,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.get_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Groq health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = ChatRequest {
            model: &options.model,
            messages: Self::convert_messages(messages),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stop: &options.stop_sequences,
        };

        tracing::debug!(model = %options.model, messages = messages.len(), "Requesting completion");

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &body));
        }

        let body = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        Self::convert_completion(body, &options.model)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(self
            .get_models()
            .await?
            .data
            .into_iter()
            .map(|m| ModelInfo {
                id: m.id,
                owned_by: m.owned_by,
                context_length: m.context_window,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn provider_for(server: &mockito::ServerGuard) -> GroqProvider {
        let mut config = GroqConfig::new("test-key");
        config.base_url = server.url();
        GroqProvider::from_config(config).unwrap()
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = GroqConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, AgentError::Config(ref msg) if msg.contains("GROQ_API_KEY")));

        let blank = GroqConfig::from_lookup(|k| (k == "GROQ_API_KEY").then(|| "  ".to_string()));
        assert!(matches!(blank, Err(AgentError::Config(_))));
    }

    #[test]
    fn test_config_overrides() {
        let config = GroqConfig::from_lookup(|k| match k {
            "GROQ_API_KEY" => Some("gsk_abc".into()),
            "GROQ_BASE_URL" => Some("http://localhost:8080/v1/".into()),
            "GROQ_TIMEOUT_SECS" => Some("30".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.timeout_secs, 30);
        assert!(!format!("{config:?}").contains("gsk_abc"));
    }

    #[test]
    fn test_bad_timeout_is_config_error() {
        let err = GroqConfig::from_lookup(|k| match k {
            "GROQ_API_KEY" => Some("k".into()),
            "GROQ_TIMEOUT_SECS" => Some("soon".into()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            Message::system("You are helpful."),
            Message::user("Hello"),
            Message::tool("duckduckgo_search", "[Tool 'duckduckgo_search' returned]", None),
        ];

        let converted = GroqProvider::convert_messages(&messages);
        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[2].role, "user");
    }

    #[tokio::test]
    async fn test_complete_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "max_tokens": 128
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"model":"llama-3.3-70b-versatile","choices":[{"index":0,"message":{"role":"assistant","content":"Hello there"},"finish_reason":"stop"}],"usage":{"prompt_tokens":12,"completion_tokens":3,"total_tokens":15}}"#,
            )
            .create_async()
            .await;

        let provider = provider_for(&server);
        let options = GenerationOptions { max_tokens: 128, ..Default::default() };
        let completion = provider.complete(&[Message::user("Hi")], &options).await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.content, "Hello there");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.unwrap().total_tokens, 15);
        assert!(!completion.truncated);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached for model","type":"tokens"}}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let err = provider
            .complete(&[Message::user("Hi")], &GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::RateLimited(ref m) if m.contains("Rate limit reached")));
    }

    #[tokio::test]
    async fn test_invalid_key_maps_to_auth() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Invalid API Key"}}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let err = provider
            .complete(&[Message::user("Hi")], &GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Auth(_)));
    }

    #[tokio::test]
    async fn test_health_check_and_models() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"object":"list","data":[{"id":"llama-3.3-70b-versatile","object":"model","owned_by":"Meta","context_window":131072}]}"#,
            )
            .expect_at_least(1)
            .create_async()
            .await;

        let provider = provider_for(&server);
        assert!(provider.health_check().await.unwrap());

        let models = provider.list_models().await.unwrap();
        assert_eq!(models[0].id, "llama-3.3-70b-versatile");
        assert_eq!(models[0].context_length, Some(131_072));
    }

    #[tokio::test]
    async fn test_health_check_false_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/models").with_status(503).create_async().await;

        let provider = provider_for(&server);
        assert!(!provider.health_check().await.unwrap());
    }
}
