//! # agent-server
//!
//! Axum server and one-shot CLI for the market research agents.
//!
//! Both binaries share the same start-up path: load `.env`, read
//! `SuiteConfig`, connect the Groq provider and build the agent suite. A
//! missing `GROQ_API_KEY` does not stop the server; it only disables the
//! query endpoint.

pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentError, LlmProvider};
use agent_runtime::GroqProvider;
use market_agents::market::MarketDataClient;
use market_agents::{AgentSuite, QueryDispatcher, SuiteConfig, market_client, search_client};

pub use state::AppState;

/// Install the global subscriber; `RUST_LOG` overrides `default_filter`
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Provider plus dispatcher, ready to answer queries
pub struct Wiring {
    pub provider: Arc<dyn LlmProvider>,
    pub market: Arc<dyn MarketDataClient>,
    pub dispatcher: QueryDispatcher,
}

/// Connect the provider and build the suite; fails before any network call
/// when the credential is missing
pub fn connect(config: &SuiteConfig) -> agent_core::Result<Wiring> {
    let provider: Arc<dyn LlmProvider> = Arc::new(GroqProvider::from_env()?);
    let market = market_client(config.market_data)?;
    let suite = AgentSuite::build(
        config,
        Arc::clone(&provider),
        search_client()?,
        Arc::clone(&market),
    )?;

    Ok(Wiring {
        provider,
        market,
        dispatcher: suite.dispatcher(),
    })
}

/// Like `bootstrap`, but a config that failed to parse also leaves the
/// server running with queries disabled
pub fn bootstrap_from(config: agent_core::Result<SuiteConfig>) -> AppState {
    match config {
        Ok(config) => bootstrap(config),
        Err(e) => {
            tracing::warn!("⚠ Invalid configuration: {}", e);
            AppState::unconfigured(e.user_message(), SuiteConfig::default())
        }
    }
}

/// Application state for the server; configuration problems are kept in
/// the state instead of aborting start-up
pub fn bootstrap(config: SuiteConfig) -> AppState {
    match connect(&config) {
        Ok(wiring) => {
            AppState::ready(wiring.dispatcher, wiring.provider, config).with_market(wiring.market)
        }
        Err(e) => {
            tracing::warn!("⚠ Agents not available: {}", e);
            if matches!(e, AgentError::Config(_)) {
                tracing::warn!("  Set GROQ_API_KEY in .env to enable queries");
            }
            AppState::unconfigured(e.user_message(), config)
        }
    }
}

/// API routes; static files are served from `static_dir` for anything else
pub fn router(state: AppState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/modes", get(handlers::list_modes))
        .route("/api/query", post(handlers::query_handler))
        .route("/api/session", get(handlers::session_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{ErrorResponse, HealthResponse, ModesResponse, QueryResponse};
    use agent_core::provider::{Completion, GenerationOptions, ModelInfo, ProviderInfo};
    use agent_core::{AgentResponse, Message, QueryRequest, Responder, Result};
    use market_agents::market::MockMarketData;
    use stubs::{Fixed, Offline};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    mod stubs {
        use super::*;
        use std::sync::Mutex;

        /// Facade that answers with a fixed text, or fails
        pub struct Fixed {
            pub name: &'static str,
            pub reply: std::result::Result<&'static str, fn() -> AgentError>,
            pub seen: Mutex<Vec<String>>,
        }

        #[async_trait::async_trait]
        impl Responder for Fixed {
            fn name(&self) -> &str {
                self.name
            }

            async fn respond(&self, request: &QueryRequest) -> Result<AgentResponse> {
                self.seen.lock().unwrap().push(request.query.clone());
                match self.reply {
                    Ok(text) => Ok(AgentResponse::new(text, "stub-model")),
                    Err(make) => Err(make()),
                }
            }
        }

        pub struct Offline;

        #[async_trait::async_trait]
        impl LlmProvider for Offline {
            async fn info(&self) -> Result<ProviderInfo> {
                Ok(ProviderInfo { name: "offline".into(), endpoint: String::new(), models: vec![] })
            }

            async fn health_check(&self) -> Result<bool> {
                Ok(false)
            }

            async fn complete(&self, _: &[Message], _: &GenerationOptions) -> Result<Completion> {
                Err(AgentError::ProviderUnavailable("offline".into()))
            }

            async fn list_models(&self) -> Result<Vec<ModelInfo>> {
                Ok(vec![])
            }
        }
    }

    fn fixed(name: &'static str, reply: std::result::Result<&'static str, fn() -> AgentError>) -> Arc<Fixed> {
        Arc::new(Fixed { name, reply, seen: std::sync::Mutex::default() })
    }

    fn ready_app(finance_reply: std::result::Result<&'static str, fn() -> AgentError>) -> (Router, Arc<Fixed>) {
        let finance = fixed("Financial agent", finance_reply);
        let dispatcher = QueryDispatcher::new(
            fixed("Market research team", Ok("team answer")),
            finance.clone(),
            fixed("Web search agent", Ok("search answer")),
        );
        let state = AppState::ready(dispatcher, Arc::new(Offline), SuiteConfig::default())
            .with_market(Arc::new(MockMarketData::new()));
        (router(state, "static"), finance)
    }

    async fn call<T: DeserializeOwned>(app: Router, request: Request<Body>) -> (StatusCode, T) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_query(body: &serde_json::Value) -> Request<Body> {
        Request::post("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_returns_facade_text() {
        let (app, finance) = ready_app(Ok("| META | 612.40 |"));
        let (status, body): (_, QueryResponse) = call(
            app,
            post_query(&serde_json::json!({"query": "META price", "mode": "finance", "max_tokens": 512})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.content, "| META | 612.40 |");
        assert_eq!(body.rendered, "| META | 612.40 |");
        assert_eq!(finance.seen.lock().unwrap().as_slice(), ["META price"]);
    }

    #[tokio::test]
    async fn test_empty_query_is_bad_request() {
        let (app, finance) = ready_app(Ok("unused"));
        let (status, body): (_, ErrorResponse) =
            call(app, post_query(&serde_json::json!({"query": "  ", "mode": "finance"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "EMPTY_QUERY");
        assert!(finance.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway() {
        let (app, _) = ready_app(Err(|| AgentError::Auth("invalid api key".into())));
        let (status, body): (_, ErrorResponse) =
            call(app, post_query(&serde_json::json!({"query": "META", "mode": "finance"}))).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.code, "PROVIDER_ERROR");
        assert!(body.error.contains("API key"));
        assert!(!body.retryable);
    }

    #[tokio::test]
    async fn test_unconfigured_server_refuses_queries_only() {
        let state = AppState::unconfigured(
            AgentError::Config("GROQ_API_KEY is not set".into()).user_message(),
            SuiteConfig::default(),
        );
        let app = router(state, "static");

        let (status, body): (_, ErrorResponse) =
            call(app.clone(), post_query(&serde_json::json!({"query": "hello"}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "CONFIG_ERROR");
        assert!(body.error.contains("GROQ_API_KEY"));

        let (status, health): (_, HealthResponse) =
            call(app.clone(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!health.credentials_configured);
        assert_eq!(health.status, "degraded");

        let (status, modes): (_, ModesResponse) =
            call(app, Request::get("/api/modes").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(modes.modes.len(), 3);
        assert!(!modes.examples.is_empty());
    }

    #[tokio::test]
    async fn test_session_caches_token_estimate() {
        let (app, _) = ready_app(Ok("12345678"));

        let (_, before): (_, handlers::SessionResponse) =
            call(app.clone(), Request::get("/api/session").body(Body::empty()).unwrap()).await;
        assert_eq!(before.token_estimate, None);

        let (status, _): (_, QueryResponse) =
            call(app.clone(), post_query(&serde_json::json!({"query": "1234", "mode": "finance"}))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, after): (_, handlers::SessionResponse) =
            call(app, Request::get("/api/session").body(Body::empty()).unwrap()).await;
        assert_eq!(after.token_estimate, Some(3));
    }

    #[tokio::test]
    async fn test_out_of_range_max_tokens() {
        let (app, _) = ready_app(Ok("x"));
        let (status, body): (_, ErrorResponse) = call(
            app,
            post_query(&serde_json::json!({"query": "META", "max_tokens": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_unknown_mode_is_invalid_input() {
        let (app, finance) = ready_app(Ok("unused"));
        let (status, body): (_, ErrorResponse) = call(
            app.clone(),
            post_query(&serde_json::json!({"query": "META", "mode": "both"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_INPUT");
        assert!(body.error.contains("both"));
        assert!(!body.retryable);

        let request = Request::post("/api/query").body(Body::from("query=META")).unwrap();
        let (status, body): (_, ErrorResponse) = call(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_INPUT");
        assert!(finance.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_setting_keeps_server_up() {
        let config = SuiteConfig::from_lookup(|key| (key == "MAX_TOKENS").then(|| "lots".to_string()));
        let app = router(bootstrap_from(config), "static");

        let (status, body): (_, ErrorResponse) =
            call(app.clone(), post_query(&serde_json::json!({"query": "META news"}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "CONFIG_ERROR");
        assert!(body.error.contains("MAX_TOKENS"));

        let (status, modes): (_, ModesResponse) =
            call(app, Request::get("/api/modes").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(modes.default_max_tokens, SuiteConfig::default().max_tokens);
    }

    #[tokio::test]
    async fn test_health_reports_market_data() {
        let (app, _) = ready_app(Ok("x"));
        let (status, health): (_, HealthResponse) =
            call(app, Request::get("/health").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(health.status, "healthy");
        assert!(health.credentials_configured);
        assert!(!health.provider_connected);
        assert!(health.market_data_connected);
    }
}
