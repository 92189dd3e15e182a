//! market-agents HTTP Server
//!
//! Serves the query form from `static/` and the JSON API behind it.

use agent_server::{bootstrap_from, init_tracing, router};
use market_agents::SuiteConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env has to be loaded before the subscriber reads RUST_LOG
    dotenvy::dotenv().ok();
    init_tracing("info,tower_http=debug");

    let state = bootstrap_from(SuiteConfig::from_env());

    if let Some(provider) = &state.provider {
        match provider.health_check().await {
            Ok(true) => {
                let info = provider.info().await?;
                tracing::info!("✓ Connected to {} ({})", info.name, info.endpoint);
                tracing::info!("  Model: {}", state.config.model);
            }
            Ok(false) | Err(_) => {
                tracing::warn!("⚠ Model provider not reachable - queries will fail");
            }
        }
    }

    tracing::info!("Finance tools: {}", state.config.capabilities);
    tracing::info!("Market data: {}", state.config.market_data);
    if let Some(market) = &state.market {
        if market.health_check().await {
            tracing::info!("✓ {} reachable", market.name());
        } else {
            tracing::warn!("⚠ {} not reachable - finance tools will report errors", market.name());
        }
    }

    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".into());
    let app = router(state, &static_dir);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 market-agents server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health       - Health check");
    tracing::info!("  GET  /api/modes    - Modes and example prompts");
    tracing::info!("  POST /api/query    - Ask the selected agent");
    tracing::info!("  GET  /api/session  - Last token estimate");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
