//! One-shot command line client
//!
//! Runs a single query through the same agents the server uses and prints
//! the answer to stdout.

use std::process::ExitCode;

use clap::Parser;

use agent_core::QueryRequest;
use agent_server::{connect, init_tracing};
use market_agents::{DispatchOutcome, EXAMPLE_PROMPTS, MarketBackend, Mode, SuiteConfig};

/// Ask the market research agents a question
#[derive(Parser, Debug)]
#[command(name = "ask")]
#[command(version, about, long_about = None)]
struct Args {
    /// Question to ask (defaults to the first example prompt)
    question: Option<String>,

    /// combined, finance or search
    #[arg(short, long, default_value = "combined")]
    mode: Mode,

    /// Cap the completion length for this query
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Print only the answer, without the tool call list
    #[arg(long)]
    hide_tool_calls: bool,

    /// Use the built-in offline market data
    #[arg(long)]
    mock_market: bool,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenvy::dotenv().ok();
    init_tracing(if args.debug { "debug" } else { "warn" });

    let mut config = match SuiteConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };
    if args.mock_market {
        config.market_data = MarketBackend::Mock;
    }

    let wiring = match connect(&config) {
        Ok(wiring) => wiring,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };
    let dispatcher = wiring.dispatcher.with_show_tool_calls(!args.hide_tool_calls);

    let question = args
        .question
        .unwrap_or_else(|| EXAMPLE_PROMPTS[0].to_string());
    let mut request = QueryRequest::new(question);
    if let Some(max_tokens) = args.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    let outcome = dispatcher.dispatch(args.mode, &request).await;
    match outcome {
        DispatchOutcome::Answered { .. } => {
            println!("{}", outcome.display_text());
            ExitCode::SUCCESS
        }
        DispatchOutcome::Rejected { .. } | DispatchOutcome::Failed { .. } => {
            eprintln!("{}", outcome.display_text());
            ExitCode::FAILURE
        }
    }
}
