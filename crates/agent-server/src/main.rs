//! Demo Assistant
//!
//! - `demo-assistant serve` - Axum server with chat and direct tool endpoints
//! - `demo-assistant run` - Interactive terminal chat
//!
//! Both use OpenRouter (`OPENROUTER_API_KEY`) and the four demo tools.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{Conversation, LlmProvider, Message};
use agent_runtime::{OpenAiCompatibleProvider, ProviderConfig};

use crate::handlers::{chat_handler, health_check, invoke_tool, list_tools};
use crate::state::{AppState, MAX_CONTEXT_TOKENS};

#[derive(Parser)]
#[command(name = "demo-assistant")]
#[command(version, about = "Tool-calling assistant with weather, math, time and knowledge tools")]
struct Cli {
    /// Model to use (defaults to google/gemini-2.5-flash)
    #[arg(short, long, global = true, env = "ASSISTANT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (BIND_ADDR, default 0.0.0.0:3000)
    Serve,

    /// Chat in the terminal
    Run,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/tools", get(list_tools))
        // Agent API
        .route("/api/tools/{name}", post(invoke_tool))
        .route("/api/chat", post(chat_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ProviderConfig::openrouter_from_env();
    if !config.has_api_key() {
        tracing::warn!("⚠ OPENROUTER_API_KEY not set - chat requests will fail");
        tracing::warn!("  Add it to .env or export it before starting");
    }
    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatibleProvider::from_config(config));

    let state = AppState::new(provider, cli.model);

    tracing::info!("Registered {} tools:", state.tools.len());
    for name in state.tools.names() {
        tracing::info!("  • {}", name);
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Serve => serve(state).await,
        Command::Run => chat_loop(&state).await,
    }
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 demo assistant running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health           - Health check");
    tracing::info!("  GET  /api/tools        - List tools");
    tracing::info!("  POST /api/tools/{{name}} - Call a tool directly");
    tracing::info!("  POST /api/chat         - Send message");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Read prompts from stdin until `exit`, `quit` or EOF. The conversation
/// carries over between turns.
async fn chat_loop(state: &AppState) -> anyhow::Result<()> {
    let agent = state.assistant(None);
    let mut conversation = Conversation::with_system_prompt(agent.system_prompt());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if matches!(prompt, "exit" | "quit") {
            break;
        }

        conversation.push(Message::user(prompt));
        match agent.run(&mut conversation).await {
            Ok(answer) => {
                println!("assistant> {answer}\n");
                conversation.truncate_to_fit(MAX_CONTEXT_TOKENS);
            }
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                println!("assistant> {}\n", e.user_message());
            }
        }
    }

    Ok(())
}
