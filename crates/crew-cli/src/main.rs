//! Research crew command line
//!
//! - `crew run` - Run the crew on the default topic
//! - `crew train <n> <file>` - Run `n` iterations and save the outputs
//! - `crew replay <task_id>` - Re-run from a task using the last run
//! - `crew test <n> <eval_llm>` - Run `n` iterations and score each task
//! - `crew run-with-trigger <json>` - Run with an external JSON payload

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::LlmProvider;
use agent_runtime::{OpenAiCompatibleProvider, ProviderConfig};
use research_crew::{
    Crew, CrewSettings, entry,
    config::{TRACING_CREDENTIALS, missing_vars},
};

#[derive(Parser)]
#[command(name = "crew")]
#[command(version, about = "Sequential research crew: researcher, strategy analyst, reporting analyst")]
#[command(long_about = r#"
Runs three roles in sequence. Each role sees the output of the ones before
it and the reporting analyst writes report.md.

Configuration (environment or .env):
  MODEL            Model for every role (default openai/gpt-4o-mini)
  OPENAI_API_KEY   Provider key
  OPENAI_API_BASE  Provider base URL
  CREW_REPORT_DIR  Where report.md is written (default .)
  CREW_RUN_LOG     Last-run record used by replay
  CREW_CONFIG_DIR  Directory with agents.yaml / tasks.yaml overrides
"#)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the crew on the default topic
    Run,

    /// Run the crew several times and save every output
    Train {
        /// Number of iterations
        n_iterations: u32,

        /// JSON file to write the outputs to
        filename: PathBuf,
    },

    /// Re-run the last run from a given task
    Replay {
        /// Task to restart from, e.g. military_analysis_task
        task_id: String,
    },

    /// Run the crew several times and score each task
    Test {
        /// Number of iterations
        n_iterations: u32,

        /// Model used to score the outputs
        eval_llm: String,
    },

    /// Run the crew with a JSON trigger payload
    RunWithTrigger {
        /// JSON payload
        payload: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let env = |name: &str| std::env::var(name).ok();
    let missing = missing_vars(TRACING_CREDENTIALS, env);
    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "tracing credentials not set; spans stay local");
    }

    let provider_config = ProviderConfig::openai_from_env();
    if !provider_config.has_api_key() {
        tracing::warn!("OPENAI_API_KEY not set - model calls will fail");
    }
    let provider: Arc<dyn LlmProvider> =
        Arc::new(OpenAiCompatibleProvider::from_config(provider_config));

    let settings = CrewSettings::from_env()?;
    tracing::info!(model = %settings.model, "crew configured");
    let crew = Crew::research(provider, settings)?;

    match cli.command {
        Command::Run => {
            let output = entry::run(&crew).await?;
            println!("{}", output.raw);
        }
        Command::Train {
            n_iterations,
            filename,
        } => {
            let record = entry::train(&crew, n_iterations, &filename).await?;
            println!(
                "Saved {} training iterations to {}",
                record.iterations.len(),
                filename.display()
            );
        }
        Command::Replay { task_id } => {
            let output = entry::replay(&crew, &task_id).await?;
            println!("{}", output.raw);
        }
        Command::Test {
            n_iterations,
            eval_llm,
        } => {
            let report = entry::test(&crew, n_iterations, &eval_llm).await?;
            println!("{report}");
        }
        Command::RunWithTrigger { payload } => {
            let output = entry::run_with_trigger(&crew, payload.as_deref()).await?;
            println!("{}", output.raw);
        }
    }

    Ok(())
}
