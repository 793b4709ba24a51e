//! Sandboxed Agent - CLI Entry Point
//!
//! Sends one prompt to the agent and prints the final answer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sandboxed_agent::agent::{Agent, RunOutcome};
use sandboxed_agent::config::Config;
use sandboxed_agent::llm::TokenUsage;
use sandboxed_agent::tools::{SandboxRoot, ToolContext, ToolRegistry};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Ask a tool-using model to work inside a sandboxed directory.
#[derive(Parser, Debug)]
#[command(name = "sandboxed-agent", version, about)]
struct Cli {
    /// Prompt to send to the model
    prompt: String,

    /// Log tool arguments, tool results and token usage
    #[arg(short, long)]
    verbose: bool,

    /// Sandbox root (overrides WORKSPACE_PATH)
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Model identifier (overrides GEMINI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Maximum agent iterations (overrides MAX_ITERATIONS)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_iterations: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // Initialize logging
    let default_filter = if cli.verbose {
        "sandboxed_agent=debug"
    } else {
        "sandboxed_agent=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let mut config = Config::from_env()?;
    config.verbose = cli.verbose;
    if let Some(workspace) = cli.workspace {
        config.workspace_path = workspace;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(max_iterations) = cli.max_iterations {
        config.max_iterations = max_iterations as usize;
    }

    let root = SandboxRoot::new(&config.workspace_path).with_context(|| {
        format!(
            "invalid workspace directory: {}",
            config.workspace_path.display()
        )
    })?;
    info!(
        "Loaded configuration: model={}, workspace={}",
        config.model,
        root.path().display()
    );

    let agent = Agent::new(
        Arc::new(config.model_client()?),
        ToolRegistry::new(config.script.clone()),
        ToolContext::new(root).with_verbose(config.verbose),
        config.max_iterations,
    );

    match agent.run(&cli.prompt).await? {
        RunOutcome::Completed {
            answer,
            iterations,
            usage,
        } => {
            if config.verbose {
                report_usage(iterations, usage);
            }
            println!("{}", answer);
        }
        RunOutcome::IterationCapReached { iterations, usage } => {
            if config.verbose {
                report_usage(iterations, usage);
            }
            println!(
                "Maximum iterations ({}) reached without a final answer.",
                iterations
            );
        }
    }

    Ok(())
}

fn report_usage(iterations: usize, usage: TokenUsage) {
    info!(
        "Iterations: {}, prompt tokens: {}, response tokens: {}",
        iterations, usage.prompt_tokens, usage.response_tokens
    );
}
