//! `local-brain`: explore a project with a local Ollama model through
//! sandboxed, read-only tools.

use anyhow::{Context, Result};
use brain_agent::{Agent, AgentConfig, AgentOutcome, OllamaClient, DEFAULT_SYSTEM_PROMPT};
use brain_security::SecurityContext;
use brain_tools::ToolKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "local-brain")]
#[command(version)]
#[command(about = "Explore a project with a local Ollama model through sandboxed, read-only tools")]
struct Cli {
    /// Task for the model, e.g. "where is the config loaded?"
    #[arg(required_unless_present = "list_tools")]
    prompt: Option<String>,

    /// Project root the agent is confined to
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Ollama model name
    #[arg(long, default_value = "qwen3:latest")]
    model: String,

    /// Ollama base URL
    #[arg(long, default_value = "http://localhost:11434")]
    base_url: String,

    /// Maximum model invocations before giving up
    #[arg(long, default_value_t = 10)]
    max_turns: usize,

    /// Per-tool-call timeout in seconds
    #[arg(long, default_value_t = 30)]
    tool_timeout: u64,

    /// Print the available tools and exit
    #[arg(long)]
    list_tools: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list_tools {
        for kind in ToolKind::ALL {
            println!("{}\n    {}", kind.name(), kind.description());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let prompt = cli
        .prompt
        .expect("clap requires a prompt unless --list-tools is set");

    let ctx = SecurityContext::new(&cli.root)
        .with_context(|| format!("invalid project root '{}'", cli.root.display()))?;
    log::info!("project root: {}", ctx.root().display());

    let config = AgentConfig {
        model: cli.model,
        base_url: cli.base_url.clone(),
        system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        max_turns: cli.max_turns,
        tool_timeout: Duration::from_secs(cli.tool_timeout),
    };
    let agent = Agent::new(config, OllamaClient::new(cli.base_url), ctx);

    // Ctrl-C flips the cancel flag; the loop notices between tool calls.
    let cancel = agent.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::Relaxed);
        }
    });

    match agent.run(&prompt).await? {
        AgentOutcome::Completed { answer, turns } => {
            log::info!("completed in {turns} turn(s)");
            println!("{answer}");
            Ok(ExitCode::SUCCESS)
        }
        AgentOutcome::BudgetExhausted { turns } => {
            eprintln!("turn budget exhausted after {turns} turns without a final answer");
            Ok(ExitCode::from(2))
        }
        AgentOutcome::Cancelled { turns } => {
            eprintln!("cancelled after {turns} turn(s)");
            Ok(ExitCode::from(130))
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
