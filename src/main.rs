//! ResearchBuddy - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use researchbuddy::{
    agent::ResearchAgent,
    cli::{Args, Commands, Verbosity},
    config::Config,
    doctor::Doctor,
    engine::OllamaClient,
    repl::{render_sessions, render_tools, DisplayManager, ReplConfig, ReplSession},
    session::SessionStore,
    telemetry::TimingCollector,
    tools::ToolRegistry,
};

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    config.apply_overrides(args.model.as_deref(), args.host.as_deref(), args.port);
    config.validate()?;
    Ok(config)
}

fn engine_client(config: &Config) -> Result<OllamaClient> {
    Ok(OllamaClient::with_config(&config.llm.base_url, &config.llm.model)?
        .with_options(config.generation_options()))
}

fn tool_registry(config: &Config) -> Result<Arc<ToolRegistry>> {
    let context = Arc::new(config.tool_context()?);
    Ok(Arc::new(ToolRegistry::with_defaults(context, config.dispatch_config())))
}

fn build_agent(config: &Config, client: OllamaClient, verbosity: Verbosity) -> Result<ResearchAgent> {
    let registry = tool_registry(config)?;
    debug!(tools = registry.len(), model = %config.llm.model, "building research agent");

    let timing =
        TimingCollector::new().with_echo(config.agent.show_timing && verbosity.show_progress());

    Ok(ResearchAgent::new(Arc::new(client), registry, config.agent_settings()).with_timing(timing))
}

/// Warn early instead of failing on the first completion
async fn ensure_engine(client: &OllamaClient) -> bool {
    if client.health_check().await.unwrap_or(false) {
        return true;
    }
    eprintln!(
        "{} Ollama is not reachable at {}",
        "Error:".red().bold(),
        client.base_url()
    );
    eprintln!("  Start it with: ollama serve");
    false
}

async fn run_question(config: &Config, verbosity: Verbosity, question: &str) -> Result<()> {
    let client = engine_client(config)?;
    if !ensure_engine(&client).await {
        std::process::exit(1);
    }

    let mut agent = build_agent(config, client, verbosity)?;

    if !verbosity.show_progress() {
        println!("{}", agent.query(question).await);
        return Ok(());
    }

    let mut display = DisplayManager::new();
    display.start_spinner("Researching...");
    let answer = agent.query(question).await;
    display.finish_spinner();

    if config.agent.verbose && !agent.last_steps().is_empty() {
        display.show_section("Reasoning steps:");
        display.show_steps(agent.last_steps());
        println!();
    }
    display.show_answer(&answer);

    if config.agent.show_timing && !agent.last_steps().is_empty() {
        println!("{}", agent.timing_summary());
    }

    Ok(())
}

async fn run_repl(config: &Config, verbosity: Verbosity) -> Result<()> {
    let client = engine_client(config)?;
    if !client.health_check().await.unwrap_or(false) {
        warn!(url = %client.base_url(), "model server not reachable; queries will fail until it is");
    }

    let agent = build_agent(config, client, verbosity)?;
    let repl_config = ReplConfig {
        history_file: Config::history_path(),
        verbose: config.agent.verbose && verbosity.show_progress(),
        show_timing: config.agent.show_timing,
    };

    let mut session = ReplSession::new(
        agent,
        SessionStore::new(config.sessions_dir()),
        config.reports_dir(),
        repl_config,
    )?;
    session.run().await
}

fn show_tools(config: &Config) -> Result<()> {
    let registry = tool_registry(config)?;
    println!("\n{}\n", format!("Available tools ({}):", registry.len()).bold().cyan());
    println!("{}\n", render_tools(&registry));
    Ok(())
}

fn show_sessions(config: &Config) -> Result<()> {
    let store = SessionStore::new(config.sessions_dir());
    println!("\n{}", "Saved sessions:".bold().cyan());
    println!("{}\n", render_sessions(&store.list()?));
    Ok(())
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    let path = args
        .config
        .clone()
        .or_else(Config::default_path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(built-in defaults)".to_string());

    println!("\n{} {}\n", "Configuration:".bold().cyan(), path);
    println!("{}", toml::to_string_pretty(config).context("Failed to render configuration")?);

    for var in ["OPENWEATHER_API_KEY", "WOLFRAM_ALPHA_APP_ID"] {
        let set = std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false);
        println!("{:<22} {}", var, if set { "set".green() } else { "not set".yellow() });
    }
    println!();
    Ok(())
}

async fn run_doctor(config: &Config) -> Result<()> {
    let doctor = Doctor::new(
        engine_client(config)?,
        config.llm.model.clone(),
        vec![config.sessions_dir(), config.reports_dir(), config.charts_dir()],
    );

    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(message) = args.validate() {
        eprintln!("{} {}", "Error:".red().bold(), message);
        std::process::exit(2);
    }

    let verbosity = args.verbosity();
    init_tracing(verbosity);

    let config = load_config(&args)?;

    match (args.effective_command(), args.question.as_deref()) {
        (Some(Commands::Start), _) => run_repl(&config, verbosity).await,
        (Some(Commands::Tools), _) => show_tools(&config),
        (Some(Commands::Sessions), _) => show_sessions(&config),
        (Some(Commands::Config), _) => show_config(&args, &config),
        (Some(Commands::Doctor), _) => run_doctor(&config).await,
        (None, Some(question)) => run_question(&config, verbosity, question).await,
        (None, None) => run_repl(&config, verbosity).await,
    }
}
