//! Terminal output for the REPL and one-shot mode
//!
//! Colored text plus an indicatif spinner while a query runs.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::agent::AgentStep;
use crate::repl::commands::COMMAND_HELP;
use crate::session::SessionSummary;
use crate::tools::registry::ToolRegistry;
use crate::tools::types::ToolCategory;

const RULE_WIDTH: usize = 60;

/// Observation characters shown per step in verbose mode
const STEP_PREVIEW_CHARS: usize = 200;

/// Tool listing grouped by category
pub fn render_tools(registry: &ToolRegistry) -> String {
    let mut lines = Vec::new();
    for category in ToolCategory::ALL {
        let tools = registry.by_category(category);
        if tools.is_empty() {
            continue;
        }
        lines.push(category.title().to_string());
        for tool in tools {
            lines.push(format!("  {:<18} {}", tool.name(), tool.description()));
        }
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}

/// Session listing, one line per session
pub fn render_sessions(sessions: &[SessionSummary]) -> String {
    if sessions.is_empty() {
        return "No saved sessions.".to_string();
    }
    sessions
        .iter()
        .map(|s| {
            format!(
                "  {:<40} {:<20} {} messages",
                s.session_id, s.created_at, s.message_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > STEP_PREVIEW_CHARS {
        let head: String = flat.chars().take(STEP_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        flat
    }
}

/// Display manager for terminal UI
pub struct DisplayManager {
    spinner: Option<ProgressBar>,
    tick: Duration,
}

impl DisplayManager {
    /// Create new display manager
    pub fn new() -> Self {
        Self {
            spinner: None,
            tick: Duration::from_millis(100),
        }
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, model: &str, tool_count: usize) {
        let rule = "=".repeat(RULE_WIDTH);
        println!("\n{}", rule.cyan());
        println!("{}", format!("  ResearchBuddy {} - Multi-Tool Research Agent", version).bold().cyan());
        println!("{}", format!("  Model: {} | Tools: {} | Memory: Enabled", model, tool_count).dimmed());
        println!("{}\n", rule.cyan());
        println!(
            "Type your question (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    pub fn show_help(&self) {
        self.show_section("Available Commands:");
        for (usage, description) in COMMAND_HELP {
            println!("  {:<22} {}", usage.green(), description);
        }
        println!("\n  Anything else is sent to the agent as a research question.\n");
    }

    /// Start the "Researching..." spinner
    pub fn start_spinner(&mut self, message: &str) {
        self.finish_spinner();

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(self.tick);
        self.spinner = Some(spinner);
    }

    pub fn finish_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Display an agent answer between rules
    pub fn show_answer(&self, answer: &str) {
        let rule = "-".repeat(RULE_WIDTH);
        println!("{}", rule.dimmed());
        println!("\n{} {}\n", "Answer:".green().bold(), answer);
        println!("{}", rule.dimmed());
    }

    /// Display the reasoning steps of a run
    pub fn show_steps(&self, steps: &[AgentStep]) {
        for (i, step) in steps.iter().enumerate() {
            let icon = if step.success { "✓".green() } else { "✗".red() };
            println!(
                "  {}. {} {} {}",
                (i + 1).to_string().cyan(),
                icon,
                step.tool.bold(),
                preview(&step.input).dimmed()
            );
            println!("     {}", preview(&step.observation).dimmed());
        }
    }

    pub fn show_section(&self, title: &str) {
        println!("\n{}", title.bold().cyan());
        println!("{}", "=".repeat(RULE_WIDTH).cyan());
    }

    pub fn show_success(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn show_error(&self, error: &str) {
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    pub fn show_info(&self, info: &str) {
        println!("{}", info.dimmed());
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}
