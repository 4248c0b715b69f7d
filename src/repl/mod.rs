//! Interactive research session
//!
//! Reads questions and slash commands, runs questions through the
//! research agent, and keeps sessions and reports on disk.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::agent::ResearchAgent;
use crate::repl::commands::{parse_command, Command};
use crate::repl::input::{InputEvent, InputHandler};
use crate::session::{export_report, SessionStore};

pub use crate::repl::display::{render_sessions, render_tools, DisplayManager};

/// Exchanges shown by `/preview`
const PREVIEW_EXCHANGES: usize = 3;

/// REPL behavior switches
#[derive(Debug, Clone, Default)]
pub struct ReplConfig {
    /// Persistent readline history
    pub history_file: Option<PathBuf>,

    /// Print reasoning steps after each answer
    pub verbose: bool,

    /// Print the tool timing summary after each answer
    pub show_timing: bool,
}

/// REPL session coordinator
pub struct ReplSession {
    input: InputHandler,
    display: DisplayManager,
    agent: ResearchAgent,
    store: SessionStore,
    reports_dir: PathBuf,
    config: ReplConfig,

    /// Last question and answer, for `/report`
    last_exchange: Option<(String, String)>,
}

impl ReplSession {
    /// Create new REPL session
    pub fn new(
        agent: ResearchAgent,
        store: SessionStore,
        reports_dir: PathBuf,
        config: ReplConfig,
    ) -> Result<Self> {
        let input = match &config.history_file {
            Some(path) => InputHandler::with_history(path.clone())?,
            None => InputHandler::new()?,
        };

        Ok(Self {
            input,
            display: DisplayManager::new(),
            agent,
            store,
            reports_dir,
            config,
            last_exchange: None,
        })
    }

    /// Run until `/exit`, Ctrl-C or Ctrl-D
    pub async fn run(&mut self) -> Result<()> {
        self.display.show_banner(
            env!("CARGO_PKG_VERSION"),
            self.agent.engine().model(),
            self.agent.runtime().registry().len(),
        );

        loop {
            let line = match self.input.read_line()? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupted => {
                    println!("\nInterrupted. Goodbye!");
                    break;
                }
                InputEvent::Eof => {
                    println!("\nGoodbye!");
                    break;
                }
            };

            if !self.handle_line(&line).await? {
                break;
            }
        }

        if let Err(e) = self.input.save_history() {
            warn!(error = %e, "failed to save readline history");
        }
        Ok(())
    }

    /// Handle one line; returns false when the session should end
    pub async fn handle_line(&mut self, line: &str) -> Result<bool> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(true);
        }

        match parse_command(line) {
            Some(command) => self.execute(command),
            None => {
                self.ask(line).await;
                Ok(true)
            }
        }
    }

    async fn ask(&mut self, question: &str) {
        self.display.start_spinner("Researching...");
        let answer = self.agent.query(question).await;
        self.display.finish_spinner();

        if self.config.verbose && !self.agent.last_steps().is_empty() {
            self.display.show_section("Reasoning steps:");
            self.display.show_steps(self.agent.last_steps());
            println!();
        }

        self.display.show_answer(&answer);

        if self.config.show_timing && !self.agent.last_steps().is_empty() {
            println!("{}", self.agent.timing_summary());
        }
        println!();

        self.last_exchange = Some((question.to_string(), answer));
    }

    /// Execute a built-in command; returns false on exit
    pub fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Help => self.display.show_help(),
            Command::Exit => {
                println!("\nGoodbye!");
                return Ok(false);
            }
            Command::Clear => {
                self.agent.clear_memory();
                self.last_exchange = None;
                self.display.show_success("Started fresh conversation.");
            }
            Command::Memory => {
                let memory = self.agent.memory();
                self.display.show_section(&format!(
                    "Conversation memory ({} exchanges, last {} in prompt):",
                    memory.len(),
                    memory.window()
                ));
                println!("{}\n", memory.history_string());
            }
            Command::Save { description } => {
                if self.agent.memory().is_empty() {
                    self.display.show_warning("Nothing to save yet.");
                } else {
                    let path = self.agent.save_session(&self.store, description.as_deref())?;
                    info!(path = %path.display(), "session saved");
                    self.display
                        .show_success(&format!("Session saved to: {}", path.display()));
                }
            }
            Command::Load { id } => {
                if self.agent.load_session(&self.store, &id)? {
                    self.last_exchange = None;
                    self.display.show_success(&format!(
                        "Loaded session {} ({} exchanges)",
                        id,
                        self.agent.memory().len()
                    ));
                } else {
                    self.display.show_error(&format!("Session not found: {}", id));
                }
            }
            Command::Sessions => {
                self.display.show_section("Saved sessions:");
                println!("{}\n", render_sessions(&self.store.list()?));
            }
            Command::Delete { id } => {
                if self.store.delete(&id)? {
                    if self.agent.session_id() == Some(id.as_str()) {
                        self.agent.detach_session();
                    }
                    self.display.show_success(&format!("Deleted session {}", id));
                } else {
                    self.display.show_error(&format!("Session not found: {}", id));
                }
            }
            Command::Preview { id } => match self.store.preview(&id, PREVIEW_EXCHANGES)? {
                Some(preview) => {
                    self.display.show_section(&format!("Session {}:", id));
                    println!("{}\n", preview);
                }
                None => self.display.show_error(&format!("Session not found: {}", id)),
            },
            Command::Timing => println!("{}\n", self.agent.timing_summary()),
            Command::Report => match &self.last_exchange {
                Some((question, answer)) => {
                    let path = export_report(&self.reports_dir, question, answer)?;
                    self.display
                        .show_success(&format!("Report saved to: {}", path.display()));
                }
                None => self.display.show_warning("No answer to export yet."),
            },
            Command::Tools => {
                self.display.show_section("Available tools:");
                println!("{}\n", render_tools(self.agent.runtime().registry()));
            }
            Command::Invalid { message } => {
                self.display.show_error(&message);
                self.display.show_info("Type /help for available commands");
            }
        }

        Ok(true)
    }

    pub fn agent(&self) -> &ResearchAgent {
        &self.agent
    }
}
