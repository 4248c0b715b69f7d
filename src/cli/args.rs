//! Command-line argument parsing for ResearchBuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ResearchBuddy - multi-tool research agent backed by a local model
#[derive(Parser, Debug)]
#[command(name = "researchbuddy")]
#[command(version)]
#[command(about = "Research questions with web, reference, math and code tools", long_about = None)]
pub struct Args {
    /// Question to research; omit to start the interactive session
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Model to use (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Ollama host (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Ollama port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -v (info logs), -vv (debug logs)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only, no reasoning steps)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start interactive research session
    Start,

    /// List available tools by category
    Tools,

    /// List saved sessions
    Sessions,

    /// Display configuration path and values
    Config,

    /// Check model server reachability and API keys
    Doctor,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Reject a question combined with a subcommand
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_some() && self.question.is_some() {
            return Err("Cannot specify a question with a subcommand.".to_string());
        }
        Ok(())
    }

    /// Subcommand to run; no question and no subcommand means `start`
    pub fn effective_command(&self) -> Option<Commands> {
        match (&self.command, &self.question) {
            (Some(command), _) => Some(command.clone()),
            (None, None) => Some(Commands::Start),
            (None, Some(_)) => None,
        }
    }
}

impl Verbosity {
    /// Default tracing filter for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }

    /// Whether the spinner and step listings are shown
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("researchbuddy").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&[]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["-q"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["-v"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["-vv"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(Verbosity::Quiet.log_filter(), "error");
        assert_eq!(Verbosity::Normal.log_filter(), "warn");
        assert_eq!(Verbosity::Verbose.log_filter(), "info");
        assert_eq!(Verbosity::VeryVerbose.log_filter(), "debug");
        assert!(!Verbosity::Quiet.show_progress());
    }

    #[test]
    fn test_question_mode() {
        let args = parse(&["--model", "llama3.1:8b", "What is Rust?"]);
        assert_eq!(args.question.as_deref(), Some("What is Rust?"));
        assert_eq!(args.model.as_deref(), Some("llama3.1:8b"));
        assert_eq!(args.effective_command(), None);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_subcommands() {
        assert_eq!(parse(&[]).effective_command(), Some(Commands::Start));
        assert_eq!(parse(&["tools"]).effective_command(), Some(Commands::Tools));
        assert_eq!(
            parse(&["--port", "8080", "doctor"]).effective_command(),
            Some(Commands::Doctor)
        );
        assert_eq!(parse(&["sessions"]).command, Some(Commands::Sessions));
    }

    #[test]
    fn test_overrides_default_to_none() {
        let args = parse(&["config"]);
        assert!(args.model.is_none());
        assert!(args.host.is_none());
        assert!(args.port.is_none());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_validate_question_with_subcommand() {
        let args = Args {
            question: Some("q".to_string()),
            model: None,
            host: None,
            port: None,
            config: None,
            verbose: 0,
            quiet: false,
            command: Some(Commands::Doctor),
        };
        assert!(args.validate().is_err());
    }
}
