//! Tool timing telemetry
//!
//! Records start/finish events for every tool call made while answering one
//! query and renders the per-tool summary shown after the answer.

use colored::Colorize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Timing events
#[derive(Debug, Clone)]
pub enum TimingEvent {
    ToolStarted {
        tool: String,
        timestamp: Instant,
    },
    ToolCompleted {
        tool: String,
        duration: Duration,
        timestamp: Instant,
    },
    ToolFailed {
        tool: String,
        duration: Duration,
        error: String,
        timestamp: Instant,
    },
}

/// One finished tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolTiming {
    pub tool: String,
    pub duration: Duration,
    pub success: bool,
}

#[derive(Debug, Default)]
struct TimingState {
    events: Vec<TimingEvent>,
    timings: Vec<ToolTiming>,
}

/// Timing collector shared between the agent and the REPL
#[derive(Debug, Clone, Default)]
pub struct TimingCollector {
    state: Arc<Mutex<TimingState>>,
    /// Echo start/finish lines to stdout as they happen
    echo: bool,
}

impl TimingCollector {
    /// Create a new collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Print a line per tool start/finish
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    fn state(&self) -> MutexGuard<'_, TimingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a tool start
    pub fn tool_started(&self, tool: &str) {
        if self.echo {
            println!("  {} [{}] Starting...", "⏱".dimmed(), tool.cyan());
        }
        self.state().events.push(TimingEvent::ToolStarted {
            tool: tool.to_string(),
            timestamp: Instant::now(),
        });
    }

    /// Record a successful tool finish
    pub fn tool_completed(&self, tool: &str, duration: Duration) {
        if self.echo {
            println!(
                "  {} [{}] Completed in {:.2}s",
                "✓".green(),
                tool.cyan(),
                duration.as_secs_f64()
            );
        }
        let mut state = self.state();
        state.events.push(TimingEvent::ToolCompleted {
            tool: tool.to_string(),
            duration,
            timestamp: Instant::now(),
        });
        state.timings.push(ToolTiming {
            tool: tool.to_string(),
            duration,
            success: true,
        });
    }

    /// Record a failed tool call
    pub fn tool_failed(&self, tool: &str, duration: Duration, error: &str) {
        if self.echo {
            println!(
                "  {} [{}] Failed after {:.2}s: {}",
                "✗".red(),
                tool.cyan(),
                duration.as_secs_f64(),
                error
            );
        }
        let mut state = self.state();
        state.events.push(TimingEvent::ToolFailed {
            tool: tool.to_string(),
            duration,
            error: error.to_string(),
            timestamp: Instant::now(),
        });
        state.timings.push(ToolTiming {
            tool: tool.to_string(),
            duration,
            success: false,
        });
    }

    /// Finished calls in order
    pub fn timings(&self) -> Vec<ToolTiming> {
        self.state().timings.clone()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.state().events.len()
    }

    /// Sum of all recorded durations
    pub fn total_time(&self) -> Duration {
        self.state().timings.iter().map(|t| t.duration).sum()
    }

    /// Render the per-tool summary
    pub fn summary(&self) -> String {
        let timings = self.timings();
        if timings.is_empty() {
            return "No tools were used.".to_string();
        }

        let rule = "-".repeat(40);
        let mut lines = vec!["Tool Execution Summary:".to_string(), rule.clone()];
        let mut total = Duration::ZERO;

        for timing in &timings {
            total += timing.duration;
            let marker = if timing.success { "" } else { " (failed)" };
            lines.push(format!(
                "  {}: {:.2}s{}",
                timing.tool,
                timing.duration.as_secs_f64(),
                marker
            ));
        }

        lines.push(rule);
        lines.push(format!("  Total tool time: {:.2}s", total.as_secs_f64()));
        lines.join("\n")
    }

    /// Clear everything for the next query
    pub fn reset(&self) {
        let mut state = self.state();
        state.events.clear();
        state.timings.clear();
    }
}
