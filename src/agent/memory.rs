//! Conversation memory
//!
//! Every exchange is kept so a session can be saved in full; only the last
//! `window` exchanges are rendered into the prompt.

use serde::{Deserialize, Serialize};

/// Default number of exchanges rendered into the prompt
pub const DEFAULT_MEMORY_WINDOW: usize = 5;

/// Text rendered when there is no history
pub const EMPTY_HISTORY: &str = "No previous conversation.";

/// One question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub input: String,
    pub output: String,
}

impl Exchange {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Unbounded history with a windowed prompt view
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    window: usize,
    history: Vec<Exchange>,
}

impl ConversationMemory {
    /// Create memory with the default window
    pub fn new() -> Self {
        Self::with_window(DEFAULT_MEMORY_WINDOW)
    }

    /// Create memory rendering the last `window` exchanges
    pub fn with_window(window: usize) -> Self {
        Self {
            window,
            history: Vec::new(),
        }
    }

    /// Record an exchange
    pub fn add_exchange(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.history.push(Exchange::new(input, output));
    }

    /// `Human:`/`Assistant:` lines for the last `window` exchanges
    pub fn history_string(&self) -> String {
        if self.history.is_empty() {
            return EMPTY_HISTORY.to_string();
        }

        let start = self.history.len().saturating_sub(self.window);
        self.history[start..]
            .iter()
            .flat_map(|e| {
                [
                    format!("Human: {}", e.input),
                    format!("Assistant: {}", e.output),
                ]
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full history, oldest first
    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    /// Replace the history, e.g. after loading a session
    pub fn replace(&mut self, history: Vec<Exchange>) {
        self.history = history;
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}
