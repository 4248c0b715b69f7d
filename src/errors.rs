//! Error types for ResearchBuddy
//!
//! Library-level failures are typed here; the binary and persistence layers
//! wrap them with `anyhow` context.

use thiserror::Error;

/// Main error type for the research agent
#[derive(Error, Debug)]
pub enum AgentError {
    /// Batch specification rejected before any worker started
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// A tool failed while producing its output
    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// Tool input could not be understood
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    /// Reasoning engine (LLM backend) errors
    #[error("Reasoning engine error: {0}")]
    EngineError(String),

    /// Upstream HTTP service answered with a non-success status
    #[error("Upstream service returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic errors with context
    #[error("Agent error: {0}")]
    Generic(String),
}

impl AgentError {
    /// Shorthand for a tool failure
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        AgentError::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Convert anyhow errors to AgentError
impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Generic(err.to_string())
    }
}
