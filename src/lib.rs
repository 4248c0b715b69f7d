//! ResearchBuddy - multi-tool research agent
//!
//! A ReAct loop over a local model, backed by a registry of research tools
//! and a concurrent dispatcher that fans several searches out at once.
//!
//! # Architecture
//!
//! - **tools**: tool registry, single-call executor, concurrent dispatcher,
//!   result formatter, and the leaf tools
//! - **engine** / **agent**: reasoning engine client and the ReAct driver
//! - **session** / **repl** / **cli**: persistence and the user surfaces

pub mod errors;
pub mod tools;
pub mod telemetry;
pub mod engine;
pub mod agent;
pub mod session;
pub mod config;
pub mod repl;
pub mod cli;
pub mod doctor;

// Re-export commonly used types
pub use errors::{AgentError, Result};
