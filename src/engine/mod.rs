//! Reasoning engine contract
//!
//! The research loop consumes an LLM through a plain prompt-in, text-out
//! interface. `OllamaClient` is the production implementation.

pub mod ollama;

pub use ollama::{GenerationOptions, OllamaClient, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};

use crate::errors::Result;
use async_trait::async_trait;

/// Stop sequence that ends a ReAct step before the model invents an observation
pub const OBSERVATION_STOP: &str = "\nObservation:";

/// A text-completion backend
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Complete `prompt`, returning the generated text
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for display
    fn model(&self) -> &str;
}
