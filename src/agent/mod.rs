//! Research agent module
//!
//! ReAct driver, prompt rendering, output parsing, and conversation memory.

pub mod memory;
pub mod prompt;
pub mod react;
pub mod orchestrator;

// Re-export commonly used types
pub use memory::{ConversationMemory, Exchange, DEFAULT_MEMORY_WINDOW};
pub use orchestrator::{AgentRun, AgentSettings, AgentStep, ResearchAgent, ITERATION_LIMIT_MESSAGE};
pub use prompt::PromptTemplate;
pub use react::{parse_step, ParseError, ReactStep};
