//! Research agent - the ReAct driver
//!
//! Orchestrates one research query:
//! - Prompt rendering (tool catalog, chat history, scratchpad)
//! - Reasoning engine completion and step parsing
//! - Tool execution through the runtime
//! - Conversation memory and session bookkeeping

use crate::agent::memory::ConversationMemory;
use crate::agent::prompt::PromptTemplate;
use crate::agent::react::{parse_step, trim_hallucinated_observation, ReactStep};
use crate::engine::ReasoningEngine;
use crate::errors::Result;
use crate::session::SessionStore;
use crate::telemetry::TimingCollector;
use crate::tools::registry::ToolRegistry;
use crate::tools::runtime::ToolRuntime;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answer returned when the loop runs out of iterations
pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit.";

/// Pseudo tool name recorded for unparseable model output
const INVALID_STEP: &str = "_invalid_format";

/// Agent loop configuration
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Maximum reasoning steps per query
    pub max_iterations: usize,

    /// Prompt history window
    pub memory_window: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            memory_window: 5,
        }
    }
}

/// One executed reasoning step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStep {
    /// Model output for this step
    pub log: String,
    pub tool: String,
    pub input: String,
    pub observation: String,
    pub success: bool,
}

/// Result of one loop run
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub answer: String,
    pub steps: Vec<AgentStep>,
    pub hit_iteration_limit: bool,
}

/// Research agent with conversation memory
pub struct ResearchAgent {
    engine: Arc<dyn ReasoningEngine>,
    runtime: ToolRuntime,
    template: PromptTemplate,
    memory: ConversationMemory,
    settings: AgentSettings,

    /// Id of the session file subsequent saves go to
    session_id: Option<String>,

    last_steps: Vec<AgentStep>,
}

impl ResearchAgent {
    /// Create new research agent
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        registry: Arc<ToolRegistry>,
        settings: AgentSettings,
    ) -> Self {
        let template = PromptTemplate::new(&registry);
        Self {
            engine,
            runtime: ToolRuntime::new(registry),
            template,
            memory: ConversationMemory::with_window(settings.memory_window),
            settings,
            session_id: None,
            last_steps: Vec::new(),
        }
    }

    /// Share a timing collector with the caller
    pub fn with_timing(mut self, timing: TimingCollector) -> Self {
        self.runtime = self.runtime.with_timing(timing);
        self
    }

    /// Run the reasoning loop for `question` against `chat_history`
    pub async fn run(&self, question: &str, chat_history: &str) -> Result<AgentRun> {
        let mut scratchpad = String::new();
        let mut steps = Vec::new();

        for iteration in 1..=self.settings.max_iterations {
            let prompt = self.template.render(chat_history, question, &scratchpad);
            let raw = self.engine.complete(&prompt).await?;
            let text = trim_hallucinated_observation(&raw).trim_end().to_string();

            let step = match parse_step(&text) {
                Ok(ReactStep::Final { answer }) => {
                    info!(iteration, "final answer produced");
                    return Ok(AgentRun {
                        answer,
                        steps,
                        hit_iteration_limit: false,
                    });
                }
                Ok(ReactStep::Action { tool, input }) => {
                    info!(iteration, tool = %tool, "running tool");
                    let outcome = self.runtime.execute(&tool, &input).await;
                    AgentStep {
                        log: text.clone(),
                        tool,
                        input,
                        observation: outcome.output,
                        success: outcome.success,
                    }
                }
                Err(e) => {
                    warn!(iteration, error = %e, "unparseable model output");
                    AgentStep {
                        log: text.clone(),
                        tool: INVALID_STEP.to_string(),
                        input: String::new(),
                        observation: e.to_string(),
                        success: false,
                    }
                }
            };

            debug!(observation_chars = step.observation.len(), "step finished");
            scratchpad.push_str(&format!(
                "{}\nObservation: {}\nThought: ",
                text, step.observation
            ));
            steps.push(step);
        }

        warn!(max = self.settings.max_iterations, "iteration limit reached");
        Ok(AgentRun {
            answer: ITERATION_LIMIT_MESSAGE.to_string(),
            steps,
            hit_iteration_limit: true,
        })
    }

    /// Answer `question`, recording the exchange in memory
    ///
    /// Never fails: errors are rendered into the answer and are not
    /// remembered.
    pub async fn query(&mut self, question: &str) -> String {
        self.runtime.timing().reset();
        let history = self.memory.history_string();

        match self.run(question, &history).await {
            Ok(run) => {
                self.memory.add_exchange(question, run.answer.clone());
                self.last_steps = run.steps;
                run.answer
            }
            Err(e) => {
                warn!(error = %e, "research query failed");
                self.last_steps.clear();
                format!("Error running research query: {}", e)
            }
        }
    }

    /// Steps of the most recent query
    pub fn last_steps(&self) -> &[AgentStep] {
        &self.last_steps
    }

    /// Timing summary of the most recent query
    pub fn timing_summary(&self) -> String {
        self.runtime.timing().summary()
    }

    pub fn runtime(&self) -> &ToolRuntime {
        &self.runtime
    }

    pub fn engine(&self) -> &dyn ReasoningEngine {
        self.engine.as_ref()
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Clear history and detach from the current session file
    pub fn clear_memory(&mut self) {
        self.memory.clear();
        self.session_id = None;
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Keep history but make the next save start a new session file
    pub fn detach_session(&mut self) {
        self.session_id = None;
    }

    /// Save history, reusing the current session id after the first save
    pub fn save_session(
        &mut self,
        store: &SessionStore,
        description: Option<&str>,
    ) -> anyhow::Result<PathBuf> {
        let saved = store.save(self.memory.history(), self.session_id.as_deref(), description)?;
        if self.session_id.is_none() {
            self.session_id = Some(saved.id.clone());
        }
        Ok(saved.path)
    }

    /// Replace history with a saved session; `false` if it does not exist
    pub fn load_session(&mut self, store: &SessionStore, id: &str) -> anyhow::Result<bool> {
        match store.load(id)? {
            Some(history) => {
                self.memory.replace(history);
                self.session_id = Some(id.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentError;
    use crate::tools::implementations::CalculatorTool;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays canned completions and records prompts
    struct ScriptedEngine {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedEngine {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ReasoningEngine for ScriptedEngine {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AgentError::EngineError("script exhausted".to_string()))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn agent(engine: Arc<ScriptedEngine>, max_iterations: usize) -> ResearchAgent {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CalculatorTool::new()));
        ResearchAgent::new(
            engine,
            Arc::new(registry),
            AgentSettings {
                max_iterations,
                memory_window: 5,
            },
        )
    }

    #[tokio::test]
    async fn test_tool_then_answer() {
        let engine = ScriptedEngine::new(&[
            "I need math.\nAction: calculator\nAction Input: 6 * 7",
            "I now know the final answer\nFinal Answer: 42",
        ]);
        let mut agent = agent(engine.clone(), 5);

        let answer = agent.query("What is 6 times 7?").await;

        assert_eq!(answer, "42");
        assert_eq!(agent.last_steps().len(), 1);
        assert_eq!(agent.last_steps()[0].observation, "42");

        let prompts = engine.prompts.lock().unwrap();
        assert!(prompts[1].contains("Action Input: 6 * 7\nObservation: 42\nThought: "));
        assert!(agent.timing_summary().contains("calculator"));
    }

    #[tokio::test]
    async fn test_unknown_tool_observation() {
        let engine = ScriptedEngine::new(&[
            "Action: telescope\nAction Input: mars",
            "Final Answer: unknown",
        ]);
        let mut agent = agent(engine, 5);

        agent.query("Where is Mars?").await;

        let step = &agent.last_steps()[0];
        assert!(!step.success);
        assert_eq!(
            step.observation,
            "Error: telescope is not a valid tool, try one of [calculator]."
        );
    }

    #[tokio::test]
    async fn test_parse_error_is_fed_back() {
        let engine = ScriptedEngine::new(&["hmm, let me think", "Final Answer: done"]);
        let mut agent = agent(engine.clone(), 5);

        assert_eq!(agent.query("q").await, "done");
        let prompts = engine.prompts.lock().unwrap();
        assert!(prompts[1].contains("Observation: Invalid Format: Missing 'Action:' after 'Thought:'"));
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let engine = ScriptedEngine::new(&[
            "Action: calculator\nAction Input: 1",
            "Action: calculator\nAction Input: 2",
        ]);
        let mut agent = agent(engine, 2);

        assert_eq!(agent.query("loop").await, ITERATION_LIMIT_MESSAGE);
    }

    #[tokio::test]
    async fn test_engine_error_not_remembered() {
        let engine = ScriptedEngine::new(&[]);
        let mut agent = agent(engine, 3);

        let answer = agent.query("anything").await;

        assert!(answer.starts_with("Error running research query:"));
        assert!(agent.memory().is_empty());
    }

    #[tokio::test]
    async fn test_memory_reaches_next_prompt() {
        let engine = ScriptedEngine::new(&["Final Answer: Paris", "Final Answer: 2.1 million"]);
        let mut agent = agent(engine.clone(), 3);

        agent.query("Capital of France?").await;
        agent.query("Its population?").await;

        let prompts = engine.prompts.lock().unwrap();
        assert!(prompts[1].contains("Human: Capital of France?\nAssistant: Paris"));
    }

    #[tokio::test]
    async fn test_session_id_reused_and_cleared() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().to_path_buf());
        let engine = ScriptedEngine::new(&["Final Answer: a"]);
        let mut agent = agent(engine, 3);

        agent.query("q").await;
        let first = agent.save_session(&store, Some("solar panels")).unwrap();
        let second = agent.save_session(&store, Some("ignored now")).unwrap();
        assert_eq!(first, second);

        agent.clear_memory();
        assert!(agent.session_id().is_none());
    }
}
