//! Integration tests for the research agent
//!
//! A scripted reasoning engine drives the ReAct loop over real math tools
//! and mock search tools; sessions and reports go to a temp directory.

use async_trait::async_trait;
use researchbuddy::agent::{AgentSettings, ResearchAgent, ITERATION_LIMIT_MESSAGE};
use researchbuddy::engine::ReasoningEngine;
use researchbuddy::session::{export_report, SessionStore};
use researchbuddy::telemetry::TimingCollector;
use researchbuddy::tools::implementations::{CalculatorTool, EquationSolverTool, UnitConverterTool};
use researchbuddy::tools::{
    ConcurrentDispatcher, DispatchConfig, ParallelSearchTool, SearchRegistry, Tool, ToolCategory,
    ToolRegistry,
};
use researchbuddy::{AgentError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Replays canned completions in order and records every prompt
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

    fn prompt(&self, idx: usize) -> String {
        self.prompts.lock().unwrap()[idx].clone()
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
            .ok_or_else(|| AgentError::EngineError("no more scripted replies".to_string()))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Search double answering with a fixed fact
struct FactSearch {
    name: &'static str,
    fact: &'static str,
}

#[async_trait]
impl Tool for FactSearch {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Search double"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::InformationRetrieval
    }

    async fn call(&self, query: &str) -> Result<String> {
        Ok(format!("{} (query: {})", self.fact, query))
    }
}

fn registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CalculatorTool::new()));
    registry.register(Arc::new(UnitConverterTool::new()));
    registry.register(Arc::new(EquationSolverTool::new()));
    registry.register(Arc::new(FactSearch {
        name: "web_search",
        fact: "Paris has about 2.1 million residents",
    }));
    registry.register(Arc::new(FactSearch {
        name: "wikipedia",
        fact: "Paris is the capital of France",
    }));

    let searches = SearchRegistry::from_tools(&registry);
    let dispatcher = ConcurrentDispatcher::new(Arc::new(searches), DispatchConfig::default());
    registry.register(Arc::new(ParallelSearchTool::new(dispatcher)));

    Arc::new(registry)
}

fn agent(engine: Arc<ScriptedEngine>) -> ResearchAgent {
    ResearchAgent::new(engine, registry(), AgentSettings::default())
}

#[tokio::test]
async fn test_multi_tool_research_flow() {
    let engine = ScriptedEngine::new(&[
        "I need facts from several sources. Looking at MULTI-SOURCE, I should use parallel_search.\n\
         Action: parallel_search\n\
         Action Input: {\"searches\": [{\"type\": \"web\", \"query\": \"Paris population\"}, {\"type\": \"wikipedia\", \"query\": \"Paris\"}]}",
        "I need math. Looking at MATH & COMPUTATION, I should use calculator.\n\
         Action: calculator\n\
         Action Input: 2.1 * 1000000",
        "I now know the final answer\nFinal Answer: Paris, the capital of France, has about 2100000 residents.",
    ]);
    let timing = TimingCollector::new();
    let mut agent = agent(engine.clone()).with_timing(timing.clone());

    let answer = agent.query("How many people live in the capital of France?").await;

    assert_eq!(
        answer,
        "Paris, the capital of France, has about 2100000 residents."
    );

    let steps = agent.last_steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].tool, "parallel_search");
    assert!(steps[0]
        .observation
        .starts_with("Parallel search completed: 2/2 successful"));
    assert_eq!(steps[1].observation, "2100000");

    let second_prompt = engine.prompt(1);
    assert!(second_prompt.contains("Observation: Parallel search completed: 2/2 successful"));
    assert!(second_prompt.contains("Paris is the capital of France (query: Paris)"));

    assert_eq!(timing.timings().len(), 2);
    assert!(agent.timing_summary().contains("parallel_search"));
}

#[tokio::test]
async fn test_follow_up_uses_memory() {
    let engine = ScriptedEngine::new(&[
        "Action: unit_converter\nAction Input: 5 km to miles",
        "Final Answer: 5 km is about 3.1 miles.",
        "Final Answer: That is about 16,404 feet.",
    ]);
    let mut agent = agent(engine.clone());

    agent.query("How far is 5 km in miles?").await;
    agent.query("And in feet?").await;

    assert_eq!(agent.memory().len(), 2);
    let follow_up = engine.prompt(2);
    assert!(follow_up.contains(
        "Human: How far is 5 km in miles?\nAssistant: 5 km is about 3.1 miles."
    ));
    assert!(follow_up.ends_with("Question: And in feet?\nThought: "));
}

#[tokio::test]
async fn test_recovers_from_bad_tool_and_format() {
    let engine = ScriptedEngine::new(&[
        "I will just answer directly",
        "Action: telescope\nAction Input: Mars",
        "Action: equation_solver\nAction Input: x^2 - 4 = 0",
        "Final Answer: x = -2 or x = 2",
    ]);
    let mut agent = agent(engine);

    let answer = agent.query("Solve x^2 - 4 = 0").await;

    assert_eq!(answer, "x = -2 or x = 2");
    let steps = agent.last_steps();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].tool, "_invalid_format");
    assert!(steps[1].observation.starts_with("Error: telescope is not a valid tool"));
    assert!(steps[2].success);
    assert_eq!(steps[2].observation, "x = -2, 2");
}

#[tokio::test]
async fn test_iteration_limit_is_remembered() {
    let replies: Vec<String> = (0..3)
        .map(|i| format!("Action: calculator\nAction Input: {} + 1", i))
        .collect();
    let replies: Vec<&str> = replies.iter().map(String::as_str).collect();
    let engine = ScriptedEngine::new(&replies);
    let mut agent = ResearchAgent::new(
        engine,
        registry(),
        AgentSettings {
            max_iterations: 3,
            memory_window: 5,
        },
    );

    assert_eq!(agent.query("count forever").await, ITERATION_LIMIT_MESSAGE);
    assert_eq!(agent.last_steps().len(), 3);
    assert_eq!(agent.memory().len(), 1);
}

#[tokio::test]
async fn test_session_roundtrip_and_report() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::new(dir.path().join("sessions"));

    let engine = ScriptedEngine::new(&["Final Answer: Paris", "Final Answer: About 2.1 million"]);
    let mut agent = agent(engine);
    agent.query("Capital of France?").await;
    agent.query("Population?").await;

    let path = agent.save_session(&store, Some("France facts")).unwrap();
    assert!(path.exists());
    let id = agent.session_id().unwrap().to_string();
    assert!(id.ends_with("_france_facts"));

    let sessions = store.list().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].message_count, 2);

    let mut restored = self::agent(ScriptedEngine::new(&[]));
    assert!(restored.load_session(&store, &id).unwrap());
    assert_eq!(restored.memory().len(), 2);
    assert!(restored
        .memory()
        .history_string()
        .starts_with("Human: Capital of France?\nAssistant: Paris"));
    assert!(!restored.load_session(&store, "missing").unwrap());

    let report = export_report(&dir.path().join("reports"), "Capital of France?", "Paris").unwrap();
    let contents = std::fs::read_to_string(report).unwrap();
    assert!(contents.starts_with("# Research Report"));
    assert!(contents.contains("Capital of France?"));
}
