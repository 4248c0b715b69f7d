//! Tool execution types and structures
//!
//! Core types shared by every tool: the `Tool` trait, categories,
//! execution outcomes, and the execution context.

use crate::errors::Result;
use crate::tools::http::HttpFetcher;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// A callable tool with the uniform `query -> text` contract.
///
/// Implementations may perform network or process I/O. Failures are
/// reported through `Err`; the runtime and the dispatcher turn them into
/// data so they never abort the caller.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the reasoning engine uses to select this tool
    fn name(&self) -> &str;

    /// Usage description rendered into the prompt
    fn description(&self) -> &str;

    /// Category used for hierarchical tool selection
    fn category(&self) -> ToolCategory;

    /// Run the tool with free-text (or JSON options) input
    async fn call(&self, query: &str) -> Result<String>;
}

/// Tool categories, in prompt order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    MathComputation,
    InformationRetrieval,
    WebContent,
    CodeExecution,
    Visualization,
    MultiSource,
    Weather,
}

impl ToolCategory {
    /// All categories in display order
    pub const ALL: [ToolCategory; 7] = [
        ToolCategory::MathComputation,
        ToolCategory::InformationRetrieval,
        ToolCategory::WebContent,
        ToolCategory::CodeExecution,
        ToolCategory::Visualization,
        ToolCategory::MultiSource,
        ToolCategory::Weather,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ToolCategory::MathComputation => "MATH & COMPUTATION",
            ToolCategory::InformationRetrieval => "INFORMATION RETRIEVAL",
            ToolCategory::WebContent => "WEB CONTENT",
            ToolCategory::CodeExecution => "CODE EXECUTION",
            ToolCategory::Visualization => "VISUALIZATION",
            ToolCategory::MultiSource => "MULTI-SOURCE",
            ToolCategory::Weather => "WEATHER",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            ToolCategory::MathComputation => {
                "Use for calculations, equations, unit conversions, and computational knowledge."
            }
            ToolCategory::InformationRetrieval => {
                "Use to find information, facts, news, and research."
            }
            ToolCategory::WebContent => "Use to read and extract content from specific web pages.",
            ToolCategory::CodeExecution => {
                "Use when you need to run Python code for complex logic or data processing."
            }
            ToolCategory::Visualization => "Use to create charts and graphs from data.",
            ToolCategory::MultiSource => "Use to search multiple sources simultaneously.",
            ToolCategory::Weather => "Use to get current weather information.",
        }
    }

    pub fn guidance(&self) -> &'static str {
        match self {
            ToolCategory::MathComputation => {
                "Use calculator for arithmetic/algebra, unit_converter for unit changes, \
                 equation_solver for symbolic math, wolfram_alpha for complex computations \
                 and verified facts."
            }
            ToolCategory::InformationRetrieval => {
                "Use web_search for current events/recent data, wikipedia for established \
                 facts/history/explanations, news_search for recent news, arxiv_search for \
                 academic papers."
            }
            ToolCategory::WebContent => {
                "Use when you have a specific URL and need to read its content."
            }
            ToolCategory::CodeExecution => {
                "Use for complex calculations, data manipulation, algorithms, or when other \
                 tools are insufficient."
            }
            ToolCategory::Visualization => "Use to visualize data as bar, line, or pie charts.",
            ToolCategory::MultiSource => {
                "Use when you need to gather information from multiple sources at once for \
                 efficiency."
            }
            ToolCategory::Weather => "Use for weather forecasts and current conditions.",
        }
    }
}

/// Outcome of one tool invocation made by the reasoning loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Tool name that was executed
    pub tool: String,

    /// Tool output, or the rendered error text on failure
    pub output: String,

    /// Whether execution was successful
    pub success: bool,

    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl ToolOutcome {
    /// Create successful outcome
    pub fn success(tool: impl Into<String>, output: String, duration: Duration) -> Self {
        Self {
            tool: tool.into(),
            output,
            success: true,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Create failed outcome; the error text becomes the observation
    pub fn failure(tool: impl Into<String>, error: String, duration: Duration) -> Self {
        Self {
            tool: tool.into(),
            output: format!("Error: {}", error),
            success: false,
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// Shared execution context handed to every tool
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// HTTP client with retry policy
    pub http: HttpFetcher,

    /// Number of results for search-style tools
    pub search_results: usize,

    /// Number of sentences requested from Wikipedia extracts
    pub wikipedia_sentences: usize,

    /// Maximum characters kept from a fetched page
    pub max_page_chars: usize,

    /// Timeout for the python_repl subprocess
    pub python_timeout: Duration,

    /// Directory where rendered charts are written
    pub charts_dir: PathBuf,

    /// OpenWeatherMap API key
    pub openweather_api_key: Option<String>,

    /// Wolfram Alpha application id
    pub wolfram_app_id: Option<String>,
}

impl ToolContext {
    /// Create context with defaults and keys from the environment
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: HttpFetcher::new(Duration::from_secs(15))?,
            search_results: 5,
            wikipedia_sentences: 5,
            max_page_chars: 5000,
            python_timeout: Duration::from_secs(5),
            charts_dir: PathBuf::from("output"),
            openweather_api_key: non_empty_env("OPENWEATHER_API_KEY"),
            wolfram_app_id: non_empty_env("WOLFRAM_ALPHA_APP_ID"),
        })
    }

    /// Set search result count
    pub fn with_search_results(mut self, count: usize) -> Self {
        self.search_results = count.clamp(1, 10);
        self
    }

    /// Set Wikipedia sentence count
    pub fn with_wikipedia_sentences(mut self, sentences: usize) -> Self {
        self.wikipedia_sentences = sentences.max(1);
        self
    }

    /// Set python timeout
    pub fn with_python_timeout(mut self, timeout: Duration) -> Self {
        self.python_timeout = timeout;
        self
    }

    /// Set charts directory
    pub fn with_charts_dir(mut self, dir: PathBuf) -> Self {
        self.charts_dir = dir;
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_outcome_success() {
        let outcome = ToolOutcome::success("calculator", "4".to_string(), Duration::from_millis(3));

        assert!(outcome.success);
        assert_eq!(outcome.tool, "calculator");
        assert_eq!(outcome.output, "4");
        assert_eq!(outcome.duration_ms, 3);
    }

    #[test]
    fn test_tool_outcome_failure_renders_error() {
        let outcome = ToolOutcome::failure(
            "weather",
            "API key missing".to_string(),
            Duration::from_millis(1),
        );

        assert!(!outcome.success);
        assert_eq!(outcome.output, "Error: API key missing");
    }

    #[test]
    fn test_context_builder() {
        let ctx = ToolContext::new()
            .unwrap()
            .with_search_results(50)
            .with_wikipedia_sentences(0)
            .with_python_timeout(Duration::from_secs(2));

        assert_eq!(ctx.search_results, 10);
        assert_eq!(ctx.wikipedia_sentences, 1);
        assert_eq!(ctx.python_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_category_order_and_titles() {
        assert_eq!(ToolCategory::ALL[0], ToolCategory::MathComputation);
        for category in ToolCategory::ALL {
            assert!(!category.title().is_empty());
            assert!(!category.summary().is_empty());
            assert!(!category.guidance().is_empty());
        }
    }
}
