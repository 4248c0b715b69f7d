//! Tool registry
//!
//! Holds every tool the reasoning loop may call, keyed by name. The
//! registry is built once at startup and shared by reference; nothing is
//! registered globally.
//!
//! Default tools:
//! - calculator, unit_converter, equation_solver, wolfram_alpha
//! - web_search, wikipedia, news_search, arxiv_search
//! - fetch_url, python_repl, create_chart, weather
//! - parallel_search (fan-out over the search tools)

use crate::tools::dispatcher::{ConcurrentDispatcher, DispatchConfig};
use crate::tools::implementations::{
    ArxivSearchTool, CalculatorTool, ChartTool, EquationSolverTool, FetchUrlTool, NewsSearchTool,
    PythonReplTool, UnitConverterTool, WeatherTool, WebSearchTool, WikipediaTool, WolframAlphaTool,
};
use crate::tools::kinds::SearchRegistry;
use crate::tools::parallel::ParallelSearchTool;
use crate::tools::types::{Tool, ToolCategory, ToolContext};
use std::collections::HashMap;
use std::sync::Arc;

/// Tool registry
#[derive(Clone, Default)]
pub struct ToolRegistry {
    /// Map of tool name to implementation
    tools: HashMap<String, Arc<dyn Tool>>,

    /// Registration order, used for stable listings
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry with all default tools wired to `context`
    pub fn with_defaults(context: Arc<ToolContext>, dispatch: DispatchConfig) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(CalculatorTool::new()));
        registry.register(Arc::new(UnitConverterTool::new()));
        registry.register(Arc::new(EquationSolverTool::new()));
        registry.register(Arc::new(WikipediaTool::new(context.clone())));
        registry.register(Arc::new(WebSearchTool::new(context.clone())));
        registry.register(Arc::new(WeatherTool::new(context.clone())));
        registry.register(Arc::new(NewsSearchTool::new(context.clone())));
        registry.register(Arc::new(FetchUrlTool::new(context.clone())));
        registry.register(Arc::new(ArxivSearchTool::new(context.clone())));
        registry.register(Arc::new(PythonReplTool::new(context.clone())));
        registry.register(Arc::new(WolframAlphaTool::new(context.clone())));
        registry.register(Arc::new(ChartTool::new(context)));

        let searches = SearchRegistry::from_tools(&registry);
        let dispatcher = ConcurrentDispatcher::new(Arc::new(searches), dispatch);
        registry.register(Arc::new(ParallelSearchTool::new(dispatcher)));

        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Get tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Get tools of one category in registration order
    pub fn by_category(&self, category: ToolCategory) -> Vec<Arc<dyn Tool>> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .filter(|tool| tool.category() == category)
            .cloned()
            .collect()
    }

    /// Get total number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_registry() -> ToolRegistry {
        let context = Arc::new(ToolContext::new().unwrap());
        ToolRegistry::with_defaults(context, DispatchConfig::default())
    }

    #[test]
    fn test_registry_creation() {
        let registry = default_registry();
        assert_eq!(registry.len(), 13);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_all_tools_registered() {
        let registry = default_registry();

        for name in [
            "calculator",
            "unit_converter",
            "equation_solver",
            "wikipedia",
            "web_search",
            "weather",
            "news_search",
            "fetch_url",
            "arxiv_search",
            "python_repl",
            "wolfram_alpha",
            "create_chart",
            "parallel_search",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_registration_order_is_stable() {
        let registry = default_registry();
        let names = registry.tool_names();

        assert_eq!(names.first().map(String::as_str), Some("calculator"));
        assert_eq!(names.last().map(String::as_str), Some("parallel_search"));
    }

    #[test]
    fn test_by_category() {
        let registry = default_registry();

        let retrieval: Vec<String> = registry
            .by_category(ToolCategory::InformationRetrieval)
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(
            retrieval,
            vec!["wikipedia", "web_search", "news_search", "arxiv_search"]
        );

        assert_eq!(registry.by_category(ToolCategory::MultiSource).len(), 1);
    }

    #[test]
    fn test_register_replaces_without_duplicating_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CalculatorTool::new()));
        registry.register(Arc::new(CalculatorTool::new()));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.tool_names().len(), 1);
    }

    #[test]
    fn test_nonexistent_tool() {
        let registry = default_registry();

        assert!(!registry.contains("nonexistent_tool"));
        assert!(registry.get("nonexistent_tool").is_none());
    }
}
