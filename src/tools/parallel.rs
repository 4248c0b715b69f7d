//! `parallel_search`: the dispatcher exposed as an ordinary tool

use crate::errors::{AgentError, Result};
use crate::tools::batch::parse_batch;
use crate::tools::dispatcher::ConcurrentDispatcher;
use crate::tools::formatter::format_report;
use crate::tools::types::{Tool, ToolCategory};
use async_trait::async_trait;

const DESCRIPTION: &str = "Execute multiple searches in parallel for faster results. \
Use this when you need to gather information from multiple sources at once.\n\n\
SUPPORTED TYPES: web, wikipedia, news, arxiv\n\n\
FORMAT:\n\
{\"searches\": [{\"type\": \"web\", \"query\": \"...\"}, {\"type\": \"arxiv\", \"query\": \"...\"}]}\n\n\
EXAMPLE:\n\
{\"searches\": [{\"type\": \"web\", \"query\": \"Tesla stock 2024\"}, \
{\"type\": \"wikipedia\", \"query\": \"Tesla Inc\"}, {\"type\": \"news\", \"query\": \"Tesla\"}, \
{\"type\": \"arxiv\", \"query\": \"electric vehicle battery\"}]}\n\n\
LIMITS: Maximum 10 searches per call. All run simultaneously.";

/// Multi-source search tool
#[derive(Debug, Clone)]
pub struct ParallelSearchTool {
    dispatcher: ConcurrentDispatcher,
}

impl ParallelSearchTool {
    pub fn new(dispatcher: ConcurrentDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Parse, dispatch, and render. Malformed batches are `Err`.
    pub async fn run(&self, input: &str) -> Result<String> {
        let requests = parse_batch(input)?;
        let report = self.dispatcher.dispatch(requests).await?;
        Ok(format_report(&report))
    }
}

#[async_trait]
impl Tool for ParallelSearchTool {
    fn name(&self) -> &str {
        "parallel_search"
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::MultiSource
    }

    /// Batch problems are answered as text so the reasoning loop can fix
    /// its input and try again.
    async fn call(&self, query: &str) -> Result<String> {
        match self.run(query).await {
            Err(AgentError::InvalidBatch(message)) => Ok(format!("Error: {}", message)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::dispatcher::DispatchConfig;
    use crate::tools::kinds::{SearchKind, SearchRegistry};
    use std::sync::Arc;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }
        fn description(&self) -> &str {
            "upper"
        }
        fn category(&self) -> ToolCategory {
            ToolCategory::InformationRetrieval
        }
        async fn call(&self, query: &str) -> Result<String> {
            Ok(query.to_uppercase())
        }
    }

    fn tool() -> ParallelSearchTool {
        let mut registry = SearchRegistry::new();
        for kind in SearchKind::ALL {
            registry.register(kind, Arc::new(Upper));
        }
        ParallelSearchTool::new(ConcurrentDispatcher::new(
            Arc::new(registry),
            DispatchConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_call_formats_report() {
        let output = tool()
            .call(r#"{"searches": [{"type": "web", "query": "rust"}, {"type": "arxiv", "query": "llm"}]}"#)
            .await
            .unwrap();

        assert!(output.starts_with("Parallel search completed: 2/2 successful"));
        assert!(output.contains("--- [WEB] SUCCESS ---\nQuery: rust\nRUST\n"));
        assert!(output.contains("--- [ARXIV] SUCCESS ---\nQuery: llm\nLLM\n"));
    }

    #[tokio::test]
    async fn test_malformed_batch_is_text() {
        let output = tool().call("{").await.unwrap();
        assert!(output.starts_with("Error: Invalid JSON."));

        let output = tool().call(r#"{"searches": []}"#).await.unwrap();
        assert_eq!(output, "Error: No searches provided. Include a 'searches' array.");
    }

    #[tokio::test]
    async fn test_run_surfaces_typed_error() {
        let result = tool().run(r#"{"searches": []}"#).await;
        assert!(matches!(result, Err(AgentError::InvalidBatch(_))));
    }

    #[test]
    fn test_metadata() {
        let tool = tool();
        assert_eq!(tool.name(), "parallel_search");
        assert_eq!(tool.category(), ToolCategory::MultiSource);
        assert!(tool.description().contains("Maximum 10"));
    }
}
