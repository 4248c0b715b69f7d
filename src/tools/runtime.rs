//! Tool runtime coordinator
//!
//! Entry point the reasoning loop uses to run a tool by name. Unknown
//! names, tool errors and panics come back as failed outcomes, never as
//! `Err`.

use crate::errors::AgentError;
use crate::telemetry::TimingCollector;
use crate::tools::executor::panic_message;
use crate::tools::registry::ToolRegistry;
use crate::tools::types::ToolOutcome;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tool runtime coordinator
#[derive(Debug, Clone)]
pub struct ToolRuntime {
    registry: Arc<ToolRegistry>,
    timing: TimingCollector,
}

impl ToolRuntime {
    /// Create new tool runtime over `registry`
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timing: TimingCollector::new(),
        }
    }

    /// Share a timing collector with the caller
    pub fn with_timing(mut self, timing: TimingCollector) -> Self {
        self.timing = timing;
        self
    }

    /// Execute tool `name` with `input`
    pub async fn execute(&self, name: &str, input: &str) -> ToolOutcome {
        let Some(tool) = self.registry.get(name) else {
            return ToolOutcome::failure(
                name,
                format!(
                    "{} is not a valid tool, try one of [{}].",
                    name,
                    self.registry.tool_names().join(", ")
                ),
                Duration::ZERO,
            );
        };

        self.timing.tool_started(name);
        let start = Instant::now();
        let result = AssertUnwindSafe(tool.call(input))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(AgentError::tool(name, panic_message(panic.as_ref()))));
        let elapsed = start.elapsed();

        match result {
            Ok(output) => {
                debug!(tool = name, elapsed_ms = elapsed.as_millis() as u64, "tool completed");
                self.timing.tool_completed(name, elapsed);
                ToolOutcome::success(name, output, elapsed)
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool failed");
                self.timing.tool_failed(name, elapsed, &e.to_string());
                ToolOutcome::failure(name, e.to_string(), elapsed)
            }
        }
    }

    /// Get tool registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Get timing collector
    pub fn timing(&self) -> &TimingCollector {
        &self.timing
    }

    /// Check if tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }
}
