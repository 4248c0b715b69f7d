//! Single-call executor
//!
//! Runs exactly one batch request and always yields a result:
//! - unknown kinds fail closed with the list of valid kinds
//! - tool errors become failed results carrying the message
//! - panics inside a tool are caught at this boundary

use crate::tools::batch::{ToolInvocationRequest, ToolInvocationResult};
use crate::tools::kinds::{SearchKind, SearchRegistry};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Executes one request against the search registry
#[derive(Debug, Clone)]
pub struct SingleCallExecutor {
    registry: Arc<SearchRegistry>,
}

impl SingleCallExecutor {
    /// Create new executor over `registry`
    pub fn new(registry: Arc<SearchRegistry>) -> Self {
        Self { registry }
    }

    /// Execute `request`. Never fails and never panics.
    pub async fn execute(&self, request: &ToolInvocationRequest) -> ToolInvocationResult {
        let Some((kind, tool)) = self.registry.resolve(&request.kind) else {
            debug!(kind = %request.kind, "unknown search kind");
            return ToolInvocationResult::failure(
                request,
                format!(
                    "Unknown search type: {}. Use {}.",
                    request.kind,
                    SearchKind::valid_list()
                ),
            );
        };

        let start = Instant::now();
        let outcome = AssertUnwindSafe(tool.call(&request.query))
            .catch_unwind()
            .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(payload)) => {
                debug!(kind = %kind, elapsed_ms, "search completed");
                ToolInvocationResult::success(request, payload)
            }
            Ok(Err(e)) => {
                warn!(kind = %kind, elapsed_ms, error = %e, "search failed");
                ToolInvocationResult::failure(request, format!("Error: {}", e))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(kind = %kind, elapsed_ms, %message, "search panicked");
                ToolInvocationResult::failure(request, format!("Error: {}", message))
            }
        }
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}
