//! Tool layer
//!
//! Provides the tools the reasoning loop can call, and the parallel
//! dispatch path behind `parallel_search`:
//! - Tool registry (name -> tool) and search registry (kind -> tool)
//! - Single-call executor that turns every failure into a result
//! - Concurrent dispatcher (bounded workers, batch deadline)
//! - Result formatter (per-kind truncation, aggregate report)
//! - Retry manager (exponential backoff) under the HTTP fetcher

pub mod types;
pub mod http;
pub mod retry;
pub mod registry;
pub mod kinds;
pub mod batch;
pub mod executor;
pub mod dispatcher;
pub mod formatter;
pub mod parallel;
pub mod runtime;
pub mod implementations;

// Re-export commonly used types
pub use types::{Tool, ToolCategory, ToolContext, ToolOutcome};
pub use http::{HttpFetcher, HttpResponse};
pub use retry::RetryManager;
pub use registry::ToolRegistry;
pub use kinds::{SearchKind, SearchRegistry};
pub use batch::{BatchReport, ToolInvocationRequest, ToolInvocationResult};
pub use executor::SingleCallExecutor;
pub use dispatcher::{ConcurrentDispatcher, DispatchConfig};
pub use formatter::{format_report, truncate_result};
pub use parallel::ParallelSearchTool;
pub use runtime::ToolRuntime;
