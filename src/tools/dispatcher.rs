//! Concurrent dispatcher
//!
//! Fans a batch out over a bounded pool of tokio tasks:
//! - At most `max_workers` requests run at once (semaphore permits)
//! - Results are collected in completion order
//! - One wall-clock deadline covers the whole batch
//! - On deadline, completed results are kept, outstanding tasks are
//!   aborted, and a failed result is synthesized for each of them

use crate::errors::Result;
use crate::tools::batch::{validate_batch, BatchReport, ToolInvocationRequest, ToolInvocationResult};
use crate::tools::executor::SingleCallExecutor;
use crate::tools::kinds::SearchRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Maximum concurrent requests per batch
pub const MAX_WORKERS: usize = 5;

/// Default wall-clock budget for a whole batch
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Dispatcher settings
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub max_workers: usize,
    pub timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_workers: MAX_WORKERS,
            timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }
}

impl DispatchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }
}

/// Concurrent dispatcher over the search registry
#[derive(Debug, Clone)]
pub struct ConcurrentDispatcher {
    executor: SingleCallExecutor,
    config: DispatchConfig,
}

impl ConcurrentDispatcher {
    /// Create new dispatcher
    pub fn new(registry: Arc<SearchRegistry>, config: DispatchConfig) -> Self {
        Self {
            executor: SingleCallExecutor::new(registry),
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run `requests` concurrently.
    ///
    /// Fails only for a malformed batch, before any task is spawned. Every
    /// accepted request yields exactly one result.
    pub async fn dispatch(&self, requests: Vec<ToolInvocationRequest>) -> Result<BatchReport> {
        validate_batch(&requests)?;

        let total = requests.len();
        let deadline = Instant::now() + self.config.timeout;
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut set = JoinSet::new();

        info!(total, workers = self.config.max_workers, "dispatching batch");

        for (idx, request) in requests.iter().cloned().enumerate() {
            let executor = self.executor.clone();
            let semaphore = semaphore.clone();

            set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let result = ToolInvocationResult::failure(
                            &request,
                            "Execution error: worker pool closed".to_string(),
                        );
                        return (idx, result);
                    }
                };
                let result = executor.execute(&request).await;
                (idx, result)
            });
        }

        let mut completed = vec![false; total];
        let mut results = Vec::with_capacity(total);
        let mut timed_out = false;

        loop {
            match timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok((idx, result)))) => {
                    debug!(idx, kind = %result.kind, succeeded = result.succeeded, "request finished");
                    completed[idx] = true;
                    results.push(result);
                }
                Ok(Some(Err(e))) => {
                    // Identity is lost with the task; filled in below.
                    warn!(error = %e, "dispatch task terminated");
                }
                Ok(None) => break,
                Err(_) => {
                    timed_out = true;
                    set.abort_all();
                    break;
                }
            }
        }

        let reason = if timed_out {
            format!("batch timed out after {:?}", self.config.timeout)
        } else {
            "worker terminated".to_string()
        };

        for (idx, request) in requests.iter().enumerate() {
            if !completed[idx] {
                results.push(ToolInvocationResult::failure(
                    request,
                    format!("Execution error: {}", reason),
                ));
            }
        }

        if timed_out {
            warn!(
                outstanding = completed.iter().filter(|c| !**c).count(),
                "batch deadline elapsed"
            );
        }

        Ok(BatchReport { results, timed_out })
    }
}
