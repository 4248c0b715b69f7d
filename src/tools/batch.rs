//! Batch request and result types for parallel dispatch

use crate::errors::{AgentError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of requests accepted in one batch
pub const MAX_BATCH_SIZE: usize = 10;

/// Tag recorded when a batch entry omits `type`; it never resolves
pub const MISSING_KIND: &str = "unknown";

/// One requested search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Raw `type` tag, resolved at execution time
    pub kind: String,
    pub query: String,
}

impl ToolInvocationRequest {
    pub fn new(kind: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            query: query.into(),
        }
    }
}

/// Result of one request; `kind` and `query` are echoed for correlation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    pub kind: String,
    pub query: String,
    pub payload: String,
    pub succeeded: bool,
}

impl ToolInvocationResult {
    pub fn success(request: &ToolInvocationRequest, payload: String) -> Self {
        Self {
            kind: request.kind.clone(),
            query: request.query.clone(),
            payload,
            succeeded: true,
        }
    }

    pub fn failure(request: &ToolInvocationRequest, payload: String) -> Self {
        Self {
            kind: request.kind.clone(),
            query: request.query.clone(),
            payload,
            succeeded: false,
        }
    }
}

/// All results of one dispatch, in completion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<ToolInvocationResult>,

    /// Set when the batch deadline elapsed with requests outstanding
    pub timed_out: bool,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Find the result for a request by its echoed fields
    pub fn find(&self, kind: &str, query: &str) -> Option<&ToolInvocationResult> {
        self.results
            .iter()
            .find(|r| r.kind == kind && r.query == query)
    }
}

/// Check batch size and queries before anything runs
pub fn validate_batch(requests: &[ToolInvocationRequest]) -> Result<()> {
    if requests.is_empty() {
        return Err(AgentError::InvalidBatch(
            "No searches provided. Include a 'searches' array.".to_string(),
        ));
    }

    if requests.len() > MAX_BATCH_SIZE {
        return Err(AgentError::InvalidBatch(format!(
            "Maximum {} parallel searches allowed.",
            MAX_BATCH_SIZE
        )));
    }

    for (i, request) in requests.iter().enumerate() {
        if request.query.trim().is_empty() {
            return Err(AgentError::InvalidBatch(format!(
                "Search {} has an empty 'query' field.",
                i + 1
            )));
        }
    }

    Ok(())
}

/// Parse `{"searches": [{"type": ..., "query": ...}, ...]}` into requests.
///
/// A missing or unrecognized `type` is kept as a tag that fails later as
/// an individual request; it never rejects the batch.
pub fn parse_batch(input: &str) -> Result<Vec<ToolInvocationRequest>> {
    let spec: Value = serde_json::from_str(input.trim()).map_err(|e| {
        AgentError::InvalidBatch(format!(
            "Invalid JSON. {}\n\nExpected format:\n\
             {{\"searches\": [{{\"type\": \"web\", \"query\": \"...\"}}, ...]}}",
            e
        ))
    })?;

    let searches = spec
        .get("searches")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if searches.is_empty() {
        return Err(AgentError::InvalidBatch(
            "No searches provided. Include a 'searches' array.".to_string(),
        ));
    }

    if searches.len() > MAX_BATCH_SIZE {
        return Err(AgentError::InvalidBatch(format!(
            "Maximum {} parallel searches allowed.",
            MAX_BATCH_SIZE
        )));
    }

    let mut requests = Vec::with_capacity(searches.len());
    for (i, entry) in searches.iter().enumerate() {
        let query = match entry.get("query") {
            Some(Value::String(q)) => q.clone(),
            Some(Value::Null) | None => {
                return Err(AgentError::InvalidBatch(format!(
                    "Search {} is missing 'query' field.",
                    i + 1
                )))
            }
            Some(other) => other.to_string(),
        };

        let kind = match entry.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => other.to_string(),
            None => MISSING_KIND.to_string(),
        };

        requests.push(ToolInvocationRequest { kind, query });
    }

    validate_batch(&requests)?;
    Ok(requests)
}
