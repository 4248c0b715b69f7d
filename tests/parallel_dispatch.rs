//! Integration tests for parallel search dispatch
//!
//! Exercises the registry, executor, dispatcher and formatter together with
//! mock search tools; no network required.

use async_trait::async_trait;
use researchbuddy::tools::batch::parse_batch;
use researchbuddy::tools::{
    ConcurrentDispatcher, DispatchConfig, ParallelSearchTool, SearchKind, SearchRegistry, Tool,
    ToolCategory, ToolInvocationRequest, ToolRegistry, ToolRuntime,
};
use researchbuddy::{AgentError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone, Copy)]
enum Behavior {
    Echo,
    Fail,
    Panic,
}

/// Search double: sleeps, then echoes, fails, or panics
struct MockSearch {
    name: &'static str,
    delay: Duration,
    behavior: Behavior,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockSearch {
    fn new(name: &'static str, delay_ms: u64, behavior: Behavior) -> Self {
        Self {
            name,
            delay: Duration::from_millis(delay_ms),
            behavior,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn tracking(mut self, in_flight: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> Self {
        self.in_flight = in_flight;
        self.peak = peak;
        self
    }
}

#[async_trait]
impl Tool for MockSearch {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "mock search"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::InformationRetrieval
    }

    async fn call(&self, query: &str) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.behavior {
            Behavior::Echo => Ok(format!("{} results for {}", self.name, query)),
            Behavior::Fail => Err(AgentError::tool(self.name, "service unavailable")),
            Behavior::Panic => panic!("{} blew up", self.name),
        }
    }
}

fn dispatcher_with(
    tools: Vec<(SearchKind, MockSearch)>,
    config: DispatchConfig,
) -> ConcurrentDispatcher {
    let mut searches = SearchRegistry::new();
    for (kind, tool) in tools {
        searches.register(kind, Arc::new(tool));
    }
    ConcurrentDispatcher::new(Arc::new(searches), config)
}

#[tokio::test]
async fn test_requests_run_concurrently() {
    let dispatcher = dispatcher_with(
        vec![
            (SearchKind::Web, MockSearch::new("web_search", 200, Behavior::Echo)),
            (SearchKind::Wikipedia, MockSearch::new("wikipedia", 200, Behavior::Echo)),
            (SearchKind::News, MockSearch::new("news_search", 200, Behavior::Echo)),
        ],
        DispatchConfig::default(),
    );

    let start = Instant::now();
    let report = dispatcher
        .dispatch(vec![
            ToolInvocationRequest::new("web", "rust"),
            ToolInvocationRequest::new("wikipedia", "rust"),
            ToolInvocationRequest::new("news", "rust"),
        ])
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(report.total_count(), 3);
    assert_eq!(report.success_count(), 3);
    assert!(!report.timed_out);
    assert!(elapsed < Duration::from_millis(550), "took {:?}", elapsed);
    assert_eq!(
        report.find("wikipedia", "rust").unwrap().payload,
        "wikipedia results for rust"
    );
}

#[tokio::test]
async fn test_worker_bound_is_respected() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let dispatcher = dispatcher_with(
        vec![(
            SearchKind::Web,
            MockSearch::new("web_search", 50, Behavior::Echo)
                .tracking(in_flight.clone(), peak.clone()),
        )],
        DispatchConfig::default().with_max_workers(2),
    );

    let requests = (0..6)
        .map(|i| ToolInvocationRequest::new("web", format!("q{}", i)))
        .collect();
    let report = dispatcher.dispatch(requests).await.unwrap();

    assert_eq!(report.success_count(), 6);
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let dispatcher = dispatcher_with(
        vec![
            (SearchKind::Web, MockSearch::new("web_search", 10, Behavior::Echo)),
            (SearchKind::News, MockSearch::new("news_search", 10, Behavior::Fail)),
            (SearchKind::Arxiv, MockSearch::new("arxiv_search", 10, Behavior::Panic)),
        ],
        DispatchConfig::default(),
    );

    let report = dispatcher
        .dispatch(vec![
            ToolInvocationRequest::new("web", "a"),
            ToolInvocationRequest::new("news", "b"),
            ToolInvocationRequest::new("arxiv", "c"),
            ToolInvocationRequest::new("telescope", "d"),
        ])
        .await
        .unwrap();

    assert_eq!(report.total_count(), 4);
    assert_eq!(report.success_count(), 1);

    let news = report.find("news", "b").unwrap();
    assert!(!news.succeeded);
    assert!(news.payload.starts_with("Error:"));
    assert!(news.payload.contains("service unavailable"));

    let arxiv = report.find("arxiv", "c").unwrap();
    assert!(!arxiv.succeeded);
    assert!(arxiv.payload.contains("arxiv_search blew up"));

    let unknown = report.find("telescope", "d").unwrap();
    assert_eq!(
        unknown.payload,
        "Unknown search type: telescope. Use 'web', 'wikipedia', 'news', or 'arxiv'."
    );
}

#[tokio::test]
async fn test_deadline_keeps_finished_results() {
    let dispatcher = dispatcher_with(
        vec![
            (SearchKind::Web, MockSearch::new("web_search", 10, Behavior::Echo)),
            (SearchKind::Wikipedia, MockSearch::new("wikipedia", 5_000, Behavior::Echo)),
        ],
        DispatchConfig::default().with_timeout(Duration::from_millis(300)),
    );

    let start = Instant::now();
    let report = dispatcher
        .dispatch(vec![
            ToolInvocationRequest::new("web", "fast"),
            ToolInvocationRequest::new("wikipedia", "slow"),
        ])
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(report.timed_out);
    assert_eq!(report.total_count(), 2);
    assert!(report.find("web", "fast").unwrap().succeeded);

    let slow = report.find("wikipedia", "slow").unwrap();
    assert!(!slow.succeeded);
    assert!(slow.payload.starts_with("Execution error: batch timed out"));
}

#[tokio::test]
async fn test_invalid_batches_rejected_before_dispatch() {
    let dispatcher = dispatcher_with(
        vec![(SearchKind::Web, MockSearch::new("web_search", 0, Behavior::Echo))],
        DispatchConfig::default(),
    );

    assert!(matches!(
        dispatcher.dispatch(Vec::new()).await,
        Err(AgentError::InvalidBatch(_))
    ));

    let too_many = (0..11)
        .map(|i| ToolInvocationRequest::new("web", format!("q{}", i)))
        .collect();
    assert!(matches!(
        dispatcher.dispatch(too_many).await,
        Err(AgentError::InvalidBatch(_))
    ));
}

#[tokio::test]
async fn test_parallel_search_tool_through_runtime() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(MockSearch::new("web_search", 20, Behavior::Echo)));
    registry.register(Arc::new(MockSearch::new("wikipedia", 20, Behavior::Echo)));

    let searches = SearchRegistry::from_tools(&registry);
    assert_eq!(searches.len(), 2);

    let dispatcher = ConcurrentDispatcher::new(Arc::new(searches), DispatchConfig::default());
    registry.register(Arc::new(ParallelSearchTool::new(dispatcher)));
    let runtime = ToolRuntime::new(Arc::new(registry));

    let outcome = runtime
        .execute(
            "parallel_search",
            r#"{"searches": [{"type": "web", "query": "solar"}, {"type": "wikipedia", "query": "Solar power"}]}"#,
        )
        .await;

    assert!(outcome.success);
    assert!(outcome
        .output
        .starts_with("Parallel search completed: 2/2 successful\n"));
    assert!(outcome.output.contains("--- [WEB] SUCCESS ---\nQuery: solar\nweb_search results for solar"));
    assert!(outcome.output.contains("--- [WIKIPEDIA] SUCCESS ---\nQuery: Solar power"));

    let malformed = runtime.execute("parallel_search", "not json").await;
    assert!(malformed.output.starts_with("Error: Invalid JSON."));
}

#[tokio::test]
async fn test_bad_type_fails_only_its_request() {
    let dispatcher = dispatcher_with(
        vec![
            (SearchKind::Web, MockSearch::new("web_search", 10, Behavior::Echo)),
            (SearchKind::News, MockSearch::new("news_search", 10, Behavior::Echo)),
        ],
        DispatchConfig::default(),
    );

    let requests = parse_batch(
        r#"{"searches": [
            {"type": "web", "query": "ok"},
            {"type": 5, "query": "number"},
            {"type": ["news"], "query": "list"},
            {"query": "untyped"}
        ]}"#,
    )
    .unwrap();
    let report = dispatcher.dispatch(requests).await.unwrap();

    assert_eq!(report.total_count(), 4);
    assert_eq!(report.success_count(), 1);
    assert!(report.find("web", "ok").unwrap().succeeded);

    for (kind, query) in [("5", "number"), (r#"["news"]"#, "list"), ("unknown", "untyped")] {
        let result = report.find(kind, query).unwrap();
        assert!(!result.succeeded);
        assert_eq!(
            result.payload,
            format!(
                "Unknown search type: {}. Use 'web', 'wikipedia', 'news', or 'arxiv'.",
                kind
            )
        );
    }
}

#[test]
fn test_long_payloads_are_truncated_in_report() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(LongWeb));
    let searches = SearchRegistry::from_tools(&registry);
    let tool = ParallelSearchTool::new(ConcurrentDispatcher::new(
        Arc::new(searches),
        DispatchConfig::default(),
    ));

    let output = tokio_test::block_on(tool.run(r#"{"searches": [{"type": "web", "query": "long"}]}"#)).unwrap();
    let body = output
        .split_once("Query: long\n")
        .map(|(_, body)| body.trim_end())
        .unwrap();

    assert!(body.ends_with("..."));
    assert!(body.chars().count() <= 603);
}

/// Web search double returning far more text than the report budget
struct LongWeb;

#[async_trait]
impl Tool for LongWeb {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "long"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::InformationRetrieval
    }

    async fn call(&self, _query: &str) -> Result<String> {
        Ok("word ".repeat(400))
    }
}
