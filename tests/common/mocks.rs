//! Mock implementations for testing.
//!
//! Stub pipeline stages and LLM clients shared across the integration tests
//! so each test file only describes the scenario it cares about.

use async_trait::async_trait;
use deepresearch::llm::LLMClient;
use deepresearch::research::delivery::Delivery;
use deepresearch::research::model::{
    DeliveryMode, DeliveryOutcome, Report, SearchItem, SearchPlan, SearchResult,
};
use deepresearch::research::planner::Planner;
use deepresearch::research::searcher::Searcher;
use deepresearch::research::writer::Writer;
use deepresearch::types::{AppError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============= LLM =============

/// Mock LLM client returning a fixed response, or always failing.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// LLM client that picks its reply by matching a marker in the system prompt.
///
/// Lets one client play planner, searcher and writer in a full pipeline run.
pub struct ScriptedLLMClient {
    replies: Vec<(String, String)>,
}

impl ScriptedLLMClient {
    pub fn new() -> Self {
        Self { replies: vec![] }
    }

    pub fn when_system_contains(mut self, marker: &str, reply: &str) -> Self {
        self.replies.push((marker.to_string(), reply.to_string()));
        self
    }
}

#[async_trait]
impl LLMClient for ScriptedLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, _prompt: &str) -> Result<String> {
        self.replies
            .iter()
            .find(|(marker, _)| system.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| AppError::LLM("no scripted reply".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

// ============= Planner =============

pub struct StubPlanner {
    queries: Vec<String>,
    should_fail: bool,
}

impl StubPlanner {
    pub fn with_queries(queries: &[&str]) -> Self {
        Self {
            queries: queries.iter().map(|q| q.to_string()).collect(),
            should_fail: false,
        }
    }

    /// Plan of `n` queries named `q1`..`qn`.
    pub fn numbered(n: usize) -> Self {
        Self {
            queries: (1..=n).map(|i| format!("q{}", i)).collect(),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            queries: vec![],
            should_fail: true,
        }
    }
}

#[async_trait]
impl Planner for StubPlanner {
    async fn plan(&self, _topic: &str) -> Result<SearchPlan> {
        if self.should_fail {
            return Err(AppError::LLM("planner unavailable".to_string()));
        }
        let items = self
            .queries
            .iter()
            .map(|q| SearchItem::new(q.clone(), format!("because {}", q)))
            .collect();
        SearchPlan::new(items, self.queries.len())
    }
}

// ============= Searcher =============

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    result: SearchResult,
}

/// Searcher with per-query delay and result; unscripted queries succeed at once.
///
/// Tracks how many searches are in flight so concurrency caps can be checked.
#[derive(Default)]
pub struct StubSearcher {
    script: HashMap<String, Scripted>,
    default_delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    completed: AtomicUsize,
}

impl StubSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn respond(mut self, query: &str, delay_ms: u64, result: Option<&str>) -> Self {
        self.script.insert(
            query.to_string(),
            Scripted {
                delay: Duration::from_millis(delay_ms),
                result: result.map(str::to_string),
            },
        );
        self
    }

    pub fn fail(self, query: &str) -> Self {
        self.respond(query, 0, None)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

/// Summary shape produced by a real searcher for `query`.
pub fn summary_for(query: &str) -> String {
    format!(
        "Findings about {q}.\n\nSources: [{q}](https://example.com/{q})",
        q = query
    )
}

#[async_trait]
impl Searcher for StubSearcher {
    async fn search(&self, item: &SearchItem) -> SearchResult {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let scripted = self.script.get(&item.query).cloned().unwrap_or(Scripted {
            delay: self.default_delay,
            result: Some(summary_for(&item.query)),
        });
        tokio::time::sleep(scripted.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        scripted.result
    }
}

// ============= Writer =============

/// Writer that records every input it receives.
#[derive(Default)]
pub struct RecordingWriter {
    inputs: Mutex<Vec<Vec<String>>>,
    should_fail: bool,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            inputs: Mutex::new(vec![]),
            should_fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    pub fn last_input(&self) -> Option<Vec<String>> {
        self.inputs.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Writer for RecordingWriter {
    async fn write(&self, topic: &str, results: &[String]) -> Result<Report> {
        self.inputs.lock().unwrap().push(results.to_vec());
        if self.should_fail {
            return Err(AppError::invalid_output("writer", "schema mismatch"));
        }
        if results.is_empty() {
            return Ok(Report::no_research(topic));
        }
        Ok(Report {
            topic: topic.to_string(),
            short_summary: format!("{} findings", results.len()),
            body: format!("# {}\n\n{}", topic, results.join("\n\n")),
            follow_up_topics: vec!["next steps".to_string()],
            references: vec![],
        })
    }
}

// ============= Delivery =============

pub struct StubDelivery {
    outcome: DeliveryOutcome,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubDelivery {
    pub fn previewing() -> Self {
        Self::returning(DeliveryOutcome::Previewed {
            content: "<html>preview</html>".to_string(),
        })
    }

    pub fn failing() -> Self {
        Self::returning(DeliveryOutcome::failed("smtp exploded"))
    }

    pub fn returning(outcome: DeliveryOutcome) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Delivery for StubDelivery {
    async fn deliver(&self, _report: &Report, _mode: DeliveryMode) -> DeliveryOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.outcome.clone()
    }
}
