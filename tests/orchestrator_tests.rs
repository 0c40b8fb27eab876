//! Orchestrator integration tests
//!
//! Drive full runs with stub stages and check the progress stream, the
//! terminal record and what each stage received.

mod common;

use common::mocks::{
    summary_for, MockLLMClient, RecordingWriter, StubDelivery, StubPlanner, StubSearcher,
};
use deepresearch::research::model::{
    DeliveryMode, DeliveryOutcome, ProgressEvent, RunResult, RunState, RunStatus,
};
use deepresearch::research::orchestrator::{ResearchOrchestrator, RunOptions};
use deepresearch::research::sink::ReportSink;
use deepresearch::research::writer::LlmWriter;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct Harness {
    searcher: Arc<StubSearcher>,
    writer: Arc<RecordingWriter>,
    delivery: Arc<StubDelivery>,
    orchestrator: ResearchOrchestrator,
}

fn harness(
    planner: StubPlanner,
    searcher: StubSearcher,
    writer: RecordingWriter,
    delivery: StubDelivery,
) -> Harness {
    let searcher = Arc::new(searcher);
    let writer = Arc::new(writer);
    let delivery = Arc::new(delivery);
    let orchestrator = ResearchOrchestrator::new(
        Arc::new(planner),
        searcher.clone(),
        writer.clone(),
        delivery.clone(),
    );

    Harness {
        searcher,
        writer,
        delivery,
        orchestrator,
    }
}

fn default_harness(searcher: StubSearcher) -> Harness {
    harness(
        StubPlanner::numbered(5),
        searcher,
        RecordingWriter::new(),
        StubDelivery::previewing(),
    )
}

async fn collect(orchestrator: &ResearchOrchestrator, topic: &str) -> Vec<ProgressEvent> {
    orchestrator
        .run(topic, DeliveryMode::Preview)
        .collect()
        .await
}

fn terminal(events: &[ProgressEvent]) -> RunResult {
    match events.last() {
        Some(ProgressEvent::Finished(result)) => result.clone(),
        other => panic!("expected terminal record last, got {:?}", other),
    }
}

fn messages(events: &[ProgressEvent]) -> Vec<&str> {
    events.iter().filter_map(|e| e.message()).collect()
}

fn stages(events: &[ProgressEvent]) -> Vec<RunState> {
    events.iter().filter_map(|e| e.stage()).collect()
}

// ============= Happy path =============

#[tokio::test]
async fn test_successful_run_emits_ordered_progress() {
    let h = default_harness(StubSearcher::new());
    let events = collect(&h.orchestrator, "  ocean acidification  ").await;

    let result = terminal(&events);
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.topic, "ocean acidification");
    assert_eq!(result.searches_planned, 5);
    assert_eq!(result.searches_performed, 5);
    assert!(result.report.is_some());
    assert!(result.error.is_none());

    let msgs = messages(&events);
    assert_eq!(msgs[0], "starting");
    assert_eq!(msgs[1], "plan ready: 5 searches");
    for m in 1..=5 {
        assert!(msgs.contains(&format!("{}/5 searches completed", m).as_str()));
    }
    assert!(msgs.contains(&"searches complete: 5/5 succeeded"));
    assert!(msgs.contains(&"report ready"));
    assert!(msgs
        .iter()
        .any(|m| m.starts_with("## Final Research Report")));
}

#[tokio::test]
async fn test_stages_never_move_backwards() {
    let h = default_harness(StubSearcher::new());
    let events = collect(&h.orchestrator, "tides").await;

    let observed = stages(&events);
    assert!(observed.windows(2).all(|pair| pair[0] == pair[1]
        || pair[0].can_transition_to(pair[1])));
    assert_eq!(observed.first(), Some(&RunState::Planning));
    assert_eq!(observed.last(), Some(&RunState::Done));
}

#[tokio::test]
async fn test_exactly_one_terminal_record_and_it_is_last() {
    let h = default_harness(StubSearcher::new().fail("q2"));
    let events = collect(&h.orchestrator, "tides").await;

    let terminal_count = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminal_count, 1);
    assert!(events.last().unwrap().is_terminal());
}

// ============= Partial failure =============

#[tokio::test]
async fn test_failed_search_is_absorbed() {
    let h = default_harness(StubSearcher::new().fail("q3"));
    let events = collect(&h.orchestrator, "tides").await;

    let result = terminal(&events);
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.searches_performed, 4);
    assert_eq!(h.writer.last_input().unwrap().len(), 4);
    assert!(messages(&events).contains(&"searches complete: 4/5 succeeded"));
    assert!(messages(&events).contains(&"5/5 searches completed"));
}

#[tokio::test]
async fn test_all_searches_failing_still_produces_report() {
    let searcher = (1..=5).fold(StubSearcher::new(), |s, i| s.fail(&format!("q{}", i)));
    let llm = MockLLMClient::failing();
    let orchestrator = ResearchOrchestrator::new(
        Arc::new(StubPlanner::numbered(5)),
        Arc::new(searcher),
        Arc::new(LlmWriter::new(Arc::new(llm.clone()))),
        Arc::new(StubDelivery::previewing()),
    );

    let events = collect(&orchestrator, "tides").await;
    let result = terminal(&events);

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.searches_performed, 0);
    assert_eq!(llm.calls(), 0);
    assert!(!result.report.unwrap().body.trim().is_empty());
}

#[tokio::test]
async fn test_results_collected_in_completion_order() {
    let searcher = StubSearcher::new()
        .respond("A", 300, Some("result A"))
        .respond("B", 10, Some("result B"));
    let h = harness(
        StubPlanner::with_queries(&["A", "B"]),
        searcher,
        RecordingWriter::new(),
        StubDelivery::previewing(),
    );

    collect(&h.orchestrator, "ordering").await;

    assert_eq!(
        h.writer.last_input().unwrap(),
        vec!["result B".to_string(), "result A".to_string()]
    );
}

#[tokio::test]
async fn test_references_deduplicated_in_first_seen_order() {
    let searcher = StubSearcher::new()
        .respond(
            "first",
            10,
            Some("One.\n\nSources: [U1](https://u1.example), [U2](https://u2.example)"),
        )
        .respond(
            "second",
            150,
            Some("Two.\n\nSources: [U2](https://u2.example), [U3](https://u3.example)"),
        );
    let llm = MockLLMClient::new(
        r#"{"short_summary": "s", "markdown_report": "Body [1] [2] [3].", "follow_up_questions": []}"#,
    );
    let orchestrator = ResearchOrchestrator::new(
        Arc::new(StubPlanner::with_queries(&["first", "second"])),
        Arc::new(searcher),
        Arc::new(LlmWriter::new(Arc::new(llm))),
        Arc::new(StubDelivery::previewing()),
    );

    let result = terminal(&collect(&orchestrator, "citations").await);
    let report = result.report.unwrap();

    let urls: Vec<&str> = report.references.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://u1.example", "https://u2.example", "https://u3.example"]
    );
    assert_eq!(report.body.matches("(https://u2.example)").count(), 1);
}

#[tokio::test]
async fn test_delivery_failure_is_not_fatal() {
    let h = harness(
        StubPlanner::numbered(3),
        StubSearcher::new(),
        RecordingWriter::new(),
        StubDelivery::failing(),
    );

    let events = collect(&h.orchestrator, "tides").await;
    let result = terminal(&events);

    assert_eq!(result.status, RunStatus::Success);
    assert!(matches!(result.delivery, Some(DeliveryOutcome::Failed { .. })));
    assert!(result.report.is_some());
    assert!(messages(&events)
        .iter()
        .any(|m| m.starts_with("delivery failed")));
}

// ============= Fatal failures =============

#[tokio::test]
async fn test_planner_failure_is_fatal_before_searching() {
    let h = harness(
        StubPlanner::failing(),
        StubSearcher::new(),
        RecordingWriter::new(),
        StubDelivery::previewing(),
    );

    let events = collect(&h.orchestrator, "tides").await;
    let result = terminal(&events);

    assert_eq!(result.status, RunStatus::Error);
    assert!(result.report.is_none());
    assert!(result.error.unwrap().contains("planner unavailable"));
    assert_eq!(stages(&events), vec![RunState::Planning]);
    assert_eq!(h.searcher.completed(), 0);
    assert_eq!(h.writer.calls(), 0);
    assert_eq!(h.delivery.calls(), 0);
}

#[tokio::test]
async fn test_writer_failure_is_fatal() {
    let h = harness(
        StubPlanner::numbered(2),
        StubSearcher::new(),
        RecordingWriter::failing(),
        StubDelivery::previewing(),
    );

    let events = collect(&h.orchestrator, "tides").await;
    let result = terminal(&events);

    assert_eq!(result.status, RunStatus::Error);
    assert_eq!(result.searches_performed, 2);
    assert!(result.error.unwrap().contains("Invalid output from writer"));
    assert!(!stages(&events).contains(&RunState::Delivering));
    assert_eq!(h.delivery.calls(), 0);
}

#[tokio::test]
async fn test_empty_topic_fails_immediately() {
    let h = default_harness(StubSearcher::new());
    let events = collect(&h.orchestrator, "   ").await;

    assert_eq!(events.len(), 1);
    let result = terminal(&events);
    assert_eq!(result.status, RunStatus::Error);
    assert_eq!(result.searches_planned, 0);
    assert!(result.error.unwrap().contains("topic must not be empty"));
}

// ============= Cancellation and deadlines =============

#[tokio::test]
async fn test_cancellation_during_searches_aborts_run() {
    let h = default_harness(StubSearcher::new().with_default_delay(Duration::from_secs(30)));
    let cancel = CancellationToken::new();
    let mut events = h
        .orchestrator
        .run_cancellable("tides", DeliveryMode::Preview, cancel.clone());

    let mut collected = Vec::new();
    while let Some(event) = events.next().await {
        if event.message().is_some_and(|m| m.starts_with("plan ready")) {
            cancel.cancel();
        }
        collected.push(event);
    }

    let result = terminal(&collected);
    assert_eq!(result.status, RunStatus::Error);
    assert_eq!(result.error.as_deref(), Some("run cancelled"));
    assert_eq!(h.searcher.completed(), 0);
    assert_eq!(h.writer.calls(), 0);
}

#[tokio::test]
async fn test_deadline_exceeded_during_searches() {
    let searcher = Arc::new(StubSearcher::new().with_default_delay(Duration::from_secs(30)));
    let orchestrator = ResearchOrchestrator::new(
        Arc::new(StubPlanner::numbered(3)),
        searcher.clone(),
        Arc::new(RecordingWriter::new()),
        Arc::new(StubDelivery::previewing()),
    )
    .with_options(RunOptions {
        max_concurrent_searches: None,
        run_timeout: Some(Duration::from_millis(100)),
    });

    let result = terminal(&collect(&orchestrator, "tides").await);

    assert_eq!(result.status, RunStatus::Error);
    assert_eq!(result.error.as_deref(), Some("run deadline exceeded"));
    assert_eq!(searcher.completed(), 0);
}

#[tokio::test]
async fn test_cancellation_during_delivery_keeps_report() {
    let h = harness(
        StubPlanner::numbered(2),
        StubSearcher::new(),
        RecordingWriter::new(),
        StubDelivery::previewing().slow(Duration::from_secs(30)),
    );
    let cancel = CancellationToken::new();
    let mut events = h
        .orchestrator
        .run_cancellable("tides", DeliveryMode::Send, cancel.clone());

    let mut collected = Vec::new();
    while let Some(event) = events.next().await {
        if event.message() == Some("report ready") {
            cancel.cancel();
        }
        collected.push(event);
    }

    let result = terminal(&collected);
    assert_eq!(result.status, RunStatus::Success);
    assert!(result.report.is_some());
    assert_eq!(
        result.delivery,
        Some(DeliveryOutcome::failed("run cancelled"))
    );
}

#[tokio::test]
async fn test_dropping_stream_aborts_searches() {
    let searcher = Arc::new(StubSearcher::new().with_default_delay(Duration::from_millis(200)));
    let orchestrator = ResearchOrchestrator::new(
        Arc::new(StubPlanner::numbered(4)),
        searcher.clone(),
        Arc::new(RecordingWriter::new()),
        Arc::new(StubDelivery::previewing()),
    );

    let mut events = orchestrator.run("tides", DeliveryMode::Preview);
    while let Some(event) = events.next().await {
        if event.message().is_some_and(|m| m.starts_with("plan ready")) {
            break;
        }
    }
    // Resume the run so the searches get spawned, then give up on it.
    let pending = tokio::time::timeout(Duration::from_millis(20), events.next()).await;
    assert!(pending.is_err());
    drop(events);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(searcher.completed(), 0);
}

#[tokio::test]
async fn test_concurrency_cap_is_respected() {
    let searcher = Arc::new(StubSearcher::new().with_default_delay(Duration::from_millis(50)));
    let orchestrator = ResearchOrchestrator::new(
        Arc::new(StubPlanner::numbered(6)),
        searcher.clone(),
        Arc::new(RecordingWriter::new()),
        Arc::new(StubDelivery::previewing()),
    )
    .with_options(RunOptions {
        max_concurrent_searches: Some(2),
        run_timeout: None,
    });

    let result = terminal(&collect(&orchestrator, "tides").await);

    assert_eq!(result.searches_performed, 6);
    assert!(searcher.peak_concurrency() <= 2);
    assert!(searcher.peak_concurrency() >= 1);
}

#[tokio::test]
async fn test_uncapped_searches_run_together() {
    let searcher = Arc::new(StubSearcher::new().with_default_delay(Duration::from_millis(100)));
    let orchestrator = ResearchOrchestrator::new(
        Arc::new(StubPlanner::numbered(5)),
        searcher.clone(),
        Arc::new(RecordingWriter::new()),
        Arc::new(StubDelivery::previewing()),
    );

    collect(&orchestrator, "tides").await;
    assert_eq!(searcher.peak_concurrency(), 5);
}

// ============= Report sink =============

#[tokio::test]
async fn test_report_saved_to_sink() {
    let temp = TempDir::new().unwrap();
    let h = default_harness(StubSearcher::new());
    let orchestrator = h
        .orchestrator
        .clone()
        .with_sink(ReportSink::new(temp.path()));

    let result = terminal(&collect(&orchestrator, "solar sails").await);

    let file = result.report_file.expect("report file recorded");
    assert!(file.contains("report_solar_sails_"));
    let html = std::fs::read_to_string(&file).unwrap();
    assert!(html.contains(&summary_for("q1").lines().next().unwrap().to_string()));
}

#[tokio::test]
async fn test_sink_failure_is_not_fatal() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not-a-dir");
    std::fs::write(&blocker, "file in the way").unwrap();

    let h = default_harness(StubSearcher::new());
    let orchestrator = h.orchestrator.clone().with_sink(ReportSink::new(&blocker));

    let result = terminal(&collect(&orchestrator, "tides").await);
    assert_eq!(result.status, RunStatus::Success);
    assert!(result.report_file.is_none());
}

#[tokio::test]
async fn test_run_to_completion_returns_terminal_record() {
    let h = default_harness(StubSearcher::new());
    let result = h
        .orchestrator
        .run_to_completion("tides", DeliveryMode::Preview, CancellationToken::new())
        .await;

    assert!(result.is_success());
    assert_eq!(result.searches_performed, 5);
    assert!(matches!(
        result.delivery,
        Some(DeliveryOutcome::Previewed { .. })
    ));
}
