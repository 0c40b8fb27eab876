//! Research run orchestration
//!
//! A run moves through `Planning → Searching → Writing → Delivering → Done`
//! and is observed as a stream of [`ProgressEvent`]s that always ends with
//! exactly one [`ProgressEvent::Finished`] record.
//!
//! Searches are spawned into a [`JoinSet`] owned by the run and collected in
//! completion order. Dropping the stream, cancelling the run's token or
//! passing its deadline aborts every search still in flight.

use crate::llm::{LLMClient, Provider};
use crate::research::delivery::{Delivery, EmailDelivery};
use crate::research::model::{
    DeliveryMode, DeliveryOutcome, ProgressEvent, Report, RunResult, RunState, RunStatus,
};
use crate::research::planner::{LlmPlanner, Planner};
use crate::research::searcher::{Searcher, WebSearcher};
use crate::research::sink::ReportSink;
use crate::research::writer::{LlmWriter, Writer};
use crate::tools::email::ResendMailer;
use crate::tools::search::DaedraSearch;
use crate::types::{AppError, Result};
use crate::utils::toml_config::ResearchConfig;
use async_stream::stream;
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Progress of one run. Finite, forward-only and single-consumer.
pub type ProgressStream = Pin<Box<dyn Stream<Item = ProgressEvent> + Send>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Searches allowed in flight at once; `None` runs the whole plan together
    pub max_concurrent_searches: Option<usize>,
    /// Overall deadline measured from the start of the run
    pub run_timeout: Option<Duration>,
}

#[derive(Clone)]
pub struct ResearchOrchestrator {
    planner: Arc<dyn Planner>,
    searcher: Arc<dyn Searcher>,
    writer: Arc<dyn Writer>,
    delivery: Arc<dyn Delivery>,
    sink: Option<Arc<ReportSink>>,
    options: RunOptions,
}

impl ResearchOrchestrator {
    pub fn new(
        planner: Arc<dyn Planner>,
        searcher: Arc<dyn Searcher>,
        writer: Arc<dyn Writer>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            planner,
            searcher,
            writer,
            delivery,
            sink: None,
            options: RunOptions::default(),
        }
    }

    /// Save every successful report's HTML through `sink`.
    pub fn with_sink(mut self, sink: ReportSink) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Wire the production pipeline from configuration.
    pub async fn from_config(config: &ResearchConfig) -> Result<Self> {
        let provider = Provider::from_config(&config.provider)?;
        let llm: Arc<dyn LLMClient> = Arc::from(provider.create_client().await?);
        let research = &config.research;

        let planner = LlmPlanner::new(llm.clone(), research.searches_per_plan);
        let searcher = WebSearcher::new(
            Arc::new(DaedraSearch::new()),
            llm.clone(),
            research.results_per_search,
            research.summary_word_limit,
        );
        let writer = LlmWriter::new(llm);
        let delivery = EmailDelivery::new(ResendMailer::from_config(&config.delivery)?);

        tracing::info!(
            provider = provider.name(),
            model = provider.model(),
            searches = research.searches_per_plan,
            email = delivery.can_send(),
            "research pipeline configured"
        );

        let orchestrator = Self::new(
            Arc::new(planner),
            Arc::new(searcher),
            Arc::new(writer),
            Arc::new(delivery),
        )
        .with_options(RunOptions {
            max_concurrent_searches: research.max_concurrent_searches,
            run_timeout: config.run_timeout(),
        });

        Ok(if config.output.save_html {
            orchestrator.with_sink(ReportSink::new(config.output.directory.clone()))
        } else {
            orchestrator
        })
    }

    /// Start a run that can only be stopped by dropping the stream.
    pub fn run(&self, topic: impl Into<String>, mode: DeliveryMode) -> ProgressStream {
        self.run_cancellable(topic, mode, CancellationToken::new())
    }

    /// Drive a run to its terminal record, discarding progress messages.
    pub async fn run_to_completion(
        &self,
        topic: impl Into<String>,
        mode: DeliveryMode,
        cancel: CancellationToken,
    ) -> RunResult {
        let topic = topic.into();
        let mut events = self.run_cancellable(topic.clone(), mode, cancel);
        while let Some(event) = events.next().await {
            if let ProgressEvent::Finished(result) = event {
                return result;
            }
        }

        RunTracker::new(topic).fail(&AppError::Internal(
            "progress stream ended without a result".to_string(),
        ))
    }

    /// Start a run that also stops when `cancel` fires.
    ///
    /// Nothing happens until the stream is polled.
    pub fn run_cancellable(
        &self,
        topic: impl Into<String>,
        mode: DeliveryMode,
        cancel: CancellationToken,
    ) -> ProgressStream {
        let this = self.clone();
        let topic = topic.into().trim().to_string();

        Box::pin(stream! {
            let mut run = RunTracker::new(topic.clone());
            let deadline = this.options.run_timeout.map(|timeout| Instant::now() + timeout);

            if topic.is_empty() {
                yield ProgressEvent::Finished(
                    run.fail(&AppError::InvalidInput("topic must not be empty".to_string())),
                );
                return;
            }

            tracing::info!(run_id = %run.run_id, topic = %topic, mode = %mode, "research run started");

            // Planning
            run.advance(RunState::Planning);
            yield ProgressEvent::progress(RunState::Planning, "starting");

            let plan = match guard(this.planner.plan(&topic), &cancel, deadline).await {
                Ok(Ok(plan)) => plan,
                Ok(Err(e)) | Err(e) => {
                    yield ProgressEvent::Finished(run.fail(&e));
                    return;
                }
            };
            run.searches_planned = plan.len();

            // Searching
            run.advance(RunState::Searching);
            tracing::info!(run_id = %run.run_id, searches = plan.len(), "plan ready");
            yield ProgressEvent::progress(
                RunState::Searching,
                format!("plan ready: {} searches", plan.len()),
            );

            let limiter = this
                .options
                .max_concurrent_searches
                .map(|permits| Arc::new(Semaphore::new(permits)));
            let mut tasks = JoinSet::new();
            for (index, item) in plan.items().iter().cloned().enumerate() {
                let searcher = this.searcher.clone();
                let limiter = limiter.clone();
                tasks.spawn(async move {
                    let _permit = match limiter {
                        Some(limiter) => limiter.acquire_owned().await.ok(),
                        None => None,
                    };
                    tracing::debug!(query = %item.query, "search started");
                    (index, searcher.search(&item).await)
                });
            }

            let total = plan.len();
            let mut settled = 0;
            let mut results: Vec<String> = Vec::with_capacity(total);
            loop {
                let joined = match guard(tasks.join_next(), &cancel, deadline).await {
                    Ok(Some(joined)) => joined,
                    Ok(None) => break,
                    Err(e) => {
                        tasks.abort_all();
                        yield ProgressEvent::Finished(run.fail(&e));
                        return;
                    }
                };

                settled += 1;
                match joined {
                    Ok((_, Some(summary))) => results.push(summary),
                    Ok((index, None)) => {
                        tracing::debug!(query = %plan.items()[index].query, "search produced no result");
                    }
                    Err(e) => {
                        tracing::warn!(run_id = %run.run_id, error = %e, "search task did not complete");
                    }
                }
                yield ProgressEvent::progress(
                    RunState::Searching,
                    format!("{}/{} searches completed", settled, total),
                );
            }
            run.searches_performed = results.len();

            // Writing
            run.advance(RunState::Writing);
            tracing::info!(
                run_id = %run.run_id,
                succeeded = results.len(),
                planned = total,
                "searches complete"
            );
            yield ProgressEvent::progress(
                RunState::Writing,
                format!("searches complete: {}/{} succeeded", results.len(), total),
            );

            let report = match guard(this.writer.write(&topic, &results), &cancel, deadline).await {
                Ok(Ok(report)) => report,
                Ok(Err(e)) | Err(e) => {
                    yield ProgressEvent::Finished(run.fail(&e));
                    return;
                }
            };

            // Delivering
            run.advance(RunState::Delivering);
            yield ProgressEvent::progress(RunState::Delivering, "report ready");

            let delivery = match guard(this.delivery.deliver(&report, mode), &cancel, deadline).await {
                Ok(outcome) => outcome,
                Err(e) => DeliveryOutcome::failed(e.to_string()),
            };
            if let DeliveryOutcome::Failed { reason } = &delivery {
                tracing::warn!(run_id = %run.run_id, reason = %reason, "delivery failed, keeping report");
            }

            let report_file = match &this.sink {
                Some(sink) => match sink.save(&report).await {
                    Ok(path) => Some(path.display().to_string()),
                    Err(e) => {
                        tracing::warn!(run_id = %run.run_id, error = %e, "failed to save report");
                        None
                    }
                },
                None => None,
            };

            // Done
            yield ProgressEvent::progress(RunState::Done, delivery.summary());
            yield ProgressEvent::progress(RunState::Done, report.to_markdown());
            yield ProgressEvent::Finished(run.finish(report, delivery, report_file));
        })
    }
}

/// Race a stage against cancellation and the run deadline.
async fn guard<F: Future>(
    stage: F,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> std::result::Result<F::Output, AppError> {
    let expired = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        _ = expired => Err(AppError::DeadlineExceeded),
        output = stage => Ok(output),
    }
}

/// Bookkeeping for the terminal record of one run.
struct RunTracker {
    run_id: Uuid,
    topic: String,
    started: Instant,
    state: RunState,
    searches_planned: usize,
    searches_performed: usize,
}

impl RunTracker {
    fn new(topic: String) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            topic,
            started: Instant::now(),
            state: RunState::Idle,
            searches_planned: 0,
            searches_performed: 0,
        }
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal run transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }

    fn duration_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn fail(&mut self, error: &AppError) -> RunResult {
        tracing::error!(
            run_id = %self.run_id,
            topic = %self.topic,
            stage = %self.state,
            error = %error,
            "research run failed"
        );
        self.advance(RunState::Failed);

        RunResult {
            run_id: self.run_id,
            status: RunStatus::Error,
            topic: self.topic.clone(),
            searches_planned: self.searches_planned,
            searches_performed: self.searches_performed,
            duration_ms: self.duration_ms(),
            report: None,
            delivery: None,
            report_file: None,
            error: Some(error.to_string()),
        }
    }

    fn finish(
        &mut self,
        report: Report,
        delivery: DeliveryOutcome,
        report_file: Option<String>,
    ) -> RunResult {
        self.advance(RunState::Done);
        let duration_ms = self.duration_ms();
        tracing::info!(
            run_id = %self.run_id,
            topic = %self.topic,
            searches = self.searches_performed,
            duration_ms,
            "research run finished"
        );

        RunResult {
            run_id: self.run_id,
            status: RunStatus::Success,
            topic: self.topic.clone(),
            searches_planned: self.searches_planned,
            searches_performed: self.searches_performed,
            duration_ms,
            report: Some(report),
            delivery: Some(delivery),
            report_file,
            error: None,
        }
    }
}
