//! Multi-Agent Research Pipeline
//!
//! Turns a topic into a cited research report and delivers it, streaming
//! progress the whole way.
//!
//! # Architecture
//!
//! The pipeline is a strict sequence with one fan-out stage:
//! - [`planner::Planner`] - topic → fixed-size [`model::SearchPlan`]
//! - [`searcher::Searcher`] - one search item → bounded summary (or nothing)
//! - [`writer::Writer`] - topic + surviving summaries → [`model::Report`]
//! - [`delivery::Delivery`] - report → email or preview
//! - [`orchestrator::ResearchOrchestrator`] - drives the stages and yields
//!   [`model::ProgressEvent`]s
//!
//! # Usage
//!
//! ```ignore
//! use deepresearch::research::orchestrator::ResearchOrchestrator;
//! use deepresearch::research::model::{DeliveryMode, ProgressEvent};
//! use futures::StreamExt;
//!
//! let orchestrator = ResearchOrchestrator::from_config(&config).await?;
//! let mut events = orchestrator.run("solid-state batteries", DeliveryMode::Preview);
//!
//! while let Some(event) = events.next().await {
//!     match event {
//!         ProgressEvent::Progress { message, .. } => println!("{}", message),
//!         ProgressEvent::Finished(result) => println!("{:?}", result.status),
//!     }
//! }
//! ```
//!
//! # Failure Handling
//!
//! Planning and writing failures end the run with an error record. A failed
//! search is dropped and the run continues with the rest. Delivery and report
//! saving failures are recorded but never fail a run that produced a report.

/// Agent descriptors and structured output parsing.
pub mod agent;
/// Citation extraction, deduplication and reference lists.
pub mod citations;
/// Report delivery by email or preview.
pub mod delivery;
/// Pipeline value types.
pub mod model;
/// Run orchestration and progress streaming.
pub mod orchestrator;
/// Search planning.
pub mod planner;
/// Markdown to HTML rendering.
pub mod render;
/// Per-search summarization.
pub mod searcher;
/// HTML report files.
pub mod sink;
/// Report writing.
pub mod writer;

pub use model::{
    DeliveryMode, DeliveryOutcome, ProgressEvent, Report, RunResult, RunState, RunStatus,
    SearchItem, SearchPlan, SearchResult,
};
pub use orchestrator::{ProgressStream, ResearchOrchestrator, RunOptions};
