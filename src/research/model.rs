//! Value types flowing through a research run.
//!
//! Data only moves forward: topic → [`SearchPlan`] → [`SearchResult`]s →
//! [`Report`] → [`DeliveryOutcome`], with a single [`RunResult`] closing the
//! progress stream.

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Searches per plan unless configured otherwise.
pub const DEFAULT_SEARCH_COUNT: usize = 5;

// ============= Planning =============

/// One search the planner wants performed, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchItem {
    /// The search term sent to the web search provider
    pub query: String,
    /// Why this search matters for the topic
    #[serde(default)]
    pub reason: String,
}

impl SearchItem {
    pub fn new(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            reason: reason.into(),
        }
    }
}

/// Ordered, fixed-size set of searches for one run.
///
/// Only constructible through [`SearchPlan::new`], which enforces the
/// cardinality and non-empty queries; there is no way to mutate it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SearchPlan {
    items: Vec<SearchItem>,
}

impl SearchPlan {
    /// Build a plan holding exactly `expected` items.
    pub fn new(items: Vec<SearchItem>, expected: usize) -> Result<Self> {
        if items.len() != expected {
            return Err(AppError::InvalidInput(format!(
                "search plan must contain {} items, got {}",
                expected,
                items.len()
            )));
        }
        if let Some(position) = items.iter().position(|item| item.query.trim().is_empty()) {
            return Err(AppError::InvalidInput(format!(
                "search plan item {} has an empty query",
                position + 1
            )));
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[SearchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Outcome of one search: a bounded summary ending in a `Sources:` list, or
/// nothing when the search failed.
pub type SearchResult = Option<String>;

// ============= Report =============

/// A source referenced by a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

/// The written research report. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Report {
    /// Topic the report answers
    pub topic: String,
    /// Two or three sentence summary of the findings
    pub short_summary: String,
    /// Long-form markdown document ending in a `## References` section
    pub body: String,
    /// Suggested topics for further research
    pub follow_up_topics: Vec<String>,
    /// Every source cited by the body, in reference-number order
    #[serde(default)]
    pub references: Vec<Citation>,
}

impl Report {
    /// Placeholder report used when no search produced anything.
    pub fn no_research(topic: &str) -> Self {
        let body = format!(
            "# {topic}\n\n\
             ## No research found\n\n\
             None of the planned web searches returned usable results, so this report \
             contains no findings. Try rephrasing the topic, narrowing it, or running \
             the research again later.\n"
        );

        Self {
            topic: topic.to_string(),
            short_summary: format!("No research results were found for \"{}\".", topic),
            body,
            follow_up_topics: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Final display document: query, executive summary, body and numbered
    /// follow-up topics.
    pub fn to_markdown(&self) -> String {
        let mut document = format!(
            "## Final Research Report\n\n\
             **Query:** {}\n\n\
             **Executive Summary:** {}\n\n\
             ---\n\n\
             {}\n\n\
             ---\n",
            self.topic,
            self.short_summary,
            self.body.trim_end()
        );

        if !self.follow_up_topics.is_empty() {
            document.push_str("\n### Recommended Follow-up Research Topics\n\n");
            for (index, topic) in self.follow_up_topics.iter().enumerate() {
                document.push_str(&format!("{}. {}\n", index + 1, topic));
            }
        }

        document
    }
}

// ============= Delivery =============

/// What the delivery step should do with a finished report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Render and send the report by email
    Send,
    /// Render the report and return the content without sending
    #[default]
    Preview,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Send => write!(f, "send"),
            DeliveryMode::Preview => write!(f, "preview"),
        }
    }
}

/// Result of the delivery step. Failure here never fails the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Sent,
    Previewed { content: String },
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        DeliveryOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DeliveryOutcome::Failed { .. })
    }

    /// One-line status suitable for a progress message
    pub fn summary(&self) -> String {
        match self {
            DeliveryOutcome::Sent => "email sent".to_string(),
            DeliveryOutcome::Previewed { content } => {
                format!("email preview generated ({} chars)", content.len())
            }
            DeliveryOutcome::Failed { reason } => format!("delivery failed: {}", reason),
        }
    }
}

// ============= Run lifecycle =============

/// Stage of a research run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Planning,
    Searching,
    Writing,
    Delivering,
    Done,
    Failed,
}

impl RunState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Planning)
                | (Idle, Failed)
                | (Planning, Searching)
                | (Planning, Failed)
                | (Searching, Writing)
                | (Searching, Failed)
                | (Writing, Delivering)
                | (Writing, Failed)
                | (Delivering, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Planning => "planning",
            RunState::Searching => "searching",
            RunState::Writing => "writing",
            RunState::Delivering => "delivering",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Terminal record of a run. Exactly one closes every progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RunResult {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub topic: String,
    /// Searches in the accepted plan (0 if planning never finished)
    pub searches_planned: usize,
    /// Searches that produced a result
    pub searches_performed: usize,
    pub duration_ms: u64,
    /// The report; present exactly when `status` is `Success`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryOutcome>,
    /// Where the rendered HTML report was saved, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// One element of a run's progress stream.
///
/// Intermediate elements are [`ProgressEvent::Progress`] messages; the last
/// element is always the single [`ProgressEvent::Finished`] record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress { stage: RunState, message: String },
    Finished(RunResult),
}

impl ProgressEvent {
    pub fn progress(stage: RunState, message: impl Into<String>) -> Self {
        ProgressEvent::Progress {
            stage,
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Finished(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ProgressEvent::Progress { message, .. } => Some(message),
            ProgressEvent::Finished(_) => None,
        }
    }

    pub fn stage(&self) -> Option<RunState> {
        match self {
            ProgressEvent::Progress { stage, .. } => Some(*stage),
            ProgressEvent::Finished(_) => None,
        }
    }

    pub fn into_result(self) -> Option<RunResult> {
        match self {
            ProgressEvent::Finished(result) => Some(result),
            ProgressEvent::Progress { .. } => None,
        }
    }
}
