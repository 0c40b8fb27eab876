//! Run command implementation
//!
//! Drives one research run from the terminal, printing each progress event
//! as it arrives and a summary of the terminal record at the end.

use super::output::Output;
use crate::research::model::{DeliveryMode, DeliveryOutcome, ProgressEvent, RunResult, RunState};
use crate::research::orchestrator::ResearchOrchestrator;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

const PREVIEW_CHARS: usize = 300;

/// Run research on `topic` until the terminal record arrives.
pub async fn execute(
    orchestrator: &ResearchOrchestrator,
    topic: &str,
    mode: DeliveryMode,
    cancel: CancellationToken,
    output: &Output,
) -> Option<RunResult> {
    output.header(&format!("Researching: {}", topic.trim()));

    let mut events = orchestrator.run_cancellable(topic, mode, cancel);
    while let Some(event) = events.next().await {
        match event {
            ProgressEvent::Progress { stage, message } => {
                if stage == RunState::Done && message.contains('\n') {
                    output.document(&message);
                } else {
                    output.progress(&stage.to_string(), &message);
                }
            }
            ProgressEvent::Finished(result) => {
                print_summary(&result, output);
                return Some(result);
            }
        }
    }

    None
}

/// Print the terminal record of a run.
pub fn print_summary(result: &RunResult, output: &Output) {
    output.subheader("Summary");
    output.kv("run_id", &result.run_id.to_string());
    output.kv(
        "searches",
        &format!("{}/{}", result.searches_performed, result.searches_planned),
    );
    output.kv(
        "duration",
        &format!("{:.1}s", result.duration_ms as f64 / 1000.0),
    );

    if let Some(file) = &result.report_file {
        output.kv("saved", file);
    }

    match &result.delivery {
        Some(DeliveryOutcome::Sent) => output.kv("email", "sent"),
        Some(DeliveryOutcome::Previewed { content }) => {
            output.kv("email", "preview only");
            output.document(&preview(content, PREVIEW_CHARS));
        }
        Some(DeliveryOutcome::Failed { reason }) => {
            output.warning(&format!("Email delivery failed: {}", reason))
        }
        None => {}
    }

    match &result.error {
        None => output.complete("Research complete"),
        Some(error) => output.error(&format!("Research failed: {}", error)),
    }
}

/// First `limit` characters of `content`, marked when truncated.
fn preview(content: &str, limit: usize) -> String {
    match content.char_indices().nth(limit) {
        Some((index, _)) => format!("{}...", &content[..index]),
        None => content.to_string(),
    }
}
