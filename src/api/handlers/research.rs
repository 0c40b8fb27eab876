use crate::{
    research::model::{DeliveryMode, ProgressEvent, RunResult},
    types::{AppError, ResearchRequest, Result},
    AppState,
};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;

/// Validate a request and resolve its delivery mode
fn prepare(state: &AppState, payload: ResearchRequest) -> Result<(String, DeliveryMode)> {
    let topic = payload.topic.trim().to_string();
    if topic.is_empty() {
        return Err(AppError::InvalidInput("topic must not be empty".to_string()));
    }

    Ok((topic, payload.mode.unwrap_or(state.config.delivery.mode)))
}

fn to_sse(event: ProgressEvent) -> Event {
    let name = if event.is_terminal() {
        "finished"
    } else {
        "progress"
    };

    Event::default()
        .event(name)
        .json_data(&event)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

/// Run research on a topic, streaming progress as Server-Sent Events
#[utoipa::path(
    post,
    path = "/api/research",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Event stream of `progress` events ending in one `finished` event", body = String, content_type = "text/event-stream"),
        (status = 400, description = "Empty topic")
    ),
    tag = "research"
)]
pub async fn research_stream(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let (topic, mode) = prepare(&state, payload)?;
    tracing::info!(topic = %topic, mode = %mode, "streaming research requested");

    let events = state
        .orchestrator
        .run_cancellable(topic, mode, state.shutdown.child_token())
        .map(|event| Ok::<_, Infallible>(to_sse(event)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Run research on a topic and return the final result
#[utoipa::path(
    post,
    path = "/api/research/sync",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Run finished (check `status` for success)", body = RunResult),
        (status = 400, description = "Empty topic")
    ),
    tag = "research"
)]
pub async fn research_sync(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Json<RunResult>> {
    let (topic, mode) = prepare(&state, payload)?;
    tracing::info!(topic = %topic, mode = %mode, "synchronous research requested");

    let result = state
        .orchestrator
        .run_to_completion(topic, mode, state.shutdown.child_token())
        .await;

    Ok(Json(result))
}
