//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for deepresearch, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Research (`/api/research`)
//! - `POST /api/research` - Run research and stream progress as Server-Sent Events
//! - `POST /api/research/sync` - Run research and return the final result as JSON
//!
//! ## Health (`/api/health`)
//! - `GET /api/health` - Health check endpoint
//!
//! # Streaming
//!
//! The streaming endpoint emits one `progress` event per pipeline message and a
//! single `finished` event carrying the run result. Closing the connection
//! stops the run and aborts its in-flight searches.
//!
//! # OpenAPI Documentation
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`.

use crate::research::model::{
    Citation, DeliveryMode, DeliveryOutcome, Report, RunResult, RunState, RunStatus,
};
use crate::types::{HealthResponse, ResearchRequest};
use utoipa::OpenApi;

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

#[derive(OpenApi)]
#[openapi(
    info(title = "deepresearch", description = "Multi-agent deep research pipeline"),
    paths(
        handlers::health::health_check,
        handlers::research::research_stream,
        handlers::research::research_sync,
    ),
    components(schemas(
        ResearchRequest,
        HealthResponse,
        RunResult,
        RunStatus,
        RunState,
        Report,
        Citation,
        DeliveryMode,
        DeliveryOutcome,
    )),
    tags(
        (name = "research", description = "Research runs"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;
