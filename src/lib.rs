//! # deepresearch - Multi-Agent Deep Research Pipeline
//!
//! Plans a set of web searches for a topic, runs them concurrently, writes a
//! long-form cited report from whatever came back and delivers it by email,
//! streaming progress to the caller at every step.
//!
//! ## Overview
//!
//! deepresearch can be used in two ways:
//!
//! 1. **As a standalone tool** - Run the `deepresearch` binary as a CLI or HTTP server
//! 2. **As a library** - Embed the pipeline in your own Rust project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use deepresearch::{DeliveryMode, ResearchConfig, ResearchOrchestrator};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResearchConfig::load_or_default("deepresearch.toml")?;
//!     let orchestrator = ResearchOrchestrator::from_config(&config).await?;
//!
//!     let mut events = orchestrator.run("fusion energy startups", DeliveryMode::Preview);
//!     while let Some(event) = events.next().await {
//!         println!("{:?}", event);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Custom Stages
//!
//! Every stage sits behind a trait, so any of them can be replaced:
//!
//! ```rust,ignore
//! use deepresearch::research::planner::Planner;
//! use std::sync::Arc;
//!
//! let orchestrator = ResearchOrchestrator::new(
//!     Arc::new(MyPlanner),
//!     Arc::new(my_searcher),
//!     Arc::new(my_writer),
//!     Arc::new(EmailDelivery::default()),
//! );
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `openai` | OpenAI API and compatible endpoints |
//! | `all-llm` | Both providers |
//!
//! ## Modules
//!
//! - [`research`] - Pipeline stages and orchestration
//! - [`api`] - REST and SSE handlers
//! - [`cli`] - Command-line interface
//! - [`llm`] - LLM client implementations
//! - [`tools`] - Web search and email collaborators
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Research pipeline stages and orchestration.
pub mod research;
/// External collaborators (web search, email).
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, Provider};
pub use research::{
    DeliveryMode, DeliveryOutcome, ProgressEvent, Report, ResearchOrchestrator, RunOptions,
    RunResult, RunStatus,
};
pub use types::{AppError, Result};
pub use utils::toml_config::ResearchConfig;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup
    pub config: Arc<ResearchConfig>,
    /// Pipeline shared by every request
    pub orchestrator: ResearchOrchestrator,
    /// Cancelled on shutdown; every run started by a handler uses a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: ResearchConfig, orchestrator: ResearchOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
            shutdown: CancellationToken::new(),
        }
    }
}
