//! LLM Provider Clients and Abstractions
//!
//! Every research agent (planner, searcher, writer) talks to a language model
//! through the [`LLMClient`] trait. Concrete providers are selected at runtime
//! from the `[provider]` section of `deepresearch.toml`.
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `openai` - OpenAI API (GPT-4o, GPT-4o-mini, compatible endpoints)
//! - `ollama` - Local Ollama server (default)
//!
//! # Example
//!
//! ```ignore
//! use deepresearch::llm::Provider;
//!
//! let provider = Provider::from_config(&config.provider)?;
//! let client = provider.create_client().await?;
//!
//! let response = client.generate("What is 2+2?").await?;
//! println!("{}", response);
//! ```

/// Core LLM client trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, Provider};
