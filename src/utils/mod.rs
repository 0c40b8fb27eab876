//! Configuration utilities.

/// `deepresearch.toml` loading and validation.
pub mod toml_config;
