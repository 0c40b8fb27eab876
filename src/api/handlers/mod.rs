//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Health check handler.
pub mod health;
/// Research run handlers (streaming and synchronous).
pub mod research;
