//! Web search provider backed by daedra
//!
//! daedra queries DuckDuckGo and returns title, URL and snippet per hit.
//! The [`SearchProvider`] trait is the seam the searcher stage depends on,
//! so tests and alternative backends can stand in for the real provider.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl WebHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query, returning up to `limit` hits.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebHit>>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// DuckDuckGo search through daedra
#[derive(Debug, Clone, Default)]
pub struct DaedraSearch;

impl DaedraSearch {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SearchProvider for DaedraSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebHit>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Search query is empty".to_string()));
        }

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: limit,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        Ok(response
            .data
            .into_iter()
            .filter(|r| !r.url.trim().is_empty())
            .take(limit)
            .map(|r| WebHit {
                title: r.title,
                url: r.url,
                snippet: r.description,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}
