//! Planning stage: topic → fixed-size [`SearchPlan`].

use crate::llm::LLMClient;
use crate::research::agent::AgentSpec;
use crate::research::model::{SearchItem, SearchPlan};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[async_trait]
pub trait Planner: Send + Sync {
    /// Produce exactly the configured number of searches for `topic`.
    ///
    /// `topic` is already trimmed and non-empty. Any failure is fatal to the run.
    async fn plan(&self, topic: &str) -> Result<SearchPlan>;
}

#[derive(Debug, Deserialize)]
struct PlannerOutput {
    searches: Vec<SearchItem>,
}

/// Planner that asks a language model for a diverse set of searches.
pub struct LlmPlanner {
    llm: Arc<dyn LLMClient>,
    agent: AgentSpec,
    search_count: usize,
}

impl LlmPlanner {
    pub fn new(llm: Arc<dyn LLMClient>, search_count: usize) -> Self {
        Self {
            llm,
            agent: AgentSpec::new("planner", planner_instructions(search_count)),
            search_count,
        }
    }

    pub fn search_count(&self) -> usize {
        self.search_count
    }

    /// Turn raw model output into a plan of exactly `search_count` items.
    fn accept(&self, output: PlannerOutput) -> Result<SearchPlan> {
        let proposed = output.searches.len();
        let mut items: Vec<SearchItem> = output
            .searches
            .into_iter()
            .filter(|item| !item.query.trim().is_empty())
            .map(|item| SearchItem::new(item.query.trim(), item.reason.trim()))
            .collect();

        if items.len() < self.search_count {
            return Err(AppError::invalid_output(
                &self.agent.name,
                format!(
                    "expected {} searches with non-empty queries, got {}",
                    self.search_count,
                    items.len()
                ),
            ));
        }

        if items.len() > self.search_count {
            tracing::debug!(
                proposed,
                kept = self.search_count,
                "planner proposed extra searches, truncating"
            );
            items.truncate(self.search_count);
        }

        SearchPlan::new(items, self.search_count)
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn plan(&self, topic: &str) -> Result<SearchPlan> {
        let input = format!("Query: {}", topic);
        let output: PlannerOutput = self
            .agent
            .invoke_structured(self.llm.as_ref(), &input)
            .await?;

        self.accept(output)
    }
}

fn planner_instructions(search_count: usize) -> String {
    format!(
        r#"You are a research planner. Given a query, decide which web searches to run so the query can be answered thoroughly.
Produce exactly {count} distinct search terms, each covering a different angle of the topic.

Good plans mix searches about:
- recent developments and news
- technical details and how things work
- industry analysis and expert opinion
- comparisons with alternatives
- future trends and implications

Respond with JSON only, in this shape:
{{"searches": [{{"reason": "why this search matters", "query": "the search term"}}]}}

The "searches" array must contain exactly {count} entries."#,
        count = search_count
    )
}
