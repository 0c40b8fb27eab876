//! Search stage: one [`SearchItem`] → one bounded summary, or nothing.
//!
//! A searcher never fails. Provider errors, empty hit lists and model errors
//! are logged and turned into an absent result so sibling searches carry on.

use crate::llm::LLMClient;
use crate::research::agent::AgentSpec;
use crate::research::citations::{sources_line, strip_source_section};
use crate::research::model::{Citation, SearchItem, SearchResult};
use crate::tools::search::{SearchProvider, WebHit};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Searcher: Send + Sync {
    /// Summarize the web results for `item`.
    ///
    /// A present result is prose followed by a final `Sources:` line of
    /// markdown links. Absent means the search failed.
    async fn search(&self, item: &SearchItem) -> SearchResult;
}

/// Searcher that fetches hits from a [`SearchProvider`] and has a language
/// model condense them.
pub struct WebSearcher {
    provider: Arc<dyn SearchProvider>,
    llm: Arc<dyn LLMClient>,
    agent: AgentSpec,
    results_per_query: usize,
    word_limit: usize,
}

impl WebSearcher {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        llm: Arc<dyn LLMClient>,
        results_per_query: usize,
        word_limit: usize,
    ) -> Self {
        Self {
            provider,
            llm,
            agent: AgentSpec::new("searcher", searcher_instructions(word_limit)),
            results_per_query,
            word_limit,
        }
    }

    fn summary_input(item: &SearchItem, hits: &[WebHit]) -> String {
        let mut input = format!("Search term: {}\n", item.query);
        if !item.reason.is_empty() {
            input.push_str(&format!("Reason for searching: {}\n", item.reason));
        }
        input.push_str("\nSearch results:\n");
        for (index, hit) in hits.iter().enumerate() {
            input.push_str(&format!(
                "{}. {} ({})\n   {}\n",
                index + 1,
                hit.title,
                hit.url,
                hit.snippet
            ));
        }
        input
    }
}

#[async_trait]
impl Searcher for WebSearcher {
    async fn search(&self, item: &SearchItem) -> SearchResult {
        let hits = match self.provider.search(&item.query, self.results_per_query).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(query = %item.query, provider = self.provider.name(), error = %e, "search failed");
                return None;
            }
        };

        if hits.is_empty() {
            tracing::debug!(query = %item.query, "search returned no hits");
            return None;
        }

        let raw = match self
            .agent
            .invoke_text(self.llm.as_ref(), &Self::summary_input(item, &hits))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(query = %item.query, error = %e, "search summary failed");
                return None;
            }
        };

        let prose = bound_words(strip_source_section(&raw), self.word_limit);
        if prose.is_empty() {
            tracing::warn!(query = %item.query, "search summary was empty");
            return None;
        }

        let citations: Vec<Citation> = hits
            .into_iter()
            .map(|hit| Citation {
                title: if hit.title.trim().is_empty() {
                    hit.url.clone()
                } else {
                    hit.title
                },
                url: hit.url,
            })
            .collect();

        tracing::debug!(query = %item.query, sources = citations.len(), "search summarized");
        Some(format!("{}\n\n{}", prose, sources_line(&citations)))
    }
}

/// Keep at most `limit` words of `text`, preserving its line structure.
pub fn bound_words(text: &str, limit: usize) -> String {
    let mut words = 0;
    let mut in_word = false;

    for (index, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
            if words > limit {
                return format!("{} ...", text[..index].trim_end());
            }
        }
    }

    text.trim().to_string()
}

fn searcher_instructions(word_limit: usize) -> String {
    format!(
        "You are a research assistant. You are given a search term and the web results found for it. \
         Write a concise summary of those results in 2-3 paragraphs and under {word_limit} words. \
         Capture the main points and skip filler; terse notes are fine because the summary will be \
         read by someone assembling a larger report. Do not list sources, they are attached separately."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppError, Result};

    struct FixedProvider(Result<Vec<WebHit>>);

    #[async_trait]
    impl SearchProvider for FixedProvider {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<WebHit>> {
            match &self.0 {
                Ok(hits) => Ok(hits.clone()),
                Err(_) => Err(AppError::Search("provider down".to_string())),
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct EchoLLM(Result<String>);

    #[async_trait]
    impl LLMClient for EchoLLM {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.generate_with_system("", prompt).await
        }

        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(AppError::LLM("model offline".to_string())),
            }
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn searcher(hits: Result<Vec<WebHit>>, summary: Result<String>, limit: usize) -> WebSearcher {
        WebSearcher::new(
            Arc::new(FixedProvider(hits)),
            Arc::new(EchoLLM(summary)),
            5,
            limit,
        )
    }

    fn item() -> SearchItem {
        SearchItem::new("tidal energy 2025", "recent developments")
    }

    #[tokio::test]
    async fn test_summary_ends_with_sources_from_hits() {
        let hits = vec![
            WebHit::new("Tidal report", "https://a.example/tides", "snippet"),
            WebHit::new("", "https://b.example", "snippet"),
        ];
        let summary = "Tidal power grew.\n\nSources: [made up](https://fake.example)";
        let result = searcher(Ok(hits), Ok(summary.to_string()), 300)
            .search(&item())
            .await
            .unwrap();

        assert!(result.starts_with("Tidal power grew."));
        assert!(!result.contains("fake.example"));
        assert!(result.ends_with(
            "Sources: [Tidal report](https://a.example/tides), [https://b.example](https://b.example)"
        ));
    }

    #[tokio::test]
    async fn test_caption_inside_summary_is_kept() {
        let hits = vec![WebHit::new(
            "Tides",
            "https://en.wikipedia.org/wiki/Tide_(disambiguation)",
            "snippet",
        )];
        let summary = "Capacity rose.\n\nSources: IEA 2024 estimates\n\nCosts fell in 2025.";
        let result = searcher(Ok(hits), Ok(summary.to_string()), 300)
            .search(&item())
            .await
            .unwrap();

        assert!(result.contains("Costs fell in 2025."));
        assert!(result.ends_with(
            "Sources: [Tides](https://en.wikipedia.org/wiki/Tide_(disambiguation))"
        ));
    }

    #[tokio::test]
    async fn test_provider_error_is_absent() {
        let result = searcher(Err(AppError::Search(String::new())), Ok("x".into()), 300)
            .search(&item())
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_no_hits_is_absent() {
        let result = searcher(Ok(vec![]), Ok("x".into()), 300)
            .search(&item())
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_model_error_is_absent() {
        let hits = vec![WebHit::new("t", "https://a.example", "s")];
        let result = searcher(Ok(hits), Err(AppError::LLM(String::new())), 300)
            .search(&item())
            .await;
        assert!(result.is_none());
    }

    #[test]
    fn test_bound_words() {
        assert_eq!(bound_words("one two three", 5), "one two three");
        assert_eq!(bound_words("one two\n\nthree four", 3), "one two\n\nthree ...");
        assert_eq!(bound_words("  padded  ", 1), "padded");
    }
}
