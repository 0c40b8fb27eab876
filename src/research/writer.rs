//! Writing stage: topic + surviving search summaries → [`Report`].

use crate::llm::LLMClient;
use crate::research::agent::AgentSpec;
use crate::research::citations::{collect_citations, numbered_sources, with_reference_section};
use crate::research::model::Report;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[async_trait]
pub trait Writer: Send + Sync {
    /// Write the report. `results` may be empty; failure is fatal to the run.
    async fn write(&self, topic: &str, results: &[String]) -> Result<Report>;
}

/// Writer reply. Models name the fields inconsistently and sometimes send
/// more than one spelling, so each spelling is its own optional field.
#[derive(Debug, Deserialize)]
struct WriterOutput {
    short_summary: String,
    #[serde(default)]
    markdown_report: Option<String>,
    #[serde(default)]
    report: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    follow_up_questions: Option<Vec<String>>,
    #[serde(default)]
    follow_up_topics: Option<Vec<String>>,
}

impl WriterOutput {
    /// First non-blank report body, preferring `markdown_report`.
    fn report_body(&self) -> Option<&str> {
        [&self.markdown_report, &self.report, &self.body]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|text| !text.trim().is_empty())
    }

    fn follow_ups(self) -> Vec<String> {
        self.follow_up_questions
            .or(self.follow_up_topics)
            .unwrap_or_default()
    }
}

pub struct LlmWriter {
    llm: Arc<dyn LLMClient>,
    agent: AgentSpec,
}

impl LlmWriter {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self {
            llm,
            agent: AgentSpec::new("writer", WRITER_INSTRUCTIONS),
        }
    }
}

#[async_trait]
impl Writer for LlmWriter {
    async fn write(&self, topic: &str, results: &[String]) -> Result<Report> {
        if results.is_empty() {
            tracing::warn!(topic, "no search results survived, writing placeholder report");
            return Ok(Report::no_research(topic));
        }

        let references = collect_citations(results);

        let mut input = format!("Original query: {}\n\nSummarized search results:\n", topic);
        for (index, summary) in results.iter().enumerate() {
            input.push_str(&format!("\n### Result {}\n{}\n", index + 1, summary));
        }
        input.push_str("\nNumbered sources (cite these as [n]):\n");
        input.push_str(&numbered_sources(&references));

        let output: WriterOutput = self
            .agent
            .invoke_structured(self.llm.as_ref(), &input)
            .await?;

        let body = match output.report_body() {
            Some(text) => with_reference_section(text, &references),
            None => {
                return Err(AppError::invalid_output(
                    &self.agent.name,
                    "markdown_report is empty",
                ))
            }
        };
        let short_summary = output.short_summary.trim().to_string();

        Ok(Report {
            topic: topic.to_string(),
            short_summary,
            body,
            follow_up_topics: output
                .follow_ups()
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            references,
        })
    }
}

const WRITER_INSTRUCTIONS: &str = r#"You are a senior researcher writing a cohesive report for a research query.
You are given the query, summaries produced by research assistants, and a numbered list of sources.
Outline the report first, then write it in full.

The report is markdown, long and detailed: aim for at least 1000 words with headings, lists and tables where they help.
Cite sources in the text with bracketed numbers such as [1] or [2] that match the numbered source list.
Do not write a references section; one is appended automatically.

Respond with JSON only, in this shape:
{"short_summary": "2-3 sentence summary of the findings", "markdown_report": "the full report", "follow_up_questions": ["topic to research further"]}"#;
