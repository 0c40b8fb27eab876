//! Report sink: one rendered HTML file per run.

use crate::research::model::Report;
use crate::research::render::render_report_html;
use crate::types::Result;
use chrono::Local;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const MAX_TOPIC_CHARS: usize = 50;
const MAX_NAME_ATTEMPTS: usize = 100;

#[derive(Debug, Clone)]
pub struct ReportSink {
    dir: PathBuf,
}

impl ReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render `report` and write it to
    /// `<dir>/report_<sanitized-topic>_<YYYYMMDD_HHMMSS>.html`.
    ///
    /// Existing files are never overwritten: a second report for the same
    /// topic within the same second gets a `_2`, `_3`, ... suffix.
    pub async fn save(&self, report: &Report) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let html = render_report_html(report);

        let mut attempt = 1;
        loop {
            let stamp = if attempt == 1 {
                timestamp.clone()
            } else {
                format!("{}_{}", timestamp, attempt)
            };
            let path = self.dir.join(report_file_name(&report.topic, &stamp));

            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let mut file = match opened {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            file.write_all(html.as_bytes()).await?;
            file.flush().await?;

            tracing::info!(path = %path.display(), "report saved");
            return Ok(path);
        }
    }
}

pub fn report_file_name(topic: &str, timestamp: &str) -> String {
    format!("report_{}_{}.html", sanitize_topic(topic), timestamp)
}

/// Filesystem-safe form of a topic.
///
/// ASCII alphanumerics and `-` are kept, every other run of characters
/// becomes one `_`, and the result is capped at 50 characters.
pub fn sanitize_topic(topic: &str) -> String {
    let mut sanitized = String::with_capacity(topic.len());
    let mut pending_separator = false;

    for c in topic.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            if pending_separator && !sanitized.is_empty() {
                sanitized.push('_');
            }
            pending_separator = false;
            sanitized.push(c);
        } else {
            pending_separator = true;
        }
    }

    let capped: String = sanitized.chars().take(MAX_TOPIC_CHARS).collect();
    let capped = capped.trim_matches('_');
    if capped.is_empty() {
        "untitled".to_string()
    } else {
        capped.to_string()
    }
}
