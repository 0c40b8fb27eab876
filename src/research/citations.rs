//! Source citation bookkeeping
//!
//! Search summaries end with a `Sources:` line of markdown links. The writer
//! needs every distinct URL across all summaries, numbered in the order it
//! was first seen, so that `[n]` markers in the report body and the final
//! `## References` list agree.

use crate::research::model::Citation;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// URLs may hold one level of balanced parentheses, as Wikipedia titles do.
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"\[([^\[\]]*)\]\((https?://(?:[^\s()]|\([^\s()]*\))+)\)"#,
        r#"|(https?://(?:[^\s<>()\[\]"']|\([^\s<>()\[\]"']*\))+)"#,
    ))
    .expect("valid regex")
});

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*+]\s|\d+[.)]\s|\[\d+\])").expect("valid regex")
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

/// All citations in `text`, in text order, duplicates included.
///
/// Markdown links keep their label as title. Bare URLs use the URL itself.
pub fn extract_citations(text: &str) -> Vec<Citation> {
    LINK_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            if let (Some(label), Some(url)) = (caps.get(1), caps.get(2)) {
                let url = url.as_str().trim_end_matches(TRAILING_PUNCTUATION);
                let title = label.as_str().trim();
                let title = if title.is_empty() { url } else { title };
                return Some(Citation {
                    title: title.to_string(),
                    url: url.to_string(),
                });
            }

            let url = caps.get(3)?.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            (url.len() > "https://".len()).then(|| Citation {
                title: url.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

/// Distinct citations across `summaries`, in first-seen order.
///
/// A URL first seen bare picks up the label of a later markdown link to it.
pub fn collect_citations<S: AsRef<str>>(summaries: &[S]) -> Vec<Citation> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut citations: Vec<Citation> = Vec::new();

    for citation in summaries
        .iter()
        .flat_map(|summary| extract_citations(summary.as_ref()))
    {
        match seen.get(&citation.url) {
            Some(&index) => {
                let existing = &mut citations[index];
                if existing.title == existing.url && citation.title != citation.url {
                    existing.title = citation.title;
                }
            }
            None => {
                seen.insert(citation.url.clone(), citations.len());
                citations.push(citation);
            }
        }
    }

    citations
}

/// Whether `line` opens a sources or references section.
///
/// The keyword must stand alone, optionally followed by a colon and then
/// nothing but links. `Sources: IEA 2024 estimates` is a caption, not a
/// heading.
fn is_source_heading(line: &str) -> bool {
    let normalized = line
        .trim()
        .trim_start_matches('#')
        .trim_start_matches(['*', '_'])
        .trim_start()
        .to_lowercase();

    ["sources", "references", "source list"]
        .iter()
        .any(|word| match normalized.strip_prefix(word) {
            Some(rest) => {
                let rest = rest.trim_start_matches(['*', '_', ' ']);
                match rest.strip_prefix(':') {
                    Some(after) => only_links(after.trim_start_matches(['*', '_'])),
                    None => rest.is_empty(),
                }
            }
            None => false,
        })
}

/// Whether `text` holds nothing but links and separators.
fn only_links(text: &str) -> bool {
    LINK_PATTERN
        .replace_all(text, "")
        .chars()
        .all(|c| c.is_whitespace() || matches!(c, ',' | ';' | '-' | '|'))
}

/// Whether `line` can belong to a reference list: blank, a list entry or a link.
fn is_reference_line(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || LIST_MARKER.is_match(line) || LINK_PATTERN.is_match(line)
}

/// Remove a trailing model-written sources/references section.
///
/// The cut happens at the last heading that is followed only by list
/// entries or links, so captions and later sections are never dropped.
pub fn strip_source_section(text: &str) -> &str {
    let mut offset = 0;
    let mut cut = None;

    for line in text.split_inclusive('\n') {
        if is_source_heading(line) {
            cut = cut.or(Some(offset));
        } else if !is_reference_line(line) {
            cut = None;
        }
        offset += line.len();
    }

    match cut {
        Some(position) => text[..position].trim_end(),
        None => text.trim_end(),
    }
}

/// `Sources: [title](url), [title](url)` line appended to search summaries.
pub fn sources_line(citations: &[Citation]) -> String {
    let links: Vec<String> = citations
        .iter()
        .map(|c| format!("[{}]({})", escape_label(&c.title), c.url))
        .collect();
    format!("Sources: {}", links.join(", "))
}

/// Numbered `## References` section.
pub fn render_reference_list(citations: &[Citation]) -> String {
    let mut section = String::from("## References\n\n");
    if citations.is_empty() {
        section.push_str("No sources were available for this report.\n");
        return section;
    }

    for (index, citation) in citations.iter().enumerate() {
        section.push_str(&format!(
            "{}. [{}]({})\n",
            index + 1,
            escape_label(&citation.title),
            citation.url
        ));
    }
    section
}

/// Replace whatever reference section `body` ends with by the canonical one.
pub fn with_reference_section(body: &str, citations: &[Citation]) -> String {
    format!(
        "{}\n\n{}",
        strip_source_section(body),
        render_reference_list(citations)
    )
}

/// Numbered source list handed to the writer so its `[n]` markers line up.
pub fn numbered_sources(citations: &[Citation]) -> String {
    citations
        .iter()
        .enumerate()
        .map(|(index, c)| format!("[{}] {} - {}", index + 1, c.title, c.url))
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_label(title: &str) -> String {
    title.replace('[', "(").replace(']', ")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn urls(citations: &[Citation]) -> Vec<&str> {
        citations.iter().map(|c| c.url.as_str()).collect()
    }

    #[test]
    fn test_extract_markdown_and_bare_links() {
        let text = "See [Rust Book](https://doc.rust-lang.org/book/) and https://tokio.rs.";
        let citations = extract_citations(text);
        assert_eq!(
            urls(&citations),
            vec!["https://doc.rust-lang.org/book/", "https://tokio.rs"]
        );
        assert_eq!(citations[0].title, "Rust Book");
        assert_eq!(citations[1].title, "https://tokio.rs");
    }

    #[test]
    fn test_collect_dedupes_in_first_seen_order() {
        let summaries = vec![
            "Alpha. Sources: [One](https://u1.example), [Two](https://u2.example)".to_string(),
            "Beta. Sources: [Two again](https://u2.example), [Three](https://u3.example)"
                .to_string(),
        ];
        let citations = collect_citations(&summaries);
        assert_eq!(
            urls(&citations),
            vec!["https://u1.example", "https://u2.example", "https://u3.example"]
        );
        assert_eq!(citations[1].title, "Two");
    }

    #[test]
    fn test_bare_url_upgraded_by_later_label() {
        let citations = collect_citations(&[
            "raw https://u1.example/page",
            "Sources: [Page](https://u1.example/page)",
        ]);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].title, "Page");
    }

    #[rstest]
    #[case("Sources: [a](https://a.example)")]
    #[case("**Sources:**")]
    #[case("## References")]
    #[case("References:")]
    #[case("### Sources")]
    fn test_source_headings_recognized(#[case] line: &str) {
        assert!(is_source_heading(line));
    }

    #[rstest]
    #[case("Sources of funding vary widely.")]
    #[case("The references below are partial.")]
    #[case("## Background")]
    #[case("Sources: IEA 2024 estimates")]
    #[case("**References:** see the appendix")]
    fn test_prose_is_not_a_heading(#[case] line: &str) {
        assert!(!is_source_heading(line));
    }

    #[test]
    fn test_strip_source_section_keeps_prose() {
        let text = "Para one.\n\nPara two.\n\nSources: [x](https://x.example)\n";
        assert_eq!(strip_source_section(text), "Para one.\n\nPara two.");
        assert_eq!(strip_source_section("No list here.\n"), "No list here.");
    }

    #[test]
    fn test_with_reference_section_replaces_model_list() {
        let body = "# Report\n\nText [1].\n\n## References\n\n1. bogus\n";
        let refs = vec![Citation {
            title: "Real".to_string(),
            url: "https://real.example".to_string(),
        }];
        let result = with_reference_section(body, &refs);
        assert!(!result.contains("bogus"));
        assert!(result.ends_with("## References\n\n1. [Real](https://real.example)\n"));
    }

    #[test]
    fn test_sources_line_format() {
        let line = sources_line(&[
            Citation {
                title: "A [draft]".to_string(),
                url: "https://a.example".to_string(),
            },
            Citation {
                title: "B".to_string(),
                url: "https://b.example".to_string(),
            },
        ]);
        assert_eq!(
            line,
            "Sources: [A (draft)](https://a.example), [B](https://b.example)"
        );
    }

    #[test]
    fn test_parenthesized_url_survives_sources_line() {
        let wiki = Citation {
            title: "Rust (programming language)".to_string(),
            url: "https://en.wikipedia.org/wiki/Rust_(programming_language)".to_string(),
        };
        let summary = format!("Findings.\n\n{}", sources_line(&[wiki.clone()]));

        let citations = collect_citations(&[summary]);
        assert_eq!(citations, vec![wiki]);
    }

    #[rstest]
    #[case(
        "See https://en.wikipedia.org/wiki/Tide_(disambiguation).",
        "https://en.wikipedia.org/wiki/Tide_(disambiguation)"
    )]
    #[case(
        "(background at https://energy.example/report)",
        "https://energy.example/report"
    )]
    #[case(
        "Data: https://stats.example/query?year=2024&region=eu, updated monthly",
        "https://stats.example/query?year=2024&region=eu"
    )]
    #[case(
        "[Costs](https://costs.example/a_(b)?page=2)",
        "https://costs.example/a_(b)?page=2"
    )]
    fn test_url_boundaries(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(urls(&extract_citations(text)), vec![expected]);
    }

    #[test]
    fn test_caption_mid_body_keeps_later_sections() {
        let text = "# Report\n\n## Costs\n\nTable here.\n\nSources: IEA 2024 estimates\n\n## Outlook\n\nLong important section [1].\n";
        assert_eq!(strip_source_section(text), text.trim_end());
    }

    #[test]
    fn test_heading_followed_by_prose_is_kept() {
        let text = "Intro.\n\n## References\n\nThe literature here is thin, so the next part compares pilots.\n\n## Pilots\n\nDetail.\n";
        assert_eq!(strip_source_section(text), text.trim_end());
    }

    #[test]
    fn test_trailing_list_with_several_headings_is_removed() {
        let text = "Body [1].\n\n## Sources\n\n- [A](https://a.example)\n- https://b.example\n\nReferences:\n[1] A - https://a.example\n";
        assert_eq!(strip_source_section(text), "Body [1].");
    }
}
