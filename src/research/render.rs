//! Markdown → self-contained HTML document for email and the report sink.

use crate::research::model::Report;
use pulldown_cmark::{html, Options, Parser};

const EMAIL_STYLE: &str = r#"body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px; }
h1 { color: #2c3e50; border-bottom: 2px solid #eee; padding-bottom: 8px; }
h2 { color: #34495e; margin-top: 28px; }
h3 { color: #7f8c8d; }
table { border-collapse: collapse; width: 100%; margin: 16px 0; }
th, td { border: 1px solid #ddd; padding: 12px; text-align: left; }
th { background-color: #f2f2f2; }
code { background-color: #f6f8fa; padding: 2px 4px; border-radius: 3px; }
blockquote { border-left: 4px solid #ddd; margin: 0; padding-left: 16px; color: #666; }
.summary { background-color: #f8f9fa; border-left: 4px solid #2c3e50; padding: 12px 16px; }"#;

/// Subject line used for emailed reports.
pub fn email_subject(topic: &str) -> String {
    format!("Research Report: {}", topic)
}

/// Convert markdown to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// Full HTML document for `report`: summary block, body and follow-up topics.
pub fn render_report_html(report: &Report) -> String {
    let mut content = String::new();

    if !report.short_summary.is_empty() {
        content.push_str(&format!(
            "<div class=\"summary\"><strong>Summary:</strong> {}</div>\n",
            escape_html(&report.short_summary)
        ));
    }

    content.push_str(&markdown_to_html(&report.body));

    if !report.follow_up_topics.is_empty() {
        content.push_str("<h2>Recommended Follow-up Research Topics</h2>\n<ol>\n");
        for topic in &report.follow_up_topics {
            content.push_str(&format!("<li>{}</li>\n", escape_html(topic)));
        }
        content.push_str("</ol>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
{style}
</style>
</head>
<body>
{content}</body>
</html>
"#,
        title = escape_html(&email_subject(&report.topic)),
        style = EMAIL_STYLE,
        content = content
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
