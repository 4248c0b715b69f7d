//! Fetch a web page and extract readable text

use crate::errors::{AgentError, Result};
use crate::tools::implementations::text::{html_decode, strip_quotes};
use crate::tools::types::{Tool, ToolCategory, ToolContext};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

/// Rendering width passed to html2text
const TEXT_WIDTH: usize = 100;

/// Page metadata pulled from `<head>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

/// URL fetch tool
#[derive(Debug, Clone)]
pub struct FetchUrlTool {
    context: Arc<ToolContext>,
}

impl FetchUrlTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

fn capture(pattern: &str, html: &str) -> Option<String> {
    Regex::new(pattern)
        .ok()?
        .captures(html)?
        .get(1)
        .map(|m| html_decode(m.as_str()))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `content` of `<meta name|property="key">`, either attribute order
fn meta_content(html: &str, key: &str) -> Option<String> {
    let key = regex::escape(key);
    capture(
        &format!(r#"(?is)<meta[^>]+(?:name|property)=["']{key}["'][^>]*content=["']([^"']*)["']"#),
        html,
    )
    .or_else(|| {
        capture(
            &format!(r#"(?is)<meta[^>]+content=["']([^"']*)["'][^>]*(?:name|property)=["']{key}["']"#),
            html,
        )
    })
}

fn first_meta(html: &str, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| meta_content(html, k))
}

pub fn extract_metadata(html: &str) -> PageMetadata {
    let date = first_meta(html, &["article:published_time", "date", "publish_date"])
        .or_else(|| capture(r#"(?is)<time[^>]+datetime=["']([^"']+)["']"#, html))
        .map(|d| d.chars().take(10).collect());

    PageMetadata {
        title: capture(r"(?is)<title[^>]*>(.*?)</title>", html),
        author: first_meta(html, &["author", "article:author", "twitter:creator"]),
        date,
        description: first_meta(html, &["description", "og:description"])
            .map(|d| d.chars().take(200).collect()),
    }
}

/// Main content region: `<main>`, then `<article>`, then `<body>`
fn main_region(html: &str) -> &str {
    for tag in ["main", "article", "body"] {
        let pattern = format!(r"(?is)<{tag}[^>]*>(.*)</{tag}>");
        if let Some(m) = Regex::new(&pattern)
            .ok()
            .and_then(|re| re.captures(html))
            .and_then(|c| c.get(1))
        {
            return &html[m.start()..m.end()];
        }
    }
    html
}

/// Convert HTML to trimmed, non-empty text lines
pub fn html_to_text(html: &str) -> Result<String> {
    let rendered = html2text::from_read(main_region(html).as_bytes(), TEXT_WIDTH)
        .map_err(|e| AgentError::tool("fetch_url", format!("html2text error: {}", e)))?;

    Ok(rendered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Render the page for the reasoning loop
pub fn render_page(url: &str, html: &str, max_chars: usize) -> Result<String> {
    let metadata = extract_metadata(html);
    let mut content = html_to_text(html)?;

    if content.is_empty() {
        return Ok(format!(
            "Could not extract text content from {}. The page might be empty or use JavaScript rendering.",
            url
        ));
    }

    if content.chars().count() > max_chars {
        content = content.chars().take(max_chars).collect();
        content.push_str("\n\n[Content truncated - page too long]");
    }

    let mut parts = vec![format!(
        "**Title:** {}",
        metadata.title.as_deref().unwrap_or("No title")
    )];
    if let Some(author) = &metadata.author {
        parts.push(format!("**Author:** {}", author));
    }
    if let Some(date) = &metadata.date {
        parts.push(format!("**Date:** {}", date));
    }
    if let Some(description) = &metadata.description {
        parts.push(format!("**Description:** {}", description));
    }
    parts.push(format!("\n**Content:**\n{}", content));

    Ok(parts.join("\n"))
}

#[async_trait]
impl Tool for FetchUrlTool {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch and read content from a web page URL. Use this when you have a \
         specific URL to read, or when web_search returns a relevant link you want \
         to explore in detail.\n\n\
         RETURNS: Page title, author, date (when available), and main content\n\n\
         EXAMPLES:\n- 'https://example.com/article'\n\n\
         NOTE: Some sites block automated access or require JavaScript. \
         In those cases, the content may be incomplete."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::WebContent
    }

    async fn call(&self, query: &str) -> Result<String> {
        let url = strip_quotes(query.trim());
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AgentError::InvalidInput(format!(
                "'{}' is not a URL; it must start with http:// or https://",
                url
            )));
        }

        let response = self.context.http.get(url, &[]).await?;
        if !response.is_success() {
            return Ok(format!("HTTP error fetching {}: {}", url, response.status));
        }

        if response.content_type.contains("application/pdf") || url.to_lowercase().ends_with(".pdf") {
            return Ok(format!(
                "{} is a PDF document; binary documents are not supported. \
                 Try web_search or arxiv_search for a text version.",
                url
            ));
        }

        render_page(url, &response.body, self.context.max_page_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head>
  <title>Async Rust &amp; You</title>
  <meta name="author" content="Ferris">
  <meta content="A tour of async Rust." name="description">
  <meta property="article:published_time" content="2026-03-01T10:00:00Z">
  <style>body { color: red; }</style>
</head>
<body>
  <nav>Home | About</nav>
  <main>
    <h1>Async Rust</h1>
    <p>Futures are lazy.</p>
    <p>Executors poll them.</p>
  </main>
</body></html>"#;

    #[test]
    fn test_extract_metadata() {
        let meta = extract_metadata(PAGE);

        assert_eq!(meta.title.as_deref(), Some("Async Rust & You"));
        assert_eq!(meta.author.as_deref(), Some("Ferris"));
        assert_eq!(meta.date.as_deref(), Some("2026-03-01"));
        assert_eq!(meta.description.as_deref(), Some("A tour of async Rust."));
    }

    #[test]
    fn test_render_prefers_main() {
        let text = render_page("https://x.test", PAGE, 5000).unwrap();

        assert!(text.starts_with("**Title:** Async Rust & You"));
        assert!(text.contains("Futures are lazy."));
        assert!(!text.contains("Home | About"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_render_truncates() {
        let html = format!("<html><body><p>{}</p></body></html>", "word ".repeat(500));
        let text = render_page("https://x.test", &html, 100).unwrap();

        assert!(text.contains("[Content truncated - page too long]"));
        assert!(text.contains("**Title:** No title"));
    }

    #[test]
    fn test_render_empty_page() {
        let text = render_page("https://x.test", "<html><body></body></html>", 100).unwrap();
        assert!(text.starts_with("Could not extract text content"));
    }
}
