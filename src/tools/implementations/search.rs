//! Web and news search
//!
//! - `web_search`: DuckDuckGo HTML endpoint
//! - `news_search`: Google News RSS search
//!
//! Both take a plain query or JSON options and return numbered results.

use crate::errors::{AgentError, Result};
use crate::tools::implementations::text::{clip, html_decode, strip_html_tags, ToolInput};
use crate::tools::types::{Tool, ToolCategory, ToolContext};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const GOOGLE_NEWS_RSS_URL: &str = "https://news.google.com/rss/search";

const MAX_ALLOWED_RESULTS: usize = 10;
const WEB_SNIPPET_CHARS: usize = 250;
const NEWS_SNIPPET_CHARS: usize = 200;

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search tool
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    context: Arc<ToolContext>,
}

impl WebSearchTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information using DuckDuckGo. Use this for \
         up-to-date information, recent events, or anything not in Wikipedia.\n\n\
         SIMPLE USAGE: Just provide a search query string.\n\n\
         ADVANCED USAGE: Provide JSON with options:\n\
         {\"query\": \"search terms\", \"max_results\": 5, \"region\": \"us-en\"}\n\n\
         RETURNS: Structured results with title, URL, and snippet for each result."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::InformationRetrieval
    }

    async fn call(&self, query: &str) -> Result<String> {
        let input = ToolInput::parse(query);
        if input.query.is_empty() {
            return Err(AgentError::InvalidInput("No search query provided.".to_string()));
        }

        let max_results = input.max_results(self.context.search_results, MAX_ALLOWED_RESULTS);
        let mut form = vec![("q", input.query.clone()), ("b", String::new())];
        if let Some(region) = input.str_opt("region") {
            form.push(("kl", region.to_string()));
        }

        let response = self
            .context
            .http
            .send(|client| client.post(DDG_HTML_URL).form(&form))
            .await?
            .error_for_status()?;

        let hits = parse_ddg_html(&response.body, max_results);
        Ok(format_web_results(&input.query, &hits))
    }
}

/// Parse DuckDuckGo HTML result blocks.
///
/// Each block carries `<a class="result__a" href=...>TITLE</a>` followed by
/// `<a class="result__snippet" ...>SNIPPET</a>`.
pub fn parse_ddg_html(html: &str, max_results: usize) -> Vec<SearchHit> {
    static LINK: OnceLock<Option<Regex>> = OnceLock::new();
    static SNIPPET: OnceLock<Option<Regex>> = OnceLock::new();

    let link = LINK.get_or_init(|| {
        Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>|<a[^>]*href="([^"]*)"[^>]*class="result__a"[^>]*>(.*?)</a>"#).ok()
    });
    let snippet = SNIPPET
        .get_or_init(|| Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</a>"#).ok());

    let (Some(link), Some(snippet)) = (link.as_ref(), snippet.as_ref()) else {
        return Vec::new();
    };

    let links: Vec<_> = link.captures_iter(html).collect();
    let mut hits = Vec::new();

    for (i, caps) in links.iter().enumerate() {
        if hits.len() >= max_results {
            break;
        }

        let (Some(whole), Some(href), Some(title)) = (
            caps.get(0),
            caps.get(1).or_else(|| caps.get(3)),
            caps.get(2).or_else(|| caps.get(4)),
        ) else {
            continue;
        };

        // Snippet must belong to this block, before the next title link
        let region_end = links
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(html.len());
        let snippet_text = snippet
            .captures(&html[whole.end()..region_end])
            .and_then(|c| c.get(1))
            .map(|m| strip_html_tags(m.as_str()))
            .unwrap_or_default();

        let url = resolve_ddg_url(&html_decode(href.as_str()));
        let title = strip_html_tags(title.as_str());

        if !title.is_empty() && !url.is_empty() {
            hits.push(SearchHit {
                title,
                url,
                snippet: snippet_text,
            });
        }
    }

    hits
}

/// Resolve DuckDuckGo redirect links (`//duckduckgo.com/l/?uddg=...`)
pub fn resolve_ddg_url(href: &str) -> String {
    if let Some(rest) = href
        .strip_prefix("//duckduckgo.com/l/?uddg=")
        .or_else(|| href.strip_prefix("https://duckduckgo.com/l/?uddg="))
        .or_else(|| href.strip_prefix("/l/?uddg="))
    {
        let encoded = rest.split('&').next().unwrap_or(rest);
        urlencoding::decode(encoded)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| href.to_string())
    } else if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        String::new()
    }
}

fn format_web_results(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No search results found for '{}'", query);
    }

    let entries: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let snippet = if hit.snippet.is_empty() {
                "No description".to_string()
            } else {
                clip(&hit.snippet, WEB_SNIPPET_CHARS)
            };
            format!("{}. **{}**\n   URL: {}\n   {}", i + 1, hit.title, hit.url, snippet)
        })
        .collect();

    format!(
        "Found {} results for '{}':\n{}",
        hits.len(),
        query,
        entries.join("\n\n")
    )
}

/// Time window for news search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLimit {
    Day,
    Week,
    Month,
}

impl TimeLimit {
    /// Parse `d`/`w`/`m`; anything else is a week
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(|s| s.to_lowercase()) {
            Some(s) if s == "d" => TimeLimit::Day,
            Some(s) if s == "m" => TimeLimit::Month,
            _ => TimeLimit::Week,
        }
    }

    fn query_suffix(&self) -> &'static str {
        match self {
            TimeLimit::Day => "when:1d",
            TimeLimit::Week => "when:7d",
            TimeLimit::Month => "when:30d",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TimeLimit::Day => "day",
            TimeLimit::Week => "week",
            TimeLimit::Month => "month",
        }
    }
}

/// One news article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsArticle {
    pub title: String,
    pub source: String,
    pub date: String,
    pub url: String,
    pub body: String,
}

/// News search tool
#[derive(Debug, Clone)]
pub struct NewsSearchTool {
    context: Arc<ToolContext>,
}

impl NewsSearchTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Tool for NewsSearchTool {
    fn name(&self) -> &str {
        "news_search"
    }

    fn description(&self) -> &str {
        "Search for recent news articles on a topic. Use this for current events, \
         breaking news, or recent developments.\n\n\
         SIMPLE USAGE: Just provide a topic: 'artificial intelligence', 'stock market'\n\n\
         ADVANCED USAGE: Provide JSON with options:\n\
         {\"query\": \"climate change\", \"timelimit\": \"d\", \"max_results\": 10}\n\n\
         OPTIONS:\n\
         - timelimit: 'd' (past day), 'w' (past week, default), 'm' (past month)\n\
         - max_results: 1-10 (default 5)\n\n\
         RETURNS: Article titles, sources, dates, and links."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::InformationRetrieval
    }

    async fn call(&self, query: &str) -> Result<String> {
        let input = ToolInput::parse(query);
        if input.query.is_empty() {
            return Err(AgentError::InvalidInput("No search query provided.".to_string()));
        }

        let max_results = input.max_results(self.context.search_results, MAX_ALLOWED_RESULTS);
        let timelimit = TimeLimit::parse(input.str_opt("timelimit"));
        let params = [
            ("q", format!("{} {}", input.query, timelimit.query_suffix())),
            ("hl", "en-US".to_string()),
            ("gl", "US".to_string()),
            ("ceid", "US:en".to_string()),
        ];

        let response = self
            .context
            .http
            .get(GOOGLE_NEWS_RSS_URL, &params)
            .await?
            .error_for_status()?;

        let articles = parse_news_rss(&response.body, max_results);
        Ok(format_news_results(&input.query, timelimit, &articles))
    }
}

fn tag_text(block: &str, tag: &str) -> Option<String> {
    let pattern = format!(r"(?s)<{tag}(?:\s[^>]*)?>(.*?)</{tag}>", tag = regex::escape(tag));
    let re = Regex::new(&pattern).ok()?;
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| html_decode(m.as_str()))
}

/// Parse RSS `<item>` elements
pub fn parse_news_rss(xml: &str, max_results: usize) -> Vec<NewsArticle> {
    static ITEM: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(item) = ITEM
        .get_or_init(|| Regex::new(r"(?s)<item>(.*?)</item>").ok())
        .as_ref()
    else {
        return Vec::new();
    };

    item.captures_iter(xml)
        .filter_map(|c| c.get(1))
        .filter_map(|block| {
            let block = block.as_str();
            let title = tag_text(block, "title")?;
            let source = tag_text(block, "source").unwrap_or_else(|| "Unknown source".to_string());
            // Google appends " - Source" to titles
            let title = title
                .strip_suffix(&format!(" - {}", source))
                .map(str::to_string)
                .unwrap_or(title);

            Some(NewsArticle {
                title,
                source,
                date: tag_text(block, "pubDate").unwrap_or_else(|| "Unknown date".to_string()),
                url: tag_text(block, "link").unwrap_or_default(),
                body: tag_text(block, "description")
                    .map(|d| strip_html_tags(&d))
                    .unwrap_or_default(),
            })
        })
        .take(max_results)
        .collect()
}

fn format_news_results(query: &str, timelimit: TimeLimit, articles: &[NewsArticle]) -> String {
    if articles.is_empty() {
        return format!(
            "No news found for '{}' in the past {}. Try broader terms or a longer time range.",
            query,
            timelimit.label()
        );
    }

    let mut sections = vec![format!(
        "Found {} news articles for '{}' (past {}):\n",
        articles.len(),
        query,
        timelimit.label()
    )];

    for (i, article) in articles.iter().enumerate() {
        let mut entry = format!(
            "{}. **{}**\n   Source: {} | Date: {}",
            i + 1,
            article.title,
            article.source,
            article.date
        );
        if !article.body.is_empty() && article.body != article.title {
            entry.push_str(&format!("\n   {}", clip(&article.body, NEWS_SNIPPET_CHARS)));
        }
        entry.push_str(&format!("\n   URL: {}", article.url));
        sections.push(entry);
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDG_FIXTURE: &str = r##"
        <div class="result">
            <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&amp;rut=abc">Example Site</a>
            <a class="result__snippet" href="#">This is a snippet about example.</a>
        </div>
        <div class="result">
            <a class="result__a" href="https://rust-lang.org">Rust &amp; Language</a>
        </div>
        <div class="result">
            <a class="result__a" href="https://tokio.rs">Tokio</a>
            <a class="result__snippet" href="#">An <b>async</b> runtime.</a>
        </div>
    "##;

    const RSS_FIXTURE: &str = r#"<?xml version="1.0"?>
        <rss><channel><title>ignored</title>
        <item>
            <title>Rust 2.0 announced - The Register</title>
            <link>https://news.example/rust</link>
            <pubDate>Mon, 12 Oct 2026 09:00:00 GMT</pubDate>
            <description>&lt;a href="x"&gt;Rust 2.0 announced&lt;/a&gt; with new features</description>
            <source url="https://theregister.com">The Register</source>
        </item>
        <item>
            <title><![CDATA[Tokio &amp; friends]]></title>
            <link>https://news.example/tokio</link>
        </item>
        </channel></rss>"#;

    #[test]
    fn test_parse_ddg_html() {
        let hits = parse_ddg_html(DDG_FIXTURE, 10);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].url, "https://example.com");
        assert_eq!(hits[0].snippet, "This is a snippet about example.");
        assert_eq!(hits[1].title, "Rust & Language");
        assert_eq!(hits[1].snippet, "");
        assert_eq!(hits[2].snippet, "An async runtime.");
    }

    #[test]
    fn test_parse_ddg_respects_max() {
        assert_eq!(parse_ddg_html(DDG_FIXTURE, 1).len(), 1);
    }

    #[test]
    fn test_resolve_ddg_url() {
        assert_eq!(
            resolve_ddg_url("/l/?uddg=https%3A%2F%2Fa.com%2Fx&rut=1"),
            "https://a.com/x"
        );
        assert_eq!(resolve_ddg_url("javascript:void(0)"), "");
    }

    #[test]
    fn test_format_web_results() {
        let hits = parse_ddg_html(DDG_FIXTURE, 10);
        let text = format_web_results("rust", &hits);

        assert!(text.starts_with("Found 3 results for 'rust':\n"));
        assert!(text.contains("1. **Example Site**\n   URL: https://example.com"));
        assert!(text.contains("No description"));
        assert_eq!(format_web_results("x", &[]), "No search results found for 'x'");
    }

    #[test]
    fn test_parse_news_rss() {
        let articles = parse_news_rss(RSS_FIXTURE, 10);

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Rust 2.0 announced");
        assert_eq!(articles[0].source, "The Register");
        assert_eq!(articles[0].body, "Rust 2.0 announced with new features");
        assert_eq!(articles[1].title, "Tokio & friends");
        assert_eq!(articles[1].date, "Unknown date");
    }

    #[test]
    fn test_format_news_results() {
        let articles = parse_news_rss(RSS_FIXTURE, 1);
        let text = format_news_results("rust", TimeLimit::Day, &articles);

        assert!(text.starts_with("Found 1 news articles for 'rust' (past day):"));
        assert!(text.contains("Source: The Register | Date: Mon, 12 Oct 2026"));

        let empty = format_news_results("rust", TimeLimit::Month, &[]);
        assert!(empty.contains("in the past month"));
    }

    #[test]
    fn test_timelimit_parse() {
        assert_eq!(TimeLimit::parse(Some("d")), TimeLimit::Day);
        assert_eq!(TimeLimit::parse(Some("x")), TimeLimit::Week);
        assert_eq!(TimeLimit::parse(None), TimeLimit::Week);
    }
}
