//! arXiv paper search over the Atom export API

use crate::errors::{AgentError, Result};
use crate::tools::implementations::text::{clip, collapse_whitespace, html_decode, ToolInput};
use crate::tools::types::{Tool, ToolCategory, ToolContext};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};

const API_URL: &str = "https://export.arxiv.org/api/query";
const DEFAULT_MAX_RESULTS: usize = 5;
const MAX_ALLOWED_RESULTS: usize = 15;
const SUMMARY_CHARS: usize = 400;

/// One paper from the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub title: String,
    pub authors: Vec<String>,
    pub published: String,
    pub categories: Vec<String>,
    pub url: String,
    pub summary: String,
}

/// Sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Relevance,
    Date,
}

impl SortOrder {
    fn api_value(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::Date => "submittedDate",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "most relevant",
            SortOrder::Date => "newest first",
        }
    }
}

/// arXiv search tool
#[derive(Debug, Clone)]
pub struct ArxivSearchTool {
    context: Arc<ToolContext>,
}

impl ArxivSearchTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

/// Build the `search_query` value, scoping to a category when given
pub fn build_search_query(query: &str, category: Option<&str>) -> String {
    let terms = if query.contains(':') {
        query.to_string()
    } else {
        format!("all:{}", query)
    };
    match category {
        Some(cat) => format!("cat:{} AND {}", cat, terms),
        None => terms,
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| html_decode(m.as_str()))
}

struct FeedPatterns {
    entry: Regex,
    title: Regex,
    id: Regex,
    published: Regex,
    summary: Regex,
    author: Regex,
    category: Regex,
}

fn feed_patterns() -> Option<&'static FeedPatterns> {
    static PATTERNS: OnceLock<Option<FeedPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(FeedPatterns {
                entry: Regex::new(r"(?s)<entry>(.*?)</entry>").ok()?,
                title: Regex::new(r"(?s)<title[^>]*>(.*?)</title>").ok()?,
                id: Regex::new(r"(?s)<id>(.*?)</id>").ok()?,
                published: Regex::new(r"<published>([^<]*)</published>").ok()?,
                summary: Regex::new(r"(?s)<summary[^>]*>(.*?)</summary>").ok()?,
                author: Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").ok()?,
                category: Regex::new(r#"<category[^>]*term="([^"]+)""#).ok()?,
            })
        })
        .as_ref()
}

/// Parse Atom `<entry>` elements
pub fn parse_feed(xml: &str) -> Vec<Paper> {
    let Some(p) = feed_patterns() else {
        return Vec::new();
    };

    p.entry
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .filter_map(|entry| {
            let entry = entry.as_str();
            Some(Paper {
                title: collapse_whitespace(&first_capture(&p.title, entry)?),
                url: first_capture(&p.id, entry)?.trim().to_string(),
                published: first_capture(&p.published, entry)
                    .map(|d| d.chars().take(10).collect())
                    .unwrap_or_default(),
                summary: collapse_whitespace(&first_capture(&p.summary, entry).unwrap_or_default()),
                authors: p
                    .author
                    .captures_iter(entry)
                    .filter_map(|c| c.get(1))
                    .map(|m| html_decode(m.as_str()))
                    .collect(),
                categories: p
                    .category
                    .captures_iter(entry)
                    .filter_map(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
        })
        .collect()
}

/// `A, B, C et al. (N total)`
pub fn format_authors(authors: &[String]) -> String {
    let shown = authors
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > 3 {
        format!("{} et al. ({} total)", shown, authors.len())
    } else {
        shown
    }
}

pub fn format_papers(papers: &[Paper], sort: SortOrder, full_abstract: bool) -> String {
    let mut sections = vec![format!(
        "Found {} papers on ArXiv ({}):\n",
        papers.len(),
        sort.label()
    )];

    for (i, paper) in papers.iter().enumerate() {
        let summary = if full_abstract {
            paper.summary.clone()
        } else {
            clip(&paper.summary, SUMMARY_CHARS)
        };
        let categories = paper
            .categories
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        sections.push(format!(
            "{}. **{}**\n   Authors: {}\n   Published: {}\n   Categories: {}\n   URL: {}\n   Abstract: {}\n",
            i + 1,
            paper.title,
            format_authors(&paper.authors),
            paper.published,
            categories,
            paper.url,
            summary
        ));
    }

    sections.join("\n")
}

#[async_trait]
impl Tool for ArxivSearchTool {
    fn name(&self) -> &str {
        "arxiv_search"
    }

    fn description(&self) -> &str {
        "Search for academic papers on ArXiv. Use this for scholarly research, \
         scientific papers, or peer-reviewed sources on physics, math, CS, AI, ML, etc.\n\n\
         SIMPLE USAGE: Just provide a topic: 'transformer neural networks'\n\n\
         ADVANCED USAGE: Provide JSON with options:\n\
         {\"query\": \"attention mechanism\", \"max_results\": 10, \"sort\": \"date\", \"category\": \"cs.AI\"}\n\n\
         OPTIONS:\n\
         - max_results: 1-15 (default 5)\n\
         - sort: 'relevance' (default) or 'date' (newest first)\n\
         - category: cs.AI, cs.LG, cs.CL, cs.CV, physics, math, etc.\n\
         - full_abstract: true to show complete abstract"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::InformationRetrieval
    }

    async fn call(&self, query: &str) -> Result<String> {
        let input = ToolInput::parse(query);
        if input.query.is_empty() {
            return Err(AgentError::InvalidInput("No search query provided.".to_string()));
        }

        let max_results = input.max_results(DEFAULT_MAX_RESULTS, MAX_ALLOWED_RESULTS);
        let sort = match input.str_opt("sort") {
            Some("date") => SortOrder::Date,
            _ => SortOrder::Relevance,
        };
        let full_abstract = input.bool_opt("full_abstract").unwrap_or(false);
        let search_query = build_search_query(&input.query, input.str_opt("category"));

        let params = [
            ("search_query", search_query.clone()),
            ("start", "0".to_string()),
            ("max_results", max_results.to_string()),
            ("sortBy", sort.api_value().to_string()),
            ("sortOrder", "descending".to_string()),
        ];

        let response = self
            .context
            .http
            .get(API_URL, &params)
            .await?
            .error_for_status()?;

        let papers = parse_feed(&response.body);
        if papers.is_empty() {
            return Ok(format!("No academic papers found for '{}'", search_query));
        }

        Ok(format_papers(&papers, sort, full_abstract))
    }
}
