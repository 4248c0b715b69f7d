//! Wikipedia lookup via the MediaWiki API
//!
//! Searches for the best matching page, then fetches its plain-text intro.

use crate::errors::{AgentError, Result};
use crate::tools::implementations::text::{clip, ToolInput};
use crate::tools::types::{Tool, ToolCategory, ToolContext};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Maximum characters returned to the reasoning loop
pub const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

/// Wikipedia tool
#[derive(Debug, Clone)]
pub struct WikipediaTool {
    context: Arc<ToolContext>,
}

impl WikipediaTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }

    async fn top_title(&self, query: &str) -> Result<Option<String>> {
        let params = [
            ("action", "query".to_string()),
            ("list", "search".to_string()),
            ("srsearch", query.to_string()),
            ("srlimit", "1".to_string()),
            ("format", "json".to_string()),
        ];
        let response = self
            .context
            .http
            .get(API_URL, &params)
            .await?
            .error_for_status()?;

        parse_search(&response.body)
    }

    async fn extract(&self, title: &str) -> Result<Option<(String, String)>> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "extracts".to_string()),
            ("exintro", "1".to_string()),
            ("explaintext", "1".to_string()),
            ("exsentences", self.context.wikipedia_sentences.to_string()),
            ("redirects", "1".to_string()),
            ("titles", title.to_string()),
            ("format", "json".to_string()),
        ];
        let response = self
            .context
            .http
            .get(API_URL, &params)
            .await?
            .error_for_status()?;

        parse_extract(&response.body)
    }
}

/// Title of the first search hit
pub fn parse_search(body: &str) -> Result<Option<String>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .query
        .and_then(|q| q.search.into_iter().next())
        .map(|entry| entry.title))
}

/// `(title, extract)` of the returned page, if it has text
pub fn parse_extract(body: &str) -> Result<Option<(String, String)>> {
    let response: ExtractResponse = serde_json::from_str(body)?;
    Ok(response.query.and_then(|q| {
        q.pages.into_values().find_map(|page| {
            page.extract
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .map(|e| (page.title, e))
        })
    }))
}

/// Render a page summary, capped at `MAX_CONTENT_CHARS`
pub fn format_page(title: &str, extract: &str) -> String {
    let text = format!("Page: {}\nSummary: {}", title, extract);
    if text.chars().count() > MAX_CONTENT_CHARS {
        clip(&text, MAX_CONTENT_CHARS - 3)
    } else {
        text
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "Look up encyclopedic information on Wikipedia. Use this for background \
         knowledge, definitions, historical facts, or general information about \
         well-known topics. Input should be a topic or search term \
         (e.g., 'Albert Einstein', 'Climate change', 'Python programming language')."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::InformationRetrieval
    }

    async fn call(&self, query: &str) -> Result<String> {
        let input = ToolInput::parse(query);
        if input.query.is_empty() {
            return Err(AgentError::InvalidInput("No topic provided.".to_string()));
        }

        let not_found = || format!("No Wikipedia article found for '{}'", input.query);

        let Some(title) = self.top_title(&input.query).await? else {
            return Ok(not_found());
        };

        match self.extract(&title).await? {
            Some((title, extract)) => Ok(format_page(&title, &extract)),
            None => Ok(not_found()),
        }
    }
}
