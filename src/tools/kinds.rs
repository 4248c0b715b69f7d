//! Search kinds and the kind-to-tool table used by parallel dispatch

use crate::tools::registry::ToolRegistry;
use crate::tools::types::Tool;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Closed set of search kinds a batch may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Web,
    Wikipedia,
    News,
    Arxiv,
}

impl SearchKind {
    /// All kinds in the order they are advertised
    pub const ALL: [SearchKind; 4] = [
        SearchKind::Web,
        SearchKind::Wikipedia,
        SearchKind::News,
        SearchKind::Arxiv,
    ];

    /// Parse a batch `type` tag (case-insensitive)
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "web" => Some(SearchKind::Web),
            "wikipedia" => Some(SearchKind::Wikipedia),
            "news" => Some(SearchKind::News),
            "arxiv" | "academic" | "academic-search" => Some(SearchKind::Arxiv),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Web => "web",
            SearchKind::Wikipedia => "wikipedia",
            SearchKind::News => "news",
            SearchKind::Arxiv => "arxiv",
        }
    }

    /// Name of the registry tool backing this kind
    pub fn tool_name(&self) -> &'static str {
        match self {
            SearchKind::Web => "web_search",
            SearchKind::Wikipedia => "wikipedia",
            SearchKind::News => "news_search",
            SearchKind::Arxiv => "arxiv_search",
        }
    }

    /// Human list of valid tags, e.g. `'web', 'wikipedia', 'news', or 'arxiv'`
    pub fn valid_list() -> String {
        let quoted: Vec<String> = Self::ALL
            .iter()
            .map(|k| format!("'{}'", k.as_str()))
            .collect();
        match quoted.split_last() {
            Some((last, rest)) if !rest.is_empty() => {
                format!("{}, or {}", rest.join(", "), last)
            }
            _ => quoted.join(""),
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from search kind to the tool that serves it.
///
/// Built once and shared by `Arc`; tests register doubles per kind.
#[derive(Clone, Default)]
pub struct SearchRegistry {
    tools: HashMap<SearchKind, Arc<dyn Tool>>,
}

impl SearchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the backing tools for every kind from a tool registry
    pub fn from_tools(registry: &ToolRegistry) -> Self {
        let mut searches = Self::new();
        for kind in SearchKind::ALL {
            if let Some(tool) = registry.get(kind.tool_name()) {
                searches.register(kind, tool);
            }
        }
        searches
    }

    /// Bind `tool` to `kind`, replacing any previous binding
    pub fn register(&mut self, kind: SearchKind, tool: Arc<dyn Tool>) {
        self.tools.insert(kind, tool);
    }

    /// Resolve a raw `type` tag. `None` covers both unknown tags and known
    /// kinds with no bound tool.
    pub fn resolve(&self, tag: &str) -> Option<(SearchKind, Arc<dyn Tool>)> {
        let kind = SearchKind::parse(tag)?;
        self.tools.get(&kind).map(|tool| (kind, tool.clone()))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for SearchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.tools.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("SearchRegistry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::tools::types::ToolCategory;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echo"
        }
        fn category(&self) -> ToolCategory {
            ToolCategory::InformationRetrieval
        }
        async fn call(&self, query: &str) -> Result<String> {
            Ok(query.to_string())
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(SearchKind::parse("WEB"), Some(SearchKind::Web));
        assert_eq!(SearchKind::parse(" Wikipedia "), Some(SearchKind::Wikipedia));
        assert_eq!(SearchKind::parse("academic-search"), Some(SearchKind::Arxiv));
        assert_eq!(SearchKind::parse("images"), None);
    }

    #[test]
    fn test_valid_list() {
        assert_eq!(
            SearchKind::valid_list(),
            "'web', 'wikipedia', 'news', or 'arxiv'"
        );
    }

    #[test]
    fn test_resolve_requires_binding() {
        let mut registry = SearchRegistry::new();
        registry.register(SearchKind::Web, Arc::new(Echo));

        assert!(registry.resolve("web").is_some());
        assert!(registry.resolve("news").is_none());
        assert!(registry.resolve("unknown_kind").is_none());
    }
}
