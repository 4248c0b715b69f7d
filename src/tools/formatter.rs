//! Result formatter
//!
//! Renders a `BatchReport` as one bounded string. Each payload is cut to a
//! per-kind character budget, preferring a sentence or line boundary.

use crate::tools::batch::BatchReport;
use crate::tools::implementations::text::clip;
use crate::tools::kinds::SearchKind;

/// Appended to every truncated payload
pub const TRUNCATION_MARKER: &str = "...";

/// Budget for kinds outside the table (including unknown tags)
pub const DEFAULT_TRUNCATION_LIMIT: usize = 500;

/// Echoed query and kind tag are clipped to these lengths
pub const MAX_ECHOED_QUERY: usize = 200;
pub const MAX_ECHOED_KIND: usize = 40;

/// Character budget for a raw kind tag
pub fn truncation_limit(kind: &str) -> usize {
    match SearchKind::parse(kind) {
        Some(SearchKind::Web) => 600,
        Some(SearchKind::Wikipedia) => 800,
        Some(SearchKind::News) => 700,
        Some(SearchKind::Arxiv) => 800,
        None => DEFAULT_TRUNCATION_LIMIT,
    }
}

/// Truncate `text` to `limit` characters plus the marker.
///
/// Cuts after the last '.' or newline inside the budget when that point
/// lies at or beyond 70% of it; otherwise hard-cuts at the budget. Text that
/// is within budget, or already carries a marker within budget, is returned
/// as is.
pub fn truncate_result(text: &str, limit: usize) -> String {
    let length = text.chars().count();
    if length <= limit {
        return text.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if text.ends_with(TRUNCATION_MARKER) && length - marker_len <= limit {
        return text.to_string();
    }

    let window: Vec<char> = text.chars().take(limit).collect();
    let boundary = window.iter().rposition(|c| *c == '.' || *c == '\n');

    let keep = match boundary {
        Some(pos) if pos * 10 >= limit * 7 => pos + 1,
        _ => limit,
    };

    let mut truncated: String = window[..keep].iter().collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Render the full report
pub fn format_report(report: &BatchReport) -> String {
    let mut sections = Vec::with_capacity(report.results.len() + 1);

    let mut header = format!(
        "Parallel search completed: {}/{} successful\n",
        report.success_count(),
        report.total_count()
    );
    if report.timed_out {
        header.push_str("Note: the batch deadline elapsed; unfinished searches are marked FAILED.\n");
    }
    sections.push(header);

    for result in &report.results {
        let status = if result.succeeded { "SUCCESS" } else { "FAILED" };
        let payload = truncate_result(&result.payload, truncation_limit(&result.kind));
        sections.push(format!(
            "--- [{}] {} ---\nQuery: {}\n{}\n",
            clip(&result.kind, MAX_ECHOED_KIND).to_uppercase(),
            status,
            clip(&result.query, MAX_ECHOED_QUERY),
            payload
        ));
    }

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::batch::{ToolInvocationRequest, ToolInvocationResult};
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_limits_table() {
        assert_eq!(truncation_limit("web"), 600);
        assert_eq!(truncation_limit("wikipedia"), 800);
        assert_eq!(truncation_limit("news"), 700);
        assert_eq!(truncation_limit("arxiv"), 800);
        assert_eq!(truncation_limit("unknown_kind"), 500);
    }

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(truncate_result("short.", 100), "short.");
    }

    #[test]
    fn test_cut_at_sentence_boundary() {
        let text = format!("{}. {}", "a".repeat(80), "b".repeat(50));
        let truncated = truncate_result(&text, 100);

        assert_eq!(truncated, format!("{}....", "a".repeat(80)));
    }

    #[test]
    fn test_cut_at_newline() {
        let text = format!("{}\n{}", "a".repeat(75), "b".repeat(50));
        let truncated = truncate_result(&text, 100);

        assert_eq!(truncated, format!("{}\n...", "a".repeat(75)));
    }

    #[test]
    fn test_hard_cut_when_boundary_too_early() {
        let text = format!("{}. {}", "a".repeat(10), "b".repeat(200));
        let truncated = truncate_result(&text, 100);

        assert_eq!(truncated.chars().count(), 103);
        assert!(truncated.ends_with("bbb..."));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "é".repeat(300);
        let truncated = truncate_result(&text, 100);
        assert_eq!(truncated.chars().count(), 103);
    }

    #[test]
    fn test_format_report() {
        let web = ToolInvocationRequest::new("web", "X");
        let unknown = ToolInvocationRequest::new("unknown_kind", "Y");
        let report = BatchReport {
            results: vec![
                ToolInvocationResult::success(&web, "found it".to_string()),
                ToolInvocationResult::failure(&unknown, "Unknown search type".to_string()),
            ],
            timed_out: false,
        };

        let text = format_report(&report);
        assert!(text.starts_with("Parallel search completed: 1/2 successful\n"));
        assert!(text.contains("--- [WEB] SUCCESS ---\nQuery: X\nfound it\n"));
        assert!(text.contains("--- [UNKNOWN_KIND] FAILED ---\nQuery: Y\n"));
        assert!(!text.contains("Note:"));
    }

    #[test]
    fn test_format_report_all_failed_is_well_formed() {
        let news = ToolInvocationRequest::new("news", "q");
        let report = BatchReport {
            results: vec![ToolInvocationResult::failure(&news, "Error: down".to_string())],
            timed_out: true,
        };

        let text = format_report(&report);
        assert!(text.starts_with("Parallel search completed: 0/1 successful"));
        assert!(text.contains("deadline elapsed"));
    }

    #[test]
    fn test_echoed_fields_are_clipped() {
        let request = ToolInvocationRequest::new("k".repeat(500), "q".repeat(5_000));
        let report = BatchReport {
            results: vec![ToolInvocationResult::failure(&request, "Error: x".to_string())],
            timed_out: false,
        };

        let text = format_report(&report);
        assert!(text.contains(&format!("Query: {}...\n", "q".repeat(MAX_ECHOED_QUERY))));
        assert!(text.contains(&format!("--- [{}...] FAILED ---", "K".repeat(MAX_ECHOED_KIND))));
        assert!(text.chars().count() < 400);
    }

    #[quickcheck]
    fn prop_truncation_is_idempotent(text: String, limit: u16) -> bool {
        let limit = limit as usize % 1000 + 1;
        let once = truncate_result(&text, limit);
        truncate_result(&once, limit) == once
    }

    #[quickcheck]
    fn prop_truncation_respects_budget(text: String, limit: u16) -> bool {
        let limit = limit as usize % 1000 + 1;
        let truncated = truncate_result(&text, limit);
        truncated.chars().count() <= limit + TRUNCATION_MARKER.chars().count()
    }
}
