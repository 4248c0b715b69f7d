//! Markdown research reports

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Render a report document
pub fn render_report(question: &str, answer: &str, generated: DateTime<Local>) -> String {
    format!(
        "# Research Report\n\n\
         **Generated:** {}\n\n\
         ## Question\n\n{}\n\n\
         ## Answer\n\n{}\n\n\
         ---\n*Generated by ResearchBuddy*\n",
        generated.format("%Y-%m-%d %H:%M:%S"),
        question.trim(),
        answer.trim()
    )
}

/// Write `research_<timestamp>.md` into `dir`
pub fn export_report(dir: &Path, question: &str, answer: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("Failed to create reports directory")?;

    let now = Local::now();
    let path = dir.join(format!("research_{}.md", now.format("%Y%m%d_%H%M%S")));
    fs::write(&path, render_report(question, answer, now))
        .with_context(|| format!("Failed to write report {}", path.display()))?;

    Ok(path)
}
