//! Session persistence and report export
//!
//! Components:
//! - Session store: saves/loads conversation history as JSON
//! - Reports: exports a question and answer as markdown

pub mod persistence;
pub mod report;

// Re-export key types
pub use persistence::{generate_session_id, SavedSession, SessionStore, SessionSummary};
pub use report::export_report;
