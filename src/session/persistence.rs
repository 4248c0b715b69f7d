//! Session persistence for disk storage
//!
//! One pretty-printed JSON file per session, named `<id>.json`.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::agent::memory::Exchange;

/// Maximum description words kept in a session id
const MAX_ID_WORDS: usize = 3;

/// Characters of each question/answer shown in a preview
const PREVIEW_CHARS: usize = 50;

/// On-disk session document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub session_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub message_count: usize,
    pub history: Vec<Exchange>,
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: String,
    pub message_count: usize,
}

/// Where a save landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSession {
    pub id: String,
    pub path: PathBuf,
}

/// Session id from a date and an optional description
///
/// `dd.mm.yyyy_<up to three alphanumeric words>`, or
/// `dd.mm.yyyy_session_HHMMSS` when the description yields nothing.
pub fn generate_session_id(description: Option<&str>, now: DateTime<Local>) -> String {
    let date = now.format("%d.%m.%Y");

    let words: Vec<String> = description
        .unwrap_or_default()
        .to_lowercase()
        .split_whitespace()
        .take(MAX_ID_WORDS)
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        format!("{}_session_{}", date, now.format("%H%M%S"))
    } else {
        format!("{}_{}", date, words.join("_"))
    }
}

fn clip(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Session store rooted at one directory
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Create store; the directory is created on first save
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn read(&self, path: &Path) -> Result<SessionFile> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to deserialize session {}", path.display()))
    }

    /// Save `history` under `session_id`, or under a new id derived from
    /// `description`. `created_at` survives re-saves.
    pub fn save(
        &self,
        history: &[Exchange],
        session_id: Option<&str>,
        description: Option<&str>,
    ) -> Result<SavedSession> {
        fs::create_dir_all(&self.dir).context("Failed to create session storage directory")?;

        let now = Local::now();
        let id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| generate_session_id(description, now));
        let path = self.path_for(&id);
        let timestamp = now.format("%Y-%m-%dT%H:%M:%S").to_string();

        let created_at = if path.exists() {
            self.read(&path)
                .map(|existing| existing.created_at)
                .unwrap_or_else(|_| timestamp.clone())
        } else {
            timestamp.clone()
        };

        let document = SessionFile {
            session_id: id.clone(),
            created_at,
            updated_at: timestamp,
            message_count: history.len(),
            history: history.to_vec(),
        };

        let json = serde_json::to_string_pretty(&document).context("Failed to serialize session")?;
        fs::write(&path, json).context("Failed to write session file")?;

        Ok(SavedSession { id, path })
    }

    /// Load a session's history; `None` if it does not exist
    pub fn load(&self, session_id: &str) -> Result<Option<Vec<Exchange>>> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read(&path)?.history))
    }

    /// All readable sessions, newest first; corrupt files are skipped
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read(&path) {
                Ok(file) => sessions.push(SessionSummary {
                    session_id: file.session_id,
                    created_at: file.created_at,
                    message_count: file.message_count,
                }),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable session"),
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Delete session; `false` if it did not exist
    pub fn delete(&self, session_id: &str) -> Result<bool> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).context("Failed to delete session file")?;
        Ok(true)
    }

    /// First `count` exchanges, clipped; `None` if the session does not exist
    pub fn preview(&self, session_id: &str, count: usize) -> Result<Option<String>> {
        let Some(history) = self.load(session_id)? else {
            return Ok(None);
        };

        if history.is_empty() {
            return Ok(Some("Empty session (no messages)".to_string()));
        }

        let mut lines = Vec::new();
        for exchange in history.iter().take(count) {
            lines.push(format!("  Q: {}", clip(&exchange.input)));
            lines.push(format!("  A: {}", clip(&exchange.output)));
        }
        if history.len() > count {
            lines.push(format!("  ... and {} more exchanges", history.len() - count));
        }

        Ok(Some(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn create_test_store() -> (SessionStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        (SessionStore::new(temp_dir.path().join("sessions")), temp_dir)
    }

    fn history(n: usize) -> Vec<Exchange> {
        (0..n)
            .map(|i| Exchange::new(format!("question {}", i), format!("answer {}", i)))
            .collect()
    }

    #[test]
    fn test_generate_session_id() {
        let now = Local.with_ymd_and_hms(2026, 1, 22, 14, 30, 5).unwrap();

        assert_eq!(
            generate_session_id(Some("Tesla stock research today"), now),
            "22.01.2026_tesla_stock_research"
        );
        assert_eq!(
            generate_session_id(Some("C++ & Rust!"), now),
            "22.01.2026_c_rust"
        );
        assert_eq!(generate_session_id(None, now), "22.01.2026_session_143005");
        assert_eq!(generate_session_id(Some("!!! ???"), now), "22.01.2026_session_143005");
    }

    #[test]
    fn test_save_and_load() {
        let (store, _temp) = create_test_store();

        let saved = store.save(&history(2), None, Some("solar power")).unwrap();
        assert!(saved.id.ends_with("_solar_power"));
        assert!(saved.path.exists());

        let loaded = store.load(&saved.id).unwrap().unwrap();
        assert_eq!(loaded, history(2));
        assert!(store.load("missing").unwrap().is_none());
    }

    #[test]
    fn test_resave_preserves_created_at() {
        let (store, _temp) = create_test_store();

        let saved = store.save(&history(1), Some("fixed"), None).unwrap();
        let before: SessionFile =
            serde_json::from_str(&fs::read_to_string(&saved.path).unwrap()).unwrap();

        let mut doc = before.clone();
        doc.created_at = "2020-01-01T00:00:00".to_string();
        fs::write(&saved.path, serde_json::to_string(&doc).unwrap()).unwrap();

        store.save(&history(3), Some("fixed"), None).unwrap();
        let after: SessionFile =
            serde_json::from_str(&fs::read_to_string(&saved.path).unwrap()).unwrap();

        assert_eq!(after.created_at, "2020-01-01T00:00:00");
        assert_eq!(after.message_count, 3);
    }

    #[test]
    fn test_list_newest_first_and_skips_corrupt() {
        let (store, _temp) = create_test_store();

        store.save(&history(1), Some("old"), None).unwrap();
        store.save(&history(1), Some("new"), None).unwrap();
        let rewrite = |id: &str, created: &str| {
            let path = store.dir().join(format!("{}.json", id));
            let mut doc: SessionFile =
                serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
            doc.created_at = created.to_string();
            fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();
        };
        rewrite("old", "2026-01-01T00:00:00");
        rewrite("new", "2026-02-01T00:00:00");
        fs::write(store.dir().join("broken.json"), "{not json").unwrap();

        let sessions = store.list().unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_delete() {
        let (store, _temp) = create_test_store();
        store.save(&history(1), Some("gone"), None).unwrap();

        assert!(store.delete("gone").unwrap());
        assert!(!store.delete("gone").unwrap());
    }

    #[test]
    fn test_preview() {
        let (store, _temp) = create_test_store();
        let mut long = history(5);
        long[0].output = "x".repeat(80);
        store.save(&long, Some("long"), None).unwrap();
        store.save(&[], Some("empty"), None).unwrap();

        let preview = store.preview("long", 3).unwrap().unwrap();
        assert!(preview.starts_with("  Q: question 0\n  A: "));
        assert!(preview.contains(&format!("{}...", "x".repeat(50))));
        assert!(preview.ends_with("  ... and 2 more exchanges"));

        assert_eq!(
            store.preview("empty", 3).unwrap().unwrap(),
            "Empty session (no messages)"
        );
        assert!(store.preview("missing", 3).unwrap().is_none());
    }
}
