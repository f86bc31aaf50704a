//! Append-only scratch memory for the calling agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single remembered note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub text: String,
    pub recorded_at: DateTime<Utc>,
}

/// Ordered log of notes. Entries are never edited or removed, and outside
/// this crate they are added only through `Tools::remember`.
///
/// ```compile_fail
/// let mut store = droid_tools::MemoryStore::new();
/// store.append("note");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<MemoryEntry>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a note and echo it back.
    pub(crate) fn append(&mut self, text: impl Into<String>) -> String {
        let text = text.into();
        self.entries.push(MemoryEntry {
            text: text.clone(),
            recorded_at: Utc::now(),
        });
        text
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Entry texts, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Numbered block for inclusion in a planning prompt.
    ///
    /// Empty when nothing has been remembered.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut out = String::from("### Remembered Information:\n");
        for (idx, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", idx + 1, entry.text));
        }
        out
    }
}
