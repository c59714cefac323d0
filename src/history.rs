// History browser
//
// Local copy of the service's history listing. Entries are owned by the service;
// this only keeps what is needed to show the list and to drop rows after a delete.

use log::debug;

use crate::models::{parse_created_at, HistorySummary};

/// Shown when the history list has no entries
pub const EMPTY_HISTORY_TEXT: &str = "No saved transcriptions.";

/// Shown for entries the service stored without a title
pub const UNTITLED_VIDEO: &str = "Untitled video";

/// What the history list currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDisplay {
    Empty,
    Items(usize),
}

/// History list as last fetched, minus entries deleted since
#[derive(Debug, Clone, Default)]
pub struct HistoryBrowser {
    entries: Vec<HistorySummary>,
}

impl HistoryBrowser {
    /// Keeps the order the service returned (most recent first)
    pub fn from_summaries(entries: Vec<HistorySummary>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[HistorySummary] {
        &self.entries
    }

    pub fn get(&self, id: i64) -> Option<&HistorySummary> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn display(&self) -> HistoryDisplay {
        if self.entries.is_empty() {
            HistoryDisplay::Empty
        } else {
            HistoryDisplay::Items(self.entries.len())
        }
    }

    /// Drops a deleted entry; returns false if it was not listed
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            debug!("Removed history entry {} ({:?})", id, self.display());
        }
        removed
    }

    /// One line per entry, or the empty-state text
    pub fn render_lines(&self) -> Vec<String> {
        if self.entries.is_empty() {
            return vec![EMPTY_HISTORY_TEXT.to_string()];
        }
        self.entries.iter().map(summary_line).collect()
    }
}

/// `#id  title  (date)` row
pub fn summary_line(entry: &HistorySummary) -> String {
    let title = entry
        .video_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(UNTITLED_VIDEO);
    match entry.created_at.as_deref() {
        Some(raw) => format!("#{:<5} {}  ({})", entry.id, title, format_created_at(raw)),
        None => format!("#{:<5} {}", entry.id, title),
    }
}

/// Local date and time such as `1 Feb 2025, 10:15`; unparseable input is kept verbatim
pub fn format_created_at(raw: &str) -> String {
    match parse_created_at(raw) {
        Some(dt) => dt.format("%-d %b %Y, %H:%M").to_string(),
        None => raw.to_string(),
    }
}
