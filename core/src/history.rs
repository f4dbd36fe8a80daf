//! Session-local history of generation requests.
//!
//! Newest entries come first. Nothing here is persisted: a new process
//! starts with an empty history, and `get_content_history` on the service
//! is the way to recover older records from the backend.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::types::{ContentRecord, ContentStatus, ContentType, DifficultyLevel};

pub const PENDING_PLACEHOLDER: &str = "Content generation in progress...";

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub topic: String,
    pub difficulty_level: DifficultyLevel,
    pub content_type: ContentType,
    pub content: Option<String>,
    pub status: ContentStatus,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Generated text, or a placeholder while the backend is still working.
    pub fn display_body(&self) -> &str {
        self.content.as_deref().unwrap_or(PENDING_PLACEHOLDER)
    }
}

impl From<&ContentRecord> for HistoryEntry {
    fn from(record: &ContentRecord) -> Self {
        Self {
            id: record.id.clone(),
            topic: record.topic.clone(),
            difficulty_level: record.difficulty_level,
            content_type: record.content_type,
            content: record.generated_content.clone(),
            status: record.status,
            timestamp: record.request_timestamp,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentHistory {
    entries: VecDeque<HistoryEntry>,
}

impl ContentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `record` at the front, dropping any older entry with its id.
    pub fn record(&mut self, record: &ContentRecord) -> &HistoryEntry {
        self.entries.retain(|e| e.id != record.id);
        self.entries.push_front(HistoryEntry::from(record));
        &self.entries[0]
    }

    /// Refresh an existing entry in place, keeping its position.
    /// Returns `false` if the id is not in the history.
    pub fn update(&mut self, record: &ContentRecord) -> bool {
        match self.entries.iter_mut().find(|e| e.id == record.id) {
            Some(entry) => {
                *entry = HistoryEntry::from(record);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<HistoryEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        self.entries.remove(index)
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, status: ContentStatus, content: Option<&str>) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            user_id: None,
            topic: "Calculus".to_string(),
            difficulty_level: DifficultyLevel::Beginner,
            content_type: ContentType::StudyNotes,
            status,
            generated_content: content.map(str::to_string),
            request_timestamp: Utc::now(),
            completion_timestamp: None,
            error_message: None,
            metadata: None,
        }
    }

    #[test]
    fn newest_first() {
        let mut history = ContentHistory::new();
        history.record(&record("a", ContentStatus::Pending, None));
        history.record(&record("b", ContentStatus::Pending, None));
        let ids: Vec<&str> = history.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn recording_same_id_moves_it_to_front() {
        let mut history = ContentHistory::new();
        history.record(&record("a", ContentStatus::Pending, None));
        history.record(&record("b", ContentStatus::Pending, None));
        history.record(&record("a", ContentStatus::Completed, Some("notes")));
        assert_eq!(history.len(), 2);
        let first = history.iter().next().unwrap();
        assert_eq!(first.id, "a");
        assert_eq!(first.display_body(), "notes");
    }

    #[test]
    fn pending_entry_shows_placeholder() {
        let mut history = ContentHistory::new();
        let entry = history.record(&record("a", ContentStatus::Pending, None));
        assert_eq!(entry.display_body(), PENDING_PLACEHOLDER);
    }

    #[test]
    fn update_keeps_position_and_remove_drops() {
        let mut history = ContentHistory::new();
        history.record(&record("a", ContentStatus::Pending, None));
        history.record(&record("b", ContentStatus::Pending, None));
        assert!(history.update(&record("a", ContentStatus::Failed, None)));
        assert_eq!(history.iter().nth(1).unwrap().status, ContentStatus::Failed);
        assert!(!history.update(&record("zzz", ContentStatus::Failed, None)));

        assert!(history.remove("b").is_some());
        assert!(history.get("b").is_none());
        assert!(history.remove("b").is_none());
        assert_eq!(history.len(), 1);
    }
}
