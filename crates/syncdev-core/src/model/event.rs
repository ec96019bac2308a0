// ── Sync activity log ──

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Default number of entries retained by the activity log.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 100;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncEventKind {
    Push,
    Pull,
    Delete,
    Conflict,
    Error,
}

/// Something that already happened during a sync. Immutable once logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: SyncEventKind,
    #[serde(default)]
    pub folder_pair: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub peer_name: String,
    #[serde(rename = "description")]
    pub message: String,
}

/// Bounded, newest-first log of sync events.
///
/// Every mutation returns a new log so the owning cell can replace its value
/// wholesale. When full, appending evicts the oldest entry (the back).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    capacity: usize,
    entries: VecDeque<Arc<SyncEvent>>,
}

impl EventLog {
    /// Create an empty log. A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Option<&Arc<SyncEvent>> {
        self.entries.front()
    }

    /// Entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SyncEvent>> {
        self.entries.iter()
    }

    /// A copy of this log with `event` prepended, evicting the oldest entry
    /// if the log was full.
    pub fn appended(&self, event: SyncEvent) -> Self {
        let mut entries = self.entries.clone();
        entries.push_front(Arc::new(event));
        entries.truncate(self.capacity);
        Self {
            capacity: self.capacity,
            entries,
        }
    }

    /// A log with the same capacity holding `events`, which must already be
    /// ordered newest-first. Anything past capacity is dropped from the tail.
    pub fn replaced(&self, events: Vec<SyncEvent>) -> Self {
        let entries = events
            .into_iter()
            .take(self.capacity)
            .map(Arc::new)
            .collect();
        Self {
            capacity: self.capacity,
            entries,
        }
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

impl Serialize for EventLog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter().map(AsRef::as_ref))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    pub(crate) fn event(n: u32) -> SyncEvent {
        SyncEvent {
            time: DateTime::from_timestamp(1_700_000_000 + i64::from(n), 0).unwrap(),
            kind: SyncEventKind::Push,
            folder_pair: "fp-1".into(),
            file_path: format!("file-{n}.txt"),
            peer_name: "laptop".into(),
            message: format!("Pushed file-{n}.txt"),
        }
    }

    fn paths(log: &EventLog) -> Vec<String> {
        log.iter().map(|e| e.file_path.clone()).collect()
    }

    #[test]
    fn newest_entry_comes_first() {
        let log = EventLog::with_capacity(5).appended(event(1)).appended(event(2));
        assert_eq!(paths(&log), vec!["file-2.txt", "file-1.txt"]);
        assert_eq!(log.latest().unwrap().file_path, "file-2.txt");
    }

    #[test]
    fn appending_past_capacity_evicts_oldest() {
        let mut log = EventLog::with_capacity(3);
        for n in 1..=4 {
            log = log.appended(event(n));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(paths(&log), vec!["file-4.txt", "file-3.txt", "file-2.txt"]);
    }

    #[test]
    fn appended_leaves_original_untouched() {
        let log = EventLog::with_capacity(2).appended(event(1));
        let next = log.appended(event(2));
        assert_eq!(log.len(), 1);
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn replaced_truncates_to_capacity() {
        let log = EventLog::with_capacity(2).replaced(vec![event(9), event(8), event(7)]);
        assert_eq!(paths(&log), vec!["file-9.txt", "file-8.txt"]);
        assert_eq!(log.capacity(), 2);
    }

    #[test]
    fn zero_capacity_keeps_one_entry() {
        let log = EventLog::with_capacity(0).appended(event(1)).appended(event(2));
        assert_eq!(log.capacity(), 1);
        assert_eq!(paths(&log), vec!["file-2.txt"]);
    }

    #[test]
    fn decodes_backend_event() {
        let json = r#"{
            "time": "2024-05-01T10:00:00Z",
            "type": "conflict",
            "folderPair": "fp-2",
            "filePath": "notes.md",
            "peerName": "desktop",
            "description": "Both sides changed notes.md"
        }"#;
        let ev: SyncEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.kind, SyncEventKind::Conflict);
        assert_eq!(ev.message, "Both sides changed notes.md");
    }
}
