//! Bounded, newest-first history log.

use crate::error::Result;
use crate::store::SharedStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Fixed storage key for the analysis history.
pub const ANALYSIS_HISTORY_KEY: &str = "mahir-kitab-gundul-analysis-history";

/// Number of history entries kept by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// A bounded log of serialized entries, newest first.
///
/// Pushing beyond the limit silently drops the oldest entries. A stored
/// value that no longer parses is removed and the log restarts empty, so a
/// schema change can never wedge the application.
pub struct HistoryLog<T> {
    store: SharedStore,
    key: String,
    limit: usize,
    _entry: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> HistoryLog<T> {
    /// Create a log under `key` keeping at most `limit` entries.
    pub fn new(store: SharedStore, key: impl Into<String>, limit: usize) -> Self {
        Self { store, key: key.into(), limit, _entry: PhantomData }
    }

    /// The analysis history log under its fixed key and default limit.
    pub fn analysis(store: SharedStore) -> Self {
        Self::new(store, ANALYSIS_HISTORY_KEY, DEFAULT_HISTORY_LIMIT)
    }

    /// Load all stored entries, newest first.
    pub fn load(&self) -> Result<Vec<T>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding unreadable history");
                self.store.remove(&self.key)?;
                Ok(Vec::new())
            }
        }
    }

    /// Prepend an entry, dropping anything beyond the limit, and return the
    /// resulting log.
    pub fn push(&self, entry: T) -> Result<Vec<T>> {
        let mut entries = self.load()?;
        entries.insert(0, entry);
        entries.truncate(self.limit);
        self.store.set(&self.key, &serde_json::to_string(&entries)?)?;
        Ok(entries)
    }

    /// Remove all stored entries.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        text: String,
    }

    fn entry(text: &str) -> Entry {
        Entry { text: text.to_string() }
    }

    #[test]
    fn empty_log_loads_empty() {
        let log: HistoryLog<Entry> = HistoryLog::analysis(Arc::new(MemoryStore::new()));
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn push_is_newest_first() {
        let log: HistoryLog<Entry> = HistoryLog::analysis(Arc::new(MemoryStore::new()));
        log.push(entry("a")).unwrap();
        let latest = log.push(entry("b")).unwrap();
        assert_eq!(latest, vec![entry("b"), entry("a")]);
    }

    #[test]
    fn push_respects_limit() {
        let log: HistoryLog<Entry> =
            HistoryLog::new(Arc::new(MemoryStore::new()), "k", 5);
        for i in 0..8 {
            log.push(entry(&i.to_string())).unwrap();
        }
        let entries = log.load().unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0], entry("7"));
        assert_eq!(entries[4], entry("3"));
    }

    #[test]
    fn corrupted_history_is_discarded() {
        let store = Arc::new(MemoryStore::new());
        store.set(ANALYSIS_HISTORY_KEY, "{ broken").unwrap();

        let log: HistoryLog<Entry> = HistoryLog::analysis(store.clone());
        assert!(log.load().unwrap().is_empty());
        // the bad value is gone, not just ignored
        assert!(store.get(ANALYSIS_HISTORY_KEY).unwrap().is_none());
    }

    #[test]
    fn clear_empties_log() {
        let log: HistoryLog<Entry> = HistoryLog::analysis(Arc::new(MemoryStore::new()));
        log.push(entry("a")).unwrap();
        log.clear().unwrap();
        assert!(log.load().unwrap().is_empty());
    }
}
