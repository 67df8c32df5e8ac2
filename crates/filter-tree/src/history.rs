//! Bounded, linear undo/redo history of tree snapshots.
//!
//! The history is a list of snapshots plus a cursor. Pushing after an undo
//! discards the redo tail; pushing beyond capacity drops the oldest entry.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{now, FilterTree};

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// One recorded snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Deep copy of the tree at the time it was recorded.
    pub tree: FilterTree,
    /// When the snapshot was recorded.
    #[serde(with = "crate::model::rfc3339_millis")]
    pub timestamp: DateTime<Utc>,
    /// Human-readable label, e.g. "Added condition".
    pub action: String,
}

/// Undo/redo history.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    /// Cursor into `entries`; `None` only when empty.
    index: Option<usize>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Creates an empty history with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history keeping at most `capacity` snapshots (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            index: None,
            capacity,
        }
    }

    /// Records a snapshot of `tree` and makes it current.
    pub fn push(&mut self, tree: &FilterTree, action: impl Into<String>) {
        if let Some(index) = self.index {
            self.entries.truncate(index + 1);
        }

        let action = action.into();
        debug!(tree_id = %tree.id, version = tree.version, action = %action, "Recording history entry");
        self.entries.push_back(HistoryEntry {
            tree: tree.clone(),
            timestamp: now(),
            action,
        });

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.index = Some(self.entries.len() - 1);
    }

    /// Steps back one snapshot and returns a copy of it.
    ///
    /// Returns `None` when already at the oldest snapshot or empty.
    pub fn undo(&mut self) -> Option<FilterTree> {
        let index = self.index.filter(|&i| i > 0)? - 1;
        self.index = Some(index);
        debug!(index, "Undo");
        self.entries.get(index).map(|entry| entry.tree.clone())
    }

    /// Steps forward one snapshot and returns a copy of it.
    ///
    /// Returns `None` when already at the newest snapshot or empty.
    pub fn redo(&mut self) -> Option<FilterTree> {
        if !self.can_redo() {
            return None;
        }
        let index = self.index.map_or(0, |i| i + 1);
        self.index = Some(index);
        debug!(index, "Redo");
        self.entries.get(index).map(|entry| entry.tree.clone())
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.is_some_and(|i| i + 1 < self.entries.len())
    }

    /// Drops every snapshot and resets the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor position, `None` when empty.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// All snapshots, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.index.and_then(|i| self.entries.get(i))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_version(version: u64) -> FilterTree {
        let mut tree = FilterTree::new("t", "me");
        tree.version = version;
        tree
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::new();
        assert!(history.is_empty());
        assert_eq!(history.index(), None);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_single_entry_cannot_undo() {
        let mut history = History::new();
        history.push(&tree_version(1), "Created tree");
        assert_eq!(history.index(), Some(0));
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert_eq!(history.index(), Some(0));
    }

    #[test]
    fn test_undo_redo_walk() {
        let mut history = History::new();
        for v in 1..=3 {
            history.push(&tree_version(v), format!("v{v}"));
        }

        assert_eq!(history.undo().unwrap().version, 2);
        assert_eq!(history.undo().unwrap().version, 1);
        assert!(history.undo().is_none());
        assert!(history.can_redo());
        assert_eq!(history.redo().unwrap().version, 2);
        assert_eq!(history.redo().unwrap().version, 3);
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_push_truncates_redo_tail() {
        let mut history = History::new();
        for v in 1..=3 {
            history.push(&tree_version(v), "edit");
        }
        history.undo();
        history.undo();
        history.push(&tree_version(10), "branch");

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.current().unwrap().tree.version, 10);
        assert_eq!(history.undo().unwrap().version, 1);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::new();
        for v in 1..=51 {
            history.push(&tree_version(v), "edit");
        }

        assert_eq!(history.len(), 50);
        assert_eq!(history.index(), Some(49));
        assert_eq!(history.entries().next().unwrap().tree.version, 2);

        let mut undos = 0;
        while history.undo().is_some() {
            undos += 1;
        }
        assert_eq!(undos, 49);
    }

    #[test]
    fn test_with_capacity_minimum_is_one() {
        let mut history = History::with_capacity(0);
        assert_eq!(history.capacity(), 1);
        history.push(&tree_version(1), "a");
        history.push(&tree_version(2), "b");
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().unwrap().action, "b");
    }

    #[test]
    fn test_snapshots_are_independent() {
        let mut history = History::new();
        let mut tree = tree_version(1);
        history.push(&tree, "first");
        tree.name = "renamed".to_string();

        assert_eq!(history.current().unwrap().tree.name, "t");
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.push(&tree_version(1), "a");
        history.push(&tree_version(2), "b");
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.index(), None);
        assert!(!history.can_undo());
    }
}
