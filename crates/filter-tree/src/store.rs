//! Caller-owned store of filter trees with selection and undo/redo history.
//!
//! A `TreeStore` is a plain value: there is no global instance. Applications
//! that need sharing wrap it in whatever synchronization suits them.

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::history::History;
use crate::model::{FilterTree, TreeMetadata};
use crate::validate::import_tree;

/// Set of trees, the current selection, and the edit history.
#[derive(Debug, Clone, Default)]
pub struct TreeStore {
    trees: Vec<FilterTree>,
    current_tree_id: Option<String>,
    history: History,
}

impl TreeStore {
    /// Creates an empty store with the default history capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store keeping at most `capacity` history entries.
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            history: History::with_capacity(capacity),
            ..Self::default()
        }
    }

    // ==================== Trees ====================

    /// Replaces the whole tree set. The selection is kept as is.
    pub fn set_trees(&mut self, trees: Vec<FilterTree>) {
        self.trees = trees;
    }

    /// Adds a tree and selects it. A tree with the same id is replaced.
    pub fn add_tree(&mut self, tree: FilterTree) {
        self.insert(tree);
    }

    /// Replaces the tree with the same id. Returns false if there is none.
    pub fn update_tree(&mut self, tree: FilterTree) -> bool {
        match self.trees.iter_mut().find(|t| t.id == tree.id) {
            Some(slot) => {
                *slot = tree;
                true
            }
            None => {
                debug!(tree_id = %tree.id, "update_tree: no tree with this id");
                false
            }
        }
    }

    /// Removes a tree, clearing the selection if it was current.
    pub fn delete_tree(&mut self, id: &str) -> bool {
        let before = self.trees.len();
        self.trees.retain(|t| t.id != id);
        if self.current_tree_id.as_deref() == Some(id) {
            self.current_tree_id = None;
        }
        self.trees.len() != before
    }

    pub fn trees(&self) -> &[FilterTree] {
        &self.trees
    }

    pub fn tree(&self, id: &str) -> Option<&FilterTree> {
        self.trees.iter().find(|t| t.id == id)
    }

    /// Listing of every tree without its contents.
    pub fn metadata(&self) -> Vec<TreeMetadata> {
        self.trees.iter().map(FilterTree::metadata).collect()
    }

    // ==================== Selection ====================

    pub fn set_current_tree(&mut self, id: Option<&str>) {
        self.current_tree_id = id.map(str::to_string);
    }

    /// The selected tree, if the selection names a tree in the set.
    pub fn current_tree(&self) -> Option<&FilterTree> {
        self.current_tree_id.as_deref().and_then(|id| self.tree(id))
    }

    pub fn current_tree_id(&self) -> Option<&str> {
        self.current_tree_id.as_deref()
    }

    // ==================== History ====================

    /// Records a snapshot of `tree` labelled with `action`.
    pub fn record(&mut self, tree: &FilterTree, action: impl Into<String>) {
        self.history.push(tree, action);
    }

    /// Steps back in history and writes the restored snapshot into the set.
    pub fn undo(&mut self) -> Option<FilterTree> {
        let restored = self.history.undo()?;
        self.update_tree(restored.clone());
        Some(restored)
    }

    /// Steps forward in history and writes the restored snapshot into the set.
    pub fn redo(&mut self) -> Option<FilterTree> {
        let restored = self.history.redo()?;
        self.update_tree(restored.clone());
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // ==================== Workflows ====================

    /// Creates an empty tree, adds and selects it, and records it in history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyName`] if `name` is blank; the store is
    /// unchanged.
    pub fn create_tree(
        &mut self,
        name: impl Into<String>,
        created_by: impl Into<String>,
    ) -> StoreResult<&FilterTree> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        let tree = FilterTree::new(name, created_by);
        self.history.push(&tree, "Created tree");
        let index = self.insert(tree);
        Ok(&self.trees[index])
    }

    /// Runs `edit` on the current tree and keeps the result if it changed.
    ///
    /// A changed tree replaces the current one and is recorded in history
    /// under `action`. Returns whether anything changed.
    pub fn apply<F>(&mut self, action: &str, edit: F) -> StoreResult<bool>
    where
        F: FnOnce(&FilterTree) -> FilterTree,
    {
        let current = self.current_tree().ok_or(StoreError::NoCurrentTree)?;
        let edited = edit(current);
        if !crate::editor::is_change(current, &edited) {
            debug!(action, "Edit was a no-op; nothing recorded");
            return Ok(false);
        }

        self.history.push(&edited, action);
        self.update_tree(edited);
        Ok(true)
    }

    /// Imports a tree from JSON text, adding and selecting it.
    ///
    /// History is left alone. On failure the store is unchanged.
    pub fn import(&mut self, json: &str) -> StoreResult<&FilterTree> {
        let tree = import_tree(json)?;
        debug!(tree_id = %tree.id, "Imported tree");
        let index = self.insert(tree);
        Ok(&self.trees[index])
    }

    /// Serializes the current tree as pretty-printed JSON.
    pub fn export_current(&self) -> StoreResult<String> {
        let tree = self.current_tree().ok_or(StoreError::NoCurrentTree)?;
        Ok(serde_json::to_string_pretty(tree)?)
    }

    fn insert(&mut self, tree: FilterTree) -> usize {
        self.current_tree_id = Some(tree.id.clone());
        match self.trees.iter().position(|t| t.id == tree.id) {
            Some(index) => {
                self.trees[index] = tree;
                index
            }
            None => {
                self.trees.push(tree);
                self.trees.len() - 1
            }
        }
    }
}
