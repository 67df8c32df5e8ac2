//! Copy-on-write structural edits.
//!
//! Every operation takes the current tree by reference and returns a new tree.
//! The input is never modified. An edit that takes effect bumps `version` by
//! one and advances `updated_at`; an edit whose target id is missing, or whose
//! target has the wrong kind, returns an unchanged copy of the input. Use
//! [`is_change`] to tell the two apart.
//!
//! # Example
//!
//! ```
//! use filter_tree::editor::{add_child, is_change, toggle_operator};
//! use filter_tree::{ComparisonOperator, FilterLeaf, FilterTree};
//!
//! let tree = FilterTree::new("Adults", "alice");
//! let leaf = FilterLeaf::condition("age", ComparisonOperator::GreaterThan, 18);
//!
//! let edited = add_child(&tree, &tree.root.id, leaf.into());
//! assert!(is_change(&tree, &edited));
//! assert_eq!(edited.version, 2);
//!
//! let edited = toggle_operator(&edited, &edited.root.id);
//! assert_eq!(edited.version, 3);
//! ```

use serde_json::Value;
use tracing::debug;

use crate::lookup::{self, item_at_mut, locate, node_at_mut, ItemMut};
use crate::model::{
    ComparisonOperator, FieldType, FilterItem, FilterNode, FilterTree, ItemRef, LogicalOperator,
};

/// Sparse update where each `Some` field overwrites the target's value.
///
/// Fields that do not exist on the located item kind are ignored: a
/// `comparison` set on a node, or `logical` set on a leaf, has no effect. The
/// item's id and kind can never be changed through an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    /// Replacement enabled flag (nodes and leaves).
    pub enabled: Option<bool>,
    /// Replacement field path (leaves).
    pub field: Option<String>,
    /// Replacement comparison operator (leaves).
    pub comparison: Option<ComparisonOperator>,
    /// Replacement operand (leaves).
    pub value: Option<Value>,
    /// Replacement declared field type (leaves).
    pub field_type: Option<FieldType>,
    /// Replacement logical operator (nodes).
    pub logical: Option<LogicalOperator>,
    /// Replacement children (nodes).
    pub children: Option<Vec<FilterItem>>,
}

impl ItemUpdate {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// An update that only sets the enabled flag.
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    /// An update that only sets a node's logical operator.
    pub fn logical(operator: LogicalOperator) -> Self {
        Self {
            logical: Some(operator),
            ..Self::default()
        }
    }

    fn apply_to(self, item: ItemMut<'_>) {
        match item {
            ItemMut::Node(node) => {
                if let Some(enabled) = self.enabled {
                    node.enabled = enabled;
                }
                if let Some(operator) = self.logical {
                    node.operator = operator;
                }
                if let Some(children) = self.children {
                    node.children = children;
                }
            }
            ItemMut::Leaf(leaf) => {
                if let Some(enabled) = self.enabled {
                    leaf.enabled = enabled;
                }
                if let Some(field) = self.field {
                    leaf.field = field;
                }
                if let Some(operator) = self.comparison {
                    leaf.operator = operator;
                }
                if let Some(value) = self.value {
                    leaf.value = value;
                }
                if let Some(field_type) = self.field_type {
                    leaf.field_type = field_type;
                }
            }
        }
    }
}

/// Appends `item` to the children of the node `parent_id`.
///
/// No-op if `parent_id` is missing or names a leaf.
pub fn add_child(tree: &FilterTree, parent_id: &str, item: FilterItem) -> FilterTree {
    apply(tree, "add_child", parent_id, |root, path| {
        let Some(parent) = node_at_mut(root, path) else {
            return false;
        };
        parent.children.push(item);
        true
    })
}

/// Removes the item `item_id` from its parent's children.
///
/// No-op if `item_id` is the root or is missing.
pub fn remove_child(tree: &FilterTree, item_id: &str) -> FilterTree {
    apply(tree, "remove_child", item_id, |root, path| {
        let Some((_, parent_path)) = path.split_last() else {
            return false;
        };
        let Some(parent) = node_at_mut(root, parent_path) else {
            return false;
        };
        parent.children.retain(|child| child.id() != item_id);
        true
    })
}

/// Merges `update` onto the node or leaf `item_id`.
///
/// No-op if `item_id` is missing.
pub fn update_item(tree: &FilterTree, item_id: &str, update: ItemUpdate) -> FilterTree {
    apply(tree, "update_item", item_id, |root, path| {
        let Some(item) = item_at_mut(root, path) else {
            return false;
        };
        update.apply_to(item);
        true
    })
}

/// Flips the logical operator of node `node_id` between AND and OR.
///
/// No-op if `node_id` is missing or names a leaf.
pub fn toggle_operator(tree: &FilterTree, node_id: &str) -> FilterTree {
    match lookup::find_by_id(&tree.root, node_id) {
        Some(ItemRef::Node(node)) => {
            update_item(tree, node_id, ItemUpdate::logical(node.operator.toggled()))
        }
        Some(ItemRef::Leaf(_)) | None => {
            debug!(target_id = node_id, "toggle_operator: no node with this id");
            tree.clone()
        }
    }
}

/// Flips the enabled flag of the node or leaf `item_id`.
///
/// No-op if `item_id` is missing.
pub fn toggle_enabled(tree: &FilterTree, item_id: &str) -> FilterTree {
    match lookup::find_by_id(&tree.root, item_id) {
        Some(item) => update_item(tree, item_id, ItemUpdate::enabled(!item.enabled())),
        None => {
            debug!(target_id = item_id, "toggle_enabled: no item with this id");
            tree.clone()
        }
    }
}

/// Returns true if `after` is the result of an edit that took effect on `before`.
pub fn is_change(before: &FilterTree, after: &FilterTree) -> bool {
    before.id != after.id || before.version != after.version
}

/// Copies `tree`, runs `edit` on the copy's root at the located path, and
/// stamps the copy if the edit reports success.
fn apply<F>(tree: &FilterTree, operation: &'static str, target_id: &str, edit: F) -> FilterTree
where
    F: FnOnce(&mut FilterNode, &[usize]) -> bool,
{
    let mut next = tree.clone();
    let Some(path) = locate(&next.root, target_id) else {
        debug!(operation, target_id, "target not found, tree unchanged");
        return next;
    };
    if !edit(&mut next.root, &path) {
        debug!(operation, target_id, "target has the wrong kind, tree unchanged");
        return tree.clone();
    }
    next.mark_changed();
    debug!(operation, target_id, version = next.version, "tree edited");
    next
}
