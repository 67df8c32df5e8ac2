//! Identity-based lookups over a tree.
//!
//! Items are addressed by id, never by position. All searches are depth-first
//! and pre-order. Ids are expected to be unique within a tree; if they are not,
//! the first pre-order match wins. Imported trees are checked for duplicates by
//! [`validate`](crate::validate::validate).

use crate::model::{FilterItem, FilterLeaf, FilterNode, ItemRef};

/// Finds the node or leaf with the given id, including the root itself.
pub fn find_by_id<'a>(root: &'a FilterNode, id: &str) -> Option<ItemRef<'a>> {
    if root.id == id {
        return Some(ItemRef::Node(root));
    }
    root.children.iter().find_map(|child| match child {
        FilterItem::Node(node) => find_by_id(node, id),
        FilterItem::Leaf(leaf) => (leaf.id == id).then_some(ItemRef::Leaf(leaf)),
    })
}

/// Finds the direct parent of the item with the given id.
///
/// Returns `None` when `child_id` is the root (roots have no parent) or is not
/// in the tree.
pub fn find_parent<'a>(root: &'a FilterNode, child_id: &str) -> Option<&'a FilterNode> {
    for child in &root.children {
        if child.id() == child_id {
            return Some(root);
        }
        if let FilterItem::Node(node) = child {
            if let Some(parent) = find_parent(node, child_id) {
                return Some(parent);
            }
        }
    }
    None
}

/// Returns the child-index path from the root to the item with the given id.
///
/// The root itself has an empty path. Follows the same pre-order as
/// [`find_by_id`], so both agree on which item an id designates.
pub(crate) fn locate(root: &FilterNode, id: &str) -> Option<Vec<usize>> {
    if root.id == id {
        return Some(Vec::new());
    }
    for (index, child) in root.children.iter().enumerate() {
        let found = match child {
            FilterItem::Node(node) => locate(node, id),
            FilterItem::Leaf(leaf) => (leaf.id == id).then(Vec::new),
        };
        if let Some(mut path) = found {
            path.insert(0, index);
            return Some(path);
        }
    }
    None
}

/// Mutable view of a located item.
pub(crate) enum ItemMut<'a> {
    Node(&'a mut FilterNode),
    Leaf(&'a mut FilterLeaf),
}

/// Follows `path` to a node. Fails if the path runs through or ends at a leaf.
pub(crate) fn node_at_mut<'a>(root: &'a mut FilterNode, path: &[usize]) -> Option<&'a mut FilterNode> {
    path.iter()
        .try_fold(root, |node, &index| match node.children.get_mut(index)? {
            FilterItem::Node(child) => Some(child),
            FilterItem::Leaf(_) => None,
        })
}

/// Follows `path` to a node or leaf.
pub(crate) fn item_at_mut<'a>(root: &'a mut FilterNode, path: &[usize]) -> Option<ItemMut<'a>> {
    let Some((&last, parents)) = path.split_last() else {
        return Some(ItemMut::Node(root));
    };
    match node_at_mut(root, parents)?.children.get_mut(last)? {
        FilterItem::Node(node) => Some(ItemMut::Node(node)),
        FilterItem::Leaf(leaf) => Some(ItemMut::Leaf(leaf)),
    }
}

/// Visits every item below and including `root` in pre-order.
pub fn walk<'a>(root: ItemRef<'a>, visit: &mut impl FnMut(ItemRef<'a>)) {
    visit(root);
    if let ItemRef::Node(node) = root {
        for child in &node.children {
            walk(ItemRef::from(child), visit);
        }
    }
}
