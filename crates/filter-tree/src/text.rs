//! Plain-text rendering and item statistics.

use serde::Serialize;

use crate::model::{FilterItem, ItemRef};

/// Renders an item and its descendants as indented text, one item per line.
///
/// Nodes print their logical operator; leaves print `field operator value`
/// with the value as compact JSON. Each nesting level adds two spaces, and
/// disabled items are prefixed with `[DISABLED] `.
///
/// ```
/// use filter_tree::{tree_to_text, ComparisonOperator, FilterLeaf, FilterNode, LogicalOperator};
///
/// let node = FilterNode::new(LogicalOperator::Or)
///     .with_child(FilterLeaf::condition("role", ComparisonOperator::Equals, "admin"));
/// assert_eq!(tree_to_text(&node, 0), "OR\n  role equals \"admin\"");
/// ```
pub fn tree_to_text<'a>(item: impl Into<ItemRef<'a>>, indent: usize) -> String {
    let mut lines = Vec::new();
    render(item.into(), indent, &mut lines);
    lines.join("\n")
}

fn render(item: ItemRef<'_>, indent: usize, lines: &mut Vec<String>) {
    let prefix = "  ".repeat(indent);
    let status = if item.enabled() { "" } else { "[DISABLED] " };
    match item {
        ItemRef::Leaf(leaf) => {
            lines.push(format!(
                "{prefix}{status}{} {} {}",
                leaf.field, leaf.operator, leaf.value
            ));
        }
        ItemRef::Node(node) => {
            lines.push(format!("{prefix}{status}{}", node.operator));
            for child in &node.children {
                render(ItemRef::from(child), indent + 1, lines);
            }
        }
    }
}

/// Number of nodes and leaves in a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ItemCounts {
    pub nodes: usize,
    pub leaves: usize,
}

impl ItemCounts {
    pub fn total(&self) -> usize {
        self.nodes + self.leaves
    }
}

/// Counts the nodes (including `item` itself, if a node) and leaves.
pub fn count_items<'a>(item: impl Into<ItemRef<'a>>) -> ItemCounts {
    match item.into() {
        ItemRef::Leaf(_) => ItemCounts { nodes: 0, leaves: 1 },
        ItemRef::Node(node) => node.children.iter().map(count_child).fold(
            ItemCounts { nodes: 1, leaves: 0 },
            |acc, counts| ItemCounts {
                nodes: acc.nodes + counts.nodes,
                leaves: acc.leaves + counts.leaves,
            },
        ),
    }
}

fn count_child(child: &FilterItem) -> ItemCounts {
    count_items(child)
}
