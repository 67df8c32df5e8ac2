//! Tree output formatting (show, new, edits).

use filter_tree::lookup::walk;
use filter_tree::{count_items, tree_to_text, FilterTree, ItemCounts, ItemRef};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::commands::edit::EditResult;

use super::helpers::{bold, dimmed, truncate_id};

/// Formats a tree as an indented outline, one item per line, with ids.
pub fn format_tree_text(tree: &FilterTree, use_colors: bool) -> String {
    let mut output = String::new();

    let header = format!("{} (v{})", tree.name, tree.version);
    output.push_str(&bold(&header, use_colors));
    output.push('\n');
    if let Some(description) = &tree.description {
        output.push_str(&dimmed(description, use_colors));
        output.push('\n');
    }
    output.push('\n');

    // tree_to_text emits one line per item in pre-order, as does walk.
    let mut items = Vec::new();
    walk(ItemRef::Node(&tree.root), &mut |item| items.push(item));
    let text = tree_to_text(&tree.root, 0);

    for (line, item) in text.lines().zip(items) {
        let line = if item.enabled() || !use_colors {
            line.to_string()
        } else {
            line.dimmed().to_string()
        };
        let id = format!("[{}]", truncate_id(item.id()));
        output.push_str(&format!("{line}  {}\n", dimmed(&id, use_colors)));
    }

    output
}

/// Formats a tree document as pretty JSON.
pub fn format_tree_json(tree: &FilterTree) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tree)
}

/// JSON output structure for the summary view.
#[derive(Serialize)]
pub struct TreeSummaryOutput<'a> {
    pub id: &'a str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub created_by: &'a str,
    pub created_at: String,
    pub updated_at: String,
    pub version: u64,
    pub root_operator: &'static str,
    pub nodes: usize,
    pub leaves: usize,
    pub disabled: usize,
}

fn disabled_count(tree: &FilterTree) -> usize {
    let mut disabled = 0;
    walk(ItemRef::Node(&tree.root), &mut |item| {
        if !item.enabled() {
            disabled += 1;
        }
    });
    disabled
}

/// Formats tree metadata and counts as JSON.
pub fn format_summary_json(tree: &FilterTree) -> Result<String, serde_json::Error> {
    let counts = count_items(&tree.root);
    let output = TreeSummaryOutput {
        id: &tree.id,
        name: &tree.name,
        description: tree.description.as_deref(),
        created_by: &tree.created_by,
        created_at: tree.created_at.to_rfc3339(),
        updated_at: tree.updated_at.to_rfc3339(),
        version: tree.version,
        root_operator: tree.root.operator.as_str(),
        nodes: counts.nodes,
        leaves: counts.leaves,
        disabled: disabled_count(tree),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats tree metadata and counts as aligned text.
pub fn format_summary_table(tree: &FilterTree, use_colors: bool) -> String {
    let ItemCounts { nodes, leaves } = count_items(&tree.root);
    let rows = [
        ("ID", tree.id.clone()),
        ("Name", tree.name.clone()),
        (
            "Description",
            tree.description.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("Created by", tree.created_by.clone()),
        (
            "Created",
            tree.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
        (
            "Updated",
            tree.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
        ("Version", tree.version.to_string()),
        ("Root", tree.root.operator.to_string()),
        ("Groups", nodes.to_string()),
        ("Conditions", leaves.to_string()),
        ("Disabled", disabled_count(tree).to_string()),
    ];

    let mut output = String::new();
    for (label, value) in rows {
        let label = format!("{:<12}", format!("{label}:"));
        output.push_str(&format!("{} {value}\n", dimmed(&label, use_colors)));
    }
    output
}

/// JSON output structure for edit commands.
#[derive(Serialize)]
pub struct EditOutput<'a> {
    pub id: &'a str,
    pub version: u64,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<&'a str>,
}

/// Formats an edit result as JSON.
pub fn format_edit_json(result: &EditResult) -> Result<String, serde_json::Error> {
    let output = EditOutput {
        id: &result.tree_id,
        version: result.version,
        changed: result.changed,
        item_id: result.item_id.as_deref(),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats an edit result as a one-line message.
pub fn format_edit_text(result: &EditResult, use_colors: bool) -> String {
    if !result.changed {
        return format!("No change (still v{})", result.version);
    }
    let version = format!("v{}", result.version);
    let version = if use_colors {
        version.green().to_string()
    } else {
        version
    };
    match &result.item_id {
        Some(item_id) => format!("{} {item_id} ({version})", result.action),
        None => format!("{} ({version})", result.action),
    }
}
