//! Structural edit commands: add-leaf, add-group, remove, toggle and set.
//!
//! Each command loads the tree file, applies one copy-on-write edit through a
//! [`TreeStore`], and writes the file back only when the edit took effect.
//! Item ids may be abbreviated to any unique prefix, and `root` names the
//! root group.

use std::path::{Path, PathBuf};

use filter_tree::editor::{add_child, remove_child, toggle_enabled, toggle_operator, update_item};
use filter_tree::lookup::walk;
use filter_tree::{
    ComparisonOperator, FieldType, FilterItem, FilterLeaf, FilterNode, FilterTree, ItemRef,
    ItemUpdate, LogicalOperator, TreeStore,
};
use serde_json::Value;
use tracing::debug;

use super::{parse_value, CommandContext, CommandError, Result};
use crate::output::{format_edit_json, format_edit_text};
use crate::tree_file::TreeFile;

/// Keyword accepted wherever an item id is expected, naming the root group.
pub const ROOT_ALIAS: &str = "root";

/// Outcome of an edit command.
#[derive(Debug, Clone)]
pub struct EditResult {
    /// Id of the edited tree.
    pub tree_id: String,
    /// Tree version after the edit.
    pub version: u64,
    /// Whether the edit took effect (and the file was written).
    pub changed: bool,
    /// The item that was added or edited.
    pub item_id: Option<String>,
    /// Human-readable action label.
    pub action: String,
}

/// Resolves a user-supplied item reference to a full id.
///
/// Accepts [`ROOT_ALIAS`], a full id, or a unique id prefix.
///
/// # Errors
///
/// Returns [`CommandError::InvalidArgument`] if nothing matches or the prefix
/// is ambiguous.
pub fn resolve_item_id(tree: &FilterTree, query: &str) -> Result<String> {
    if query.eq_ignore_ascii_case(ROOT_ALIAS) {
        return Ok(tree.root.id.clone());
    }

    let mut exact = None;
    let mut matches = Vec::new();
    walk(ItemRef::Node(&tree.root), &mut |item| {
        if item.id() == query {
            exact = Some(item.id());
        } else if !query.is_empty() && item.id().starts_with(query) {
            matches.push(item.id());
        }
    });

    if let Some(id) = exact {
        return Ok(id.to_string());
    }
    match matches.as_slice() {
        [id] => Ok((*id).to_string()),
        [] => Err(CommandError::InvalidArgument(format!(
            "no item matches '{query}'"
        ))),
        ids => Err(CommandError::InvalidArgument(format!(
            "'{query}' is ambiguous ({} items match)",
            ids.len()
        ))),
    }
}

/// Resolves `query` and checks that it names a group.
pub(crate) fn resolve_node_id(tree: &FilterTree, query: &str) -> Result<String> {
    let id = resolve_item_id(tree, query)?;
    match filter_tree::find_by_id(&tree.root, &id) {
        Some(ItemRef::Node(_)) => Ok(id),
        _ => Err(CommandError::InvalidArgument(format!(
            "'{query}' is a condition, not a group"
        ))),
    }
}

/// Resolves `query` and checks that it names a condition.
pub(crate) fn resolve_leaf_id(tree: &FilterTree, query: &str) -> Result<String> {
    let id = resolve_item_id(tree, query)?;
    match filter_tree::find_by_id(&tree.root, &id) {
        Some(ItemRef::Leaf(_)) => Ok(id),
        _ => Err(CommandError::InvalidArgument(format!(
            "'{query}' is a group, not a condition"
        ))),
    }
}

/// Builds a new condition from command-line strings.
///
/// Without an explicit field type, the type is inferred from the value.
/// Operators that ignore their operand (`is_null`, `is_not_null`) may omit
/// the value; every other operator requires one.
pub(crate) fn build_leaf(
    field: &str,
    operator: &str,
    value: Option<&str>,
    field_type: Option<&str>,
) -> Result<FilterLeaf> {
    let operator: ComparisonOperator = operator.parse()?;
    let value = match value {
        Some(raw) => parse_value(raw),
        None if operator.reads_value() => {
            return Err(CommandError::InvalidArgument(format!(
                "operator '{operator}' needs a value"
            )))
        }
        None => Value::String(String::new()),
    };

    let mut leaf = FilterLeaf::condition(field, operator, value);
    if let Some(field_type) = field_type {
        leaf.field_type = field_type.parse()?;
    }
    Ok(leaf)
}

/// Builds a sparse update from optional command-line strings.
pub(crate) fn build_update(
    field: Option<&str>,
    operator: Option<&str>,
    value: Option<&str>,
    field_type: Option<&str>,
) -> Result<ItemUpdate> {
    let update = ItemUpdate {
        field: field.map(str::to_string),
        comparison: operator.map(str::parse::<ComparisonOperator>).transpose()?,
        value: value.map(parse_value),
        field_type: field_type.map(str::parse::<FieldType>).transpose()?,
        ..ItemUpdate::default()
    };
    if update.is_empty() {
        return Err(CommandError::InvalidArgument(
            "nothing to update (give --field, --op, --value or --field-type)".to_string(),
        ));
    }
    Ok(update)
}

/// An edit planned against the loaded tree, before it is applied.
#[derive(Debug)]
pub(crate) struct PlannedEdit {
    /// The edited copy of the tree.
    pub tree: FilterTree,
    pub action: String,
    pub item_id: Option<String>,
}

impl PlannedEdit {
    fn new(tree: FilterTree, action: impl Into<String>, item_id: Option<String>) -> Self {
        Self {
            tree,
            action: action.into(),
            item_id,
        }
    }
}

/// Loads `path`, plans an edit on it, and saves the result if it changed.
///
/// `plan` sees the loaded tree, so id resolution and the edit share one read
/// of the file.
fn run_edit<F>(ctx: &CommandContext, path: &Path, plan: F) -> Result<()>
where
    F: FnOnce(&FilterTree) -> Result<PlannedEdit>,
{
    let file = TreeFile::new(path);
    let mut store = TreeStore::new();
    store.add_tree(file.load()?);

    // Planning can fail while resolving ids; surface that before applying.
    let current = store
        .current_tree()
        .ok_or(filter_tree::StoreError::NoCurrentTree)?;
    let PlannedEdit {
        tree: edited,
        action,
        item_id,
    } = plan(current)?;
    let changed = store.apply(&action, move |_| edited)?;

    let tree = store
        .current_tree()
        .ok_or(filter_tree::StoreError::NoCurrentTree)?;
    if changed {
        file.save(tree)?;
    }
    debug!(action = %action, changed, version = tree.version, "Edit applied");

    let result = EditResult {
        tree_id: tree.id.clone(),
        version: tree.version,
        changed,
        item_id,
        action,
    };
    print_edit(ctx, &result)
}

fn print_edit(ctx: &CommandContext, result: &EditResult) -> Result<()> {
    if ctx.json_output {
        println!("{}", format_edit_json(result)?);
    } else if !ctx.quiet {
        println!("{}", format_edit_text(result, ctx.use_colors));
    }
    Ok(())
}

/// Options for the add-leaf command.
#[derive(Debug)]
pub struct AddLeafOptions {
    pub file: PathBuf,
    pub parent: String,
    pub field: String,
    pub op: String,
    pub value: Option<String>,
    pub field_type: Option<String>,
}

/// Executes the add-leaf command.
pub fn execute_add_leaf(ctx: &CommandContext, opts: &AddLeafOptions) -> Result<()> {
    let leaf = build_leaf(
        &opts.field,
        &opts.op,
        opts.value.as_deref(),
        opts.field_type.as_deref(),
    )?;
    let leaf_id = leaf.id.clone();
    run_edit(ctx, &opts.file, |tree| {
        let parent = resolve_node_id(tree, &opts.parent)?;
        let edited = add_child(tree, &parent, FilterItem::Leaf(leaf));
        Ok(PlannedEdit::new(edited, "Added condition", Some(leaf_id)))
    })
}

/// Options for the add-group command.
#[derive(Debug)]
pub struct AddGroupOptions {
    pub file: PathBuf,
    pub parent: String,
    pub op: String,
}

/// Executes the add-group command.
pub fn execute_add_group(ctx: &CommandContext, opts: &AddGroupOptions) -> Result<()> {
    let operator: LogicalOperator = opts.op.parse()?;
    let node = FilterNode::new(operator);
    let node_id = node.id.clone();
    run_edit(ctx, &opts.file, |tree| {
        let parent = resolve_node_id(tree, &opts.parent)?;
        let edited = add_child(tree, &parent, FilterItem::Node(node));
        Ok(PlannedEdit::new(edited, format!("Added {operator} group"), Some(node_id)))
    })
}

/// Options for the remove command.
#[derive(Debug)]
pub struct RemoveOptions {
    pub file: PathBuf,
    pub id: String,
}

/// Executes the remove command. The root group cannot be removed.
pub fn execute_remove(ctx: &CommandContext, opts: &RemoveOptions) -> Result<()> {
    run_edit(ctx, &opts.file, |tree| {
        let id = resolve_item_id(tree, &opts.id)?;
        if id == tree.root.id {
            return Err(CommandError::InvalidArgument(
                "the root group cannot be removed".to_string(),
            ));
        }
        Ok(PlannedEdit::new(remove_child(tree, &id), "Removed", None))
    })
}

/// Options for the toggle command.
#[derive(Debug)]
pub struct ToggleOptions {
    pub file: PathBuf,
    pub id: String,
    /// Flip AND/OR instead of the enabled flag.
    pub operator: bool,
}

/// Plans a toggle of `query`'s enabled flag, or of its AND/OR operator.
pub(crate) fn plan_toggle(tree: &FilterTree, query: &str, operator: bool) -> Result<PlannedEdit> {
    let id = if operator {
        resolve_node_id(tree, query)?
    } else {
        resolve_item_id(tree, query)?
    };

    let action = match filter_tree::find_by_id(&tree.root, &id) {
        Some(ItemRef::Node(node)) if operator => {
            format!("Switched to {}", node.operator.toggled())
        }
        Some(item) if item.enabled() => "Disabled".to_string(),
        _ => "Enabled".to_string(),
    };
    let edited = if operator {
        toggle_operator(tree, &id)
    } else {
        toggle_enabled(tree, &id)
    };
    Ok(PlannedEdit::new(edited, action, Some(id)))
}

/// Executes the toggle command.
pub fn execute_toggle(ctx: &CommandContext, opts: &ToggleOptions) -> Result<()> {
    run_edit(ctx, &opts.file, |tree| plan_toggle(tree, &opts.id, opts.operator))
}

/// Options for the set command.
#[derive(Debug)]
pub struct SetOptions {
    pub file: PathBuf,
    pub id: String,
    pub field: Option<String>,
    pub op: Option<String>,
    pub value: Option<String>,
    pub field_type: Option<String>,
}

/// Executes the set command on a condition.
pub fn execute_set(ctx: &CommandContext, opts: &SetOptions) -> Result<()> {
    let update = build_update(
        opts.field.as_deref(),
        opts.op.as_deref(),
        opts.value.as_deref(),
        opts.field_type.as_deref(),
    )?;
    run_edit(ctx, &opts.file, |tree| {
        let id = resolve_leaf_id(tree, &opts.id)?;
        let edited = update_item(tree, &id, update);
        Ok(PlannedEdit::new(edited, "Updated", Some(id)))
    })
}
