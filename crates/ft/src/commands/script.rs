//! Script command implementation.
//!
//! Replays a line-oriented edit script against a tree file. Every accepted
//! edit is recorded in the store's history, so scripts can `undo` and `redo`.
//!
//! ```text
//! # blank lines and lines starting with '#' are ignored
//! adults: add-group root OR
//! add-leaf adults age greater_than_or_equal 18
//! role: add-leaf root user.role in ["admin", "owner"]
//! set role op not_in
//! toggle-op adults
//! undo
//! ```
//!
//! A `name:` prefix on an add line binds `name` to the new item's id for the
//! rest of the script. Item references elsewhere accept a bound name, `root`,
//! a full id, or a unique id prefix.

use std::collections::HashMap;
use std::path::PathBuf;

use filter_tree::editor::{
    add_child, is_change, remove_child, toggle_enabled, toggle_operator, update_item,
};
use filter_tree::{
    find_by_id, FilterItem, FilterNode, FilterTree, ItemRef, ItemUpdate, LogicalOperator,
    TreeStore,
};
use serde::Serialize;
use tracing::debug;

use super::config::{load_config, parse_bool};
use super::edit::{build_leaf, build_update, resolve_item_id};
use super::{read_input, CommandContext, CommandError, Result};
use crate::tree_file::TreeFile;

/// One parsed script command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    AddLeaf {
        parent: String,
        field: String,
        op: String,
        value: Option<String>,
    },
    AddGroup {
        parent: String,
        op: Option<String>,
    },
    Remove {
        id: String,
    },
    Toggle {
        id: String,
    },
    ToggleOp {
        id: String,
    },
    Set {
        id: String,
        property: String,
        value: String,
    },
    Undo,
    Redo,
}

/// A parsed script line with its optional binding name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub number: usize,
    pub alias: Option<String>,
    pub command: ScriptCommand,
}

/// Splits off the first whitespace-delimited word.
fn next_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], s[end..].trim_start())),
        None => Some((s, "")),
    }
}

fn script_error(line: usize, message: impl Into<String>) -> CommandError {
    CommandError::Script {
        line,
        message: message.into(),
    }
}

/// Parses a whole script. Blank and comment lines are skipped.
///
/// # Errors
///
/// Returns [`CommandError::Script`] naming the first malformed line.
pub fn parse_script(source: &str) -> Result<Vec<ScriptLine>> {
    let mut lines = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        lines.push(parse_line(number, line)?);
    }
    Ok(lines)
}

fn parse_line(number: usize, line: &str) -> Result<ScriptLine> {
    let (first, mut rest) = next_word(line).ok_or_else(|| script_error(number, "empty line"))?;

    let (alias, verb) = match first.strip_suffix(':') {
        Some(alias) if !alias.is_empty() => {
            let (verb, after) =
                next_word(rest).ok_or_else(|| script_error(number, "missing command"))?;
            rest = after;
            (Some(alias.to_string()), verb)
        }
        _ => (None, first),
    };

    let mut args = rest;
    let mut arg = |name: &str| -> Result<String> {
        let (word, after) = next_word(args)
            .ok_or_else(|| script_error(number, format!("{verb}: missing <{name}>")))?;
        args = after;
        Ok(word.to_string())
    };

    let command = match verb {
        "add-leaf" => {
            let parent = arg("parent")?;
            let field = arg("field")?;
            let op = arg("op")?;
            let value = (!args.is_empty()).then(|| args.to_string());
            ScriptCommand::AddLeaf {
                parent,
                field,
                op,
                value,
            }
        }
        "add-group" => {
            let parent = arg("parent")?;
            let op = (!args.is_empty()).then(|| args.trim().to_string());
            ScriptCommand::AddGroup { parent, op }
        }
        "remove" => ScriptCommand::Remove { id: arg("id")? },
        "toggle" => ScriptCommand::Toggle { id: arg("id")? },
        "toggle-op" => ScriptCommand::ToggleOp { id: arg("id")? },
        "set" => {
            let id = arg("id")?;
            let property = arg("property")?;
            if args.is_empty() {
                return Err(script_error(number, format!("set: missing value for {property}")));
            }
            ScriptCommand::Set {
                id,
                property,
                value: args.to_string(),
            }
        }
        "undo" => ScriptCommand::Undo,
        "redo" => ScriptCommand::Redo,
        other => return Err(script_error(number, format!("unknown command '{other}'"))),
    };

    let adds = matches!(
        command,
        ScriptCommand::AddLeaf { .. } | ScriptCommand::AddGroup { .. }
    );
    if alias.is_some() && !adds {
        return Err(script_error(
            number,
            "names can only be bound on add-leaf and add-group",
        ));
    }

    Ok(ScriptLine {
        number,
        alias,
        command,
    })
}

/// Outcome of running a script.
#[derive(Debug)]
pub struct ScriptOutcome {
    /// The tree after the last line.
    pub tree: FilterTree,
    /// Edits that changed the tree.
    pub applied: usize,
    /// Edits that left the tree unchanged.
    pub unchanged: usize,
    /// Non-fatal problems, such as an `undo` with nothing to undo.
    pub warnings: Vec<String>,
}

struct ScriptRunner {
    store: TreeStore,
    aliases: HashMap<String, String>,
    applied: usize,
    unchanged: usize,
    warnings: Vec<String>,
}

impl ScriptRunner {
    fn current(&self, line: usize) -> Result<&FilterTree> {
        self.store
            .current_tree()
            .ok_or_else(|| script_error(line, "no tree loaded"))
    }

    fn resolve(&self, line: usize, reference: &str) -> Result<String> {
        if let Some(id) = self.aliases.get(reference) {
            return Ok(id.clone());
        }
        resolve_item_id(self.current(line)?, reference)
            .map_err(|e| script_error(line, e.to_string()))
    }

    /// Like [`Self::resolve`], but the item must be a group.
    fn resolve_node(&self, line: usize, reference: &str) -> Result<String> {
        let id = self.resolve(line, reference)?;
        match find_by_id(&self.current(line)?.root, &id) {
            Some(ItemRef::Node(_)) => Ok(id),
            Some(ItemRef::Leaf(_)) => Err(script_error(
                line,
                format!("'{reference}' is a condition, not a group"),
            )),
            None => Err(script_error(
                line,
                format!("'{reference}' is no longer in the tree"),
            )),
        }
    }

    /// Applies `edit` and returns whether it changed the tree.
    fn apply<F>(&mut self, action: &str, edit: F) -> Result<bool>
    where
        F: FnOnce(&FilterTree) -> FilterTree,
    {
        let changed = self.store.apply(action, edit)?;
        if changed {
            self.applied += 1;
        } else {
            self.unchanged += 1;
        }
        Ok(changed)
    }

    fn warn(&mut self, line: usize, message: &str) {
        debug!(line, message, "Script warning");
        self.warnings.push(format!("line {line}: {message}"));
    }

    fn run_line(&mut self, line: &ScriptLine) -> Result<()> {
        let n = line.number;
        let to_script_error = |e: CommandError| match e {
            CommandError::Script { .. } => e,
            other => script_error(n, other.to_string()),
        };

        match &line.command {
            ScriptCommand::AddLeaf {
                parent,
                field,
                op,
                value,
            } => {
                let parent = self.resolve_node(n, parent)?;
                let leaf = build_leaf(field, op, value.as_deref(), None).map_err(to_script_error)?;
                let id = leaf.id.clone();
                if self.apply("Added condition", |tree| {
                    add_child(tree, &parent, FilterItem::Leaf(leaf))
                })? {
                    self.bind(line, &id);
                }
                Ok(())
            }
            ScriptCommand::AddGroup { parent, op } => {
                let parent = self.resolve_node(n, parent)?;
                let operator = match op {
                    Some(op) => op
                        .parse::<LogicalOperator>()
                        .map_err(|e| script_error(n, e.to_string()))?,
                    None => LogicalOperator::And,
                };
                let node = FilterNode::new(operator);
                let id = node.id.clone();
                if self.apply("Added group", |tree| {
                    add_child(tree, &parent, FilterItem::Node(node))
                })? {
                    self.bind(line, &id);
                }
                Ok(())
            }
            ScriptCommand::Remove { id } => {
                let id = self.resolve(n, id)?;
                self.apply("Removed", |tree| remove_child(tree, &id))?;
                Ok(())
            }
            ScriptCommand::Toggle { id } => {
                let id = self.resolve(n, id)?;
                self.apply("Toggled enabled", |tree| toggle_enabled(tree, &id))?;
                Ok(())
            }
            ScriptCommand::ToggleOp { id } => {
                let id = self.resolve(n, id)?;
                self.apply("Toggled operator", |tree| toggle_operator(tree, &id))?;
                Ok(())
            }
            ScriptCommand::Set {
                id,
                property,
                value,
            } => {
                let id = self.resolve(n, id)?;
                let is_node = matches!(
                    find_by_id(&self.current(n)?.root, &id),
                    Some(ItemRef::Node(_))
                );
                let update = set_update(property, value, is_node)
                    .map_err(|e| script_error(n, e.to_string()))?;
                self.apply("Updated", |tree| update_item(tree, &id, update))?;
                Ok(())
            }
            ScriptCommand::Undo => {
                if self.store.undo().is_none() {
                    self.warn(n, "nothing to undo");
                }
                Ok(())
            }
            ScriptCommand::Redo => {
                if self.store.redo().is_none() {
                    self.warn(n, "nothing to redo");
                }
                Ok(())
            }
        }
    }

    fn bind(&mut self, line: &ScriptLine, id: &str) {
        if let Some(alias) = &line.alias {
            self.aliases.insert(alias.clone(), id.to_string());
        }
    }
}

/// Builds the update for `set <id> <property> <value>`.
///
/// `op` sets the logical operator on a group and the comparison operator on
/// a condition. `field`, `value` and `type` only apply to conditions.
fn set_update(property: &str, value: &str, is_node: bool) -> Result<ItemUpdate> {
    match (property, is_node) {
        ("enabled", _) => parse_bool(value)
            .map(ItemUpdate::enabled)
            .map_err(|_| CommandError::InvalidArgument(format!("'{value}' is not a boolean"))),
        ("op", true) => Ok(ItemUpdate::logical(value.parse()?)),
        ("op", false) => build_update(None, Some(value), None, None),
        ("field", false) => build_update(Some(value), None, None, None),
        ("value", false) => build_update(None, None, Some(value), None),
        ("type", false) => build_update(None, None, None, Some(value)),
        ("field" | "value" | "type", true) => Err(CommandError::InvalidArgument(format!(
            "'{property}' cannot be set on a group"
        ))),
        _ => Err(CommandError::InvalidArgument(format!(
            "unknown property '{property}' (expected field, op, value, type or enabled)"
        ))),
    }
}

/// Runs parsed script lines against `tree`.
///
/// The starting tree is the first history entry, so `undo` can return to it
/// but never past it.
///
/// # Errors
///
/// Stops at the first line that cannot be applied.
pub fn run_script(
    tree: FilterTree,
    lines: &[ScriptLine],
    history_capacity: usize,
) -> Result<ScriptOutcome> {
    let mut store = TreeStore::with_history_capacity(history_capacity);
    store.record(&tree, "Loaded");
    store.add_tree(tree);

    let mut runner = ScriptRunner {
        store,
        aliases: HashMap::new(),
        applied: 0,
        unchanged: 0,
        warnings: Vec::new(),
    };
    for line in lines {
        runner.run_line(line)?;
        debug!(line = line.number, command = ?line.command, "Script line applied");
    }

    let tree = runner.current(0)?.clone();
    Ok(ScriptOutcome {
        tree,
        applied: runner.applied,
        unchanged: runner.unchanged,
        warnings: runner.warnings,
    })
}

/// Options for the script command.
#[derive(Debug)]
pub struct ScriptOptions {
    pub file: PathBuf,
    /// Script file, or `-` for stdin.
    pub script: PathBuf,
    pub dry_run: bool,
}

#[derive(Serialize)]
struct ScriptOutput<'a> {
    id: &'a str,
    version: u64,
    applied: usize,
    unchanged: usize,
    written: bool,
    warnings: &'a [String],
}

/// Executes the script command.
///
/// The file is written once, at the end, and only if the final tree differs
/// from the loaded one and `--dry-run` was not given.
pub fn execute(ctx: &CommandContext, opts: &ScriptOptions) -> Result<()> {
    let source = read_input(&opts.script)?;
    let lines = parse_script(&source)?;

    let file = TreeFile::new(&opts.file);
    let original = file.load()?;
    let config = load_config()?;

    let outcome = run_script(original.clone(), &lines, config.history_capacity())?;
    let changed = is_change(&original, &outcome.tree);
    let written = changed && !opts.dry_run;
    if written {
        file.save(&outcome.tree)?;
    }

    if ctx.json_output {
        let output = ScriptOutput {
            id: &outcome.tree.id,
            version: outcome.tree.version,
            applied: outcome.applied,
            unchanged: outcome.unchanged,
            written,
            warnings: &outcome.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if !ctx.quiet {
        for warning in &outcome.warnings {
            eprintln!("Warning: {warning}");
        }
        println!(
            "Applied {} edit(s), {} unchanged (v{})",
            outcome.applied, outcome.unchanged, outcome.tree.version
        );
        if opts.dry_run && changed {
            println!("Dry run: {} not written", opts.file.display());
        } else if !changed {
            println!("No change to {}", opts.file.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filter_tree::{evaluate_tree, ComparisonOperator, EvaluationContext};
    use serde_json::json;

    fn run(tree: FilterTree, script: &str) -> Result<ScriptOutcome> {
        run_script(tree, &parse_script(script)?, 50)
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let lines = parse_script("# header\n\n  undo\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 3);
        assert_eq!(lines[0].command, ScriptCommand::Undo);
    }

    #[test]
    fn test_parse_add_leaf_keeps_value_text() {
        let lines = parse_script(r#"r: add-leaf root user.role in ["admin", "owner"]"#).unwrap();
        assert_eq!(lines[0].alias.as_deref(), Some("r"));
        assert_eq!(
            lines[0].command,
            ScriptCommand::AddLeaf {
                parent: "root".to_string(),
                field: "user.role".to_string(),
                op: "in".to_string(),
                value: Some(r#"["admin", "owner"]"#.to_string()),
            }
        );
    }

    #[test]
    fn test_parse_errors_name_line() {
        let err = parse_script("undo\nfrobnicate x").unwrap_err();
        assert_eq!(err.to_string(), "script line 2: unknown command 'frobnicate'");

        let err = parse_script("add-leaf root age").unwrap_err();
        assert_eq!(err.to_string(), "script line 1: add-leaf: missing <op>");

        let err = parse_script("x: remove abc").unwrap_err();
        assert!(matches!(err, CommandError::Script { line: 1, .. }));
    }

    #[test]
    fn test_run_builds_tree() {
        let tree = FilterTree::new("Scripted", "tester");
        let outcome = run(
            tree,
            "adults: add-group root OR\n\
             add-leaf adults age greater_than_or_equal 18\n\
             add-leaf adults vip equals true\n\
             role: add-leaf root role equals admin\n\
             set role value guest\n",
        )
        .unwrap();

        assert_eq!(outcome.applied, 5);
        assert_eq!(outcome.tree.version, 6);
        assert_eq!(outcome.tree.root.children.len(), 2);

        let ctx = EvaluationContext::new(json!({"age": 12, "vip": true, "role": "guest"}));
        assert!(evaluate_tree(&outcome.tree, &ctx).passed);

        let role = outcome.tree.root.children[1].as_item_ref().as_leaf().unwrap();
        assert_eq!(role.operator, ComparisonOperator::Equals);
        assert_eq!(role.value, json!("guest"));
    }

    #[test]
    fn test_undo_redo() {
        let tree = FilterTree::new("Scripted", "tester");
        let outcome = run(
            tree.clone(),
            "add-leaf root a equals 1\nadd-leaf root b equals 2\nundo\nundo\nredo\n",
        )
        .unwrap();

        assert_eq!(outcome.tree.root.children.len(), 1);
        assert_eq!(outcome.tree.version, 2);
        assert!(outcome.warnings.is_empty());

        let outcome = run(tree.clone(), "add-leaf root a equals 1\nundo\nundo\nredo\nredo\n").unwrap();
        assert_eq!(outcome.tree.version, 2);
        assert_eq!(
            outcome.warnings,
            vec!["line 3: nothing to undo", "line 5: nothing to redo"]
        );
    }

    #[test]
    fn test_undo_to_start_is_unchanged() {
        let tree = FilterTree::new("Scripted", "tester");
        let outcome = run(tree.clone(), "add-group root\nundo\n").unwrap();
        assert_eq!(outcome.tree, tree);
        assert!(!is_change(&tree, &outcome.tree));
    }

    #[test]
    fn test_noop_edits_counted() {
        let tree = FilterTree::new("Scripted", "tester");
        let root = tree.root.id.clone();
        let err = run(tree, &format!("remove {root}\nset root field age\n")).unwrap_err();
        assert!(matches!(err, CommandError::Script { line: 2, .. }));

        let tree = FilterTree::new("Scripted", "tester");
        let root = tree.root.id.clone();
        let outcome = run(tree, &format!("remove {root}\n")).unwrap();
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.unchanged, 1);
    }

    #[test]
    fn test_set_group_operator_and_enabled() {
        let tree = FilterTree::new("Scripted", "tester");
        let outcome = run(tree, "set root op OR\nset root enabled false\n").unwrap();
        assert_eq!(outcome.tree.root.operator, LogicalOperator::Or);
        assert!(!outcome.tree.root.enabled);
    }

    #[test]
    fn test_add_under_condition_is_rejected() {
        let tree = FilterTree::new("Scripted", "tester");
        let err = run(
            tree,
            "age: add-leaf root age greater_than 18
             g: add-group age OR
",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "script line 2: 'age' is a condition, not a group"
        );

        let tree = FilterTree::new("Scripted", "tester");
        let err = run(
            tree,
            "g: add-group root
remove g
add-leaf g age equals 1
",
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Script { line: 3, .. }));
    }

    #[test]
    fn test_unknown_reference() {
        let tree = FilterTree::new("Scripted", "tester");
        let err = run(tree, "toggle nope").unwrap_err();
        assert_eq!(err.to_string(), "script line 1: no item matches 'nope'");
    }
}
