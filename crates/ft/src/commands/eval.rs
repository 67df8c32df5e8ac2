//! Eval command implementation.
//!
//! Evaluates a tree against a JSON data context. The verdict doubles as the
//! process exit status, so `ft eval` can gate shell pipelines.

use std::path::PathBuf;

use filter_tree::{evaluate_tree, EvaluationContext};
use serde_json::Value;

use super::{read_input, CommandContext, CommandError, Result};
use crate::output::{format_evaluation_json, format_evaluation_text};
use crate::tree_file::TreeFile;

/// Options for the eval command.
#[derive(Debug)]
pub struct EvalOptions {
    /// Tree file.
    pub file: PathBuf,
    /// Data file, or `-` for stdin.
    pub data: PathBuf,
    /// Print the per-item trace.
    pub trace: bool,
}

/// Executes the eval command and returns whether the tree passed.
///
/// # Errors
///
/// Returns an error if the tree cannot be loaded or the data is not JSON.
/// A failing evaluation is not an error.
pub fn execute(ctx: &CommandContext, opts: &EvalOptions) -> Result<bool> {
    let tree = TreeFile::new(&opts.file).load()?;

    let raw = read_input(&opts.data)?;
    let data: Value = serde_json::from_str(&raw).map_err(|e| {
        CommandError::InvalidArgument(format!(
            "data '{}' is not valid JSON: {e}",
            opts.data.display()
        ))
    })?;

    let context = EvaluationContext::new(data);
    let result = evaluate_tree(&tree, &context);

    if ctx.json_output {
        println!("{}", format_evaluation_json(&tree, &result, opts.trace)?);
    } else if !ctx.quiet || opts.trace {
        print!("{}", format_evaluation_text(&tree, &result, opts.trace, ctx.use_colors));
    }

    Ok(result.passed)
}
