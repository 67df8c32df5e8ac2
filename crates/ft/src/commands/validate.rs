//! Validate command implementation.
//!
//! Runs the schema validator over a file without loading it into a store, so
//! the first offending JSON path is reported as-is.

use std::path::PathBuf;

use filter_tree::{import_tree, FilterTree};
use serde::Serialize;
use tracing::debug;

use super::{read_input, CommandContext, Result};

/// Options for the validate command.
#[derive(Debug)]
pub struct ValidateOptions {
    /// Tree file, or `-` for stdin.
    pub file: PathBuf,
}

#[derive(Serialize)]
struct ValidOutput<'a> {
    valid: bool,
    id: &'a str,
    name: &'a str,
    version: u64,
}

/// Executes the validate command.
///
/// # Errors
///
/// Returns [`CommandError::Import`](super::CommandError::Import) describing
/// the first violation when the document is not a valid tree.
pub fn execute(ctx: &CommandContext, opts: &ValidateOptions) -> Result<()> {
    let contents = read_input(&opts.file)?;
    let tree: FilterTree = import_tree(&contents)?;
    debug!(path = %opts.file.display(), tree_id = %tree.id, "Tree is valid");

    if ctx.json_output {
        let output = ValidOutput {
            valid: true,
            id: &tree.id,
            name: &tree.name,
            version: tree.version,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("{}: valid ('{}', v{})", opts.file.display(), tree.name, tree.version);
    }
    Ok(())
}
