//! New command implementation.
//!
//! Creates an empty tree (an enabled AND root with no children) and writes it
//! to a new file.

use std::path::PathBuf;

use filter_tree::FilterTree;
use serde::Serialize;

use super::config::load_config;
use super::{CommandContext, CommandError, Result};
use crate::tree_file::TreeFile;

/// Options for the new command.
#[derive(Debug)]
pub struct NewOptions {
    /// File to create.
    pub file: PathBuf,
    /// Tree name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Author override.
    pub created_by: Option<String>,
    /// Overwrite an existing file.
    pub force: bool,
}

#[derive(Serialize)]
struct NewOutput<'a> {
    id: &'a str,
    name: &'a str,
    root_id: &'a str,
    path: String,
}

/// Executes the new command.
///
/// # Errors
///
/// Returns an error if the file exists and `--force` was not given, or if
/// the file cannot be written.
pub fn execute(ctx: &CommandContext, opts: &NewOptions) -> Result<()> {
    let file = TreeFile::new(&opts.file);
    if file.exists() && !opts.force {
        return Err(CommandError::InvalidArgument(format!(
            "'{}' already exists (use --force to overwrite)",
            opts.file.display()
        )));
    }
    if opts.name.trim().is_empty() {
        return Err(CommandError::InvalidArgument(
            "tree name cannot be empty".to_string(),
        ));
    }

    let created_by = match &opts.created_by {
        Some(author) => author.clone(),
        None => load_config()?.author(),
    };

    let mut tree = FilterTree::new(opts.name.clone(), created_by);
    if let Some(description) = &opts.description {
        tree = tree.with_description(description.clone());
    }
    file.save(&tree)?;

    if ctx.json_output {
        let output = NewOutput {
            id: &tree.id,
            name: &tree.name,
            root_id: &tree.root.id,
            path: opts.file.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created '{}' in {}", tree.name, opts.file.display());
        if ctx.verbose {
            println!("  ID: {}", tree.id);
            println!("  Root: {}", tree.root.id);
        }
    }

    Ok(())
}
