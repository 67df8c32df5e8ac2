//! Show command implementation.

use std::path::PathBuf;

use super::{CommandContext, Result};
use crate::cli::ShowFormat;
use crate::output::{format_summary_json, format_summary_table, format_tree_json, format_tree_text};
use crate::tree_file::TreeFile;

/// Options for the show command.
#[derive(Debug)]
pub struct ShowOptions {
    pub file: PathBuf,
    pub format: ShowFormat,
}

/// Executes the show command.
///
/// `--json` with the text format prints the document itself, the same as
/// `--format json`.
pub fn execute(ctx: &CommandContext, opts: &ShowOptions) -> Result<()> {
    let tree = TreeFile::new(&opts.file).load()?;

    let output = match (opts.format, ctx.json_output) {
        (ShowFormat::Summary, true) => format_summary_json(&tree)?,
        (ShowFormat::Summary, false) => format_summary_table(&tree, ctx.use_colors),
        (ShowFormat::Json, _) | (ShowFormat::Text, true) => format_tree_json(&tree)?,
        (ShowFormat::Text, false) => format_tree_text(&tree, ctx.use_colors),
    };
    print!("{}", output.trim_end());
    println!();
    Ok(())
}
