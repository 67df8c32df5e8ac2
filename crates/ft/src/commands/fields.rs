//! Fields command implementation.
//!
//! Lists a field catalog, or checks the leaf fields of a tree against it and
//! suggests the closest known path for each unknown one.

use std::path::{Path, PathBuf};

use filter_tree::FieldCatalog;
use tracing::debug;

use super::{read_input, CommandContext, CommandError, Result};
use crate::output::{
    format_field_check_json, format_field_check_text, format_fields_json, format_fields_table,
};
use crate::tree_file::TreeFile;

/// Options for the fields command.
#[derive(Debug)]
pub struct FieldsOptions {
    /// Catalog file, or `-` for stdin.
    pub catalog: PathBuf,
    /// Tree file to check.
    pub check: Option<PathBuf>,
}

fn load_catalog(path: &Path) -> Result<FieldCatalog> {
    let raw = read_input(path)?;
    FieldCatalog::from_json(&raw).map_err(|e| {
        CommandError::InvalidArgument(format!(
            "catalog '{}' is not a list of fields: {e}",
            path.display()
        ))
    })
}

/// Executes the fields command.
///
/// Returns `false` when `--check` found fields missing from the catalog.
pub fn execute(ctx: &CommandContext, opts: &FieldsOptions) -> Result<bool> {
    let catalog = load_catalog(&opts.catalog)?;
    debug!(fields = catalog.len(), "Loaded field catalog");

    let Some(tree_path) = &opts.check else {
        if ctx.json_output {
            println!("{}", format_fields_json(&catalog)?);
        } else {
            print!("{}", format_fields_table(&catalog, ctx.use_colors));
        }
        return Ok(true);
    };

    let tree = TreeFile::new(tree_path).load()?;
    let unknown = catalog.unknown_fields(&tree);

    if ctx.json_output {
        println!("{}", format_field_check_json(&catalog, &unknown)?);
    } else if !ctx.quiet || !unknown.is_empty() {
        print!("{}", format_field_check_text(&unknown, ctx.use_colors));
    }
    Ok(unknown.is_empty())
}
