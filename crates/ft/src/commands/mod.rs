//! Command implementations for the ft CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod completions;
pub mod config;
pub mod edit;
pub mod eval;
pub mod fields;
pub mod new;
pub mod script;
pub mod show;
pub mod validate;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use filter_tree::{ImportError, ParseError, StoreError};
use serde_json::Value;

use crate::cli::Cli;
use crate::tree_file::TreeFileError;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Tree file could not be read, written or validated.
    #[error("{0}")]
    TreeFile(#[from] TreeFileError),

    /// Input is not a valid filter tree.
    #[error("{0}")]
    Import(#[from] ImportError),

    /// Tree store operation failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Unknown operator or field type name.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// Invalid command-line usage that clap cannot catch.
    #[error("{0}")]
    InvalidArgument(String),

    /// Edit script error.
    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    ///
    /// Colors are disabled by `--no-color` and by a non-empty `NO_COLOR`.
    pub fn from_cli(cli: &Cli) -> Self {
        let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && !no_color_env,
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }
}

/// Reads a whole input file, with `-` meaning stdin.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(path).map_err(|e| {
            CommandError::Io(io::Error::new(
                e.kind(),
                format!("failed to read '{}': {e}", path.display()),
            ))
        })
    }
}

/// Parses a user-supplied value: JSON if it parses, otherwise a plain string.
///
/// `18` becomes a number, `["a","b"]` an array, and `admin` the string "admin".
pub(crate) fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
