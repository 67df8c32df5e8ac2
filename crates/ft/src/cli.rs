//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the ft CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// ft - Build, edit and evaluate filter trees
#[derive(Parser, Debug)]
#[command(name = "ft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (debug logging to stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty filter tree file
    New {
        /// Tree file to create
        file: PathBuf,

        /// Tree name
        #[arg(short, long)]
        name: String,

        /// Tree description
        #[arg(short, long)]
        description: Option<String>,

        /// Author recorded in the tree (default: from config, then $USER)
        #[arg(long)]
        created_by: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show a filter tree
    #[command(alias = "s")]
    Show {
        /// Tree file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ShowFormat,
    },

    /// Check a tree file against the filter tree schema
    Validate {
        /// Tree file
        file: PathBuf,
    },

    /// Evaluate a tree against JSON data (exit code 1 when it does not pass)
    #[command(alias = "e")]
    Eval {
        /// Tree file
        file: PathBuf,

        /// JSON data file, or '-' for stdin
        #[arg(short, long)]
        data: PathBuf,

        /// Print the per-item evaluation trace
        #[arg(long)]
        trace: bool,
    },

    /// Add a condition to a group
    AddLeaf {
        /// Tree file
        file: PathBuf,

        /// Parent group id ('root' for the root group)
        #[arg(short, long, default_value = "root")]
        parent: String,

        /// Dot-delimited field path, e.g. user.profile.email
        #[arg(short, long)]
        field: String,

        /// Comparison operator, e.g. equals, greater_than, in
        #[arg(short, long)]
        op: String,

        /// Value as JSON; anything that is not valid JSON is taken as a string
        #[arg(long)]
        value: Option<String>,

        /// Declared field type (default: inferred from the value)
        #[arg(long)]
        field_type: Option<String>,
    },

    /// Add a nested group
    AddGroup {
        /// Tree file
        file: PathBuf,

        /// Parent group id ('root' for the root group)
        #[arg(short, long, default_value = "root")]
        parent: String,

        /// Logical operator of the new group
        #[arg(short, long, default_value = "AND")]
        op: String,
    },

    /// Remove a condition or group
    #[command(alias = "rm")]
    Remove {
        /// Tree file
        file: PathBuf,

        /// Item id
        id: String,
    },

    /// Enable/disable an item, or flip a group between AND and OR
    Toggle {
        /// Tree file
        file: PathBuf,

        /// Item id ('root' for the root group)
        id: String,

        /// Flip the logical operator instead of the enabled flag
        #[arg(long)]
        operator: bool,
    },

    /// Update a condition
    Set {
        /// Tree file
        file: PathBuf,

        /// Condition id
        id: String,

        /// New field path
        #[arg(short, long)]
        field: Option<String>,

        /// New comparison operator
        #[arg(short, long)]
        op: Option<String>,

        /// New value as JSON; anything that is not valid JSON is taken as a string
        #[arg(long)]
        value: Option<String>,

        /// New declared field type
        #[arg(long)]
        field_type: Option<String>,
    },

    /// Replay an edit script with undo/redo support
    Script {
        /// Tree file
        file: PathBuf,

        /// Script file, or '-' for stdin
        script: PathBuf,

        /// Run the script without writing the result
        #[arg(long)]
        dry_run: bool,
    },

    /// List catalog fields, or check a tree's fields against a catalog
    Fields {
        /// Field catalog (JSON array of {name, path, type, description?, enum?})
        catalog: PathBuf,

        /// Tree file whose leaf fields should be checked
        #[arg(long)]
        check: Option<PathBuf>,
    },

    /// View and edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Output formats for the show command
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowFormat {
    /// Indented outline
    Text,
    /// The tree document as stored
    Json,
    /// Metadata and item counts
    Summary,
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print config file path
    Path,
}
