//! Output formatting utilities for the ft CLI.
//!
//! This module provides functions for formatting data as text or JSON.
//! It is organized into submodules by concern:
//!
//! - [`tree`] - Tree output formatting (show, edits)
//! - [`evaluation`] - Evaluation verdicts and traces
//! - [`fields`] - Field catalog listings and checks
//! - [`helpers`] - Common formatting utilities (truncation, markers)

mod evaluation;
mod fields;
pub mod helpers;
mod tree;

// Tree
pub use tree::{
    format_edit_json, format_edit_text, format_summary_json, format_summary_table,
    format_tree_json, format_tree_text,
};

// Evaluation
pub use evaluation::{format_evaluation_json, format_evaluation_text};

// Fields
pub use fields::{
    format_field_check_json, format_field_check_text, format_fields_json, format_fields_table,
};
