//! Nested boolean filter trees over JSON data.
//!
//! A [`FilterTree`] groups field comparisons ([`FilterLeaf`]) under AND/OR
//! nodes ([`FilterNode`]). Trees are edited copy-on-write through the
//! functions in [`editor`], evaluated against arbitrary JSON with
//! [`evaluate_tree`], and kept with undo/redo history in a [`TreeStore`].
//!
//! Untrusted JSON enters through [`import_tree`], which validates the shape of
//! the document and reports the path of the first violation.
//!
//! # Example
//!
//! ```
//! use filter_tree::editor::add_child;
//! use filter_tree::{evaluate_tree, ComparisonOperator, EvaluationContext, FilterLeaf, TreeStore};
//! use serde_json::json;
//!
//! let mut store = TreeStore::new();
//! store.create_tree("Admins", "alice").unwrap();
//! store
//!     .apply("Added condition", |tree| {
//!         let leaf = FilterLeaf::condition("role", ComparisonOperator::Equals, "admin");
//!         add_child(tree, &tree.root.id, leaf.into())
//!     })
//!     .unwrap();
//!
//! let tree = store.current_tree().unwrap();
//! let context = EvaluationContext::new(json!({"role": "admin"}));
//! assert!(evaluate_tree(tree, &context).passed);
//! ```

pub mod catalog;
pub mod editor;
pub mod error;
pub mod eval;
pub mod history;
pub mod lookup;
pub mod model;
pub mod store;
pub mod text;
pub mod validate;

pub use catalog::{FieldCatalog, FilterField, UnknownField};
pub use editor::ItemUpdate;
pub use error::{
    ImportError, ImportResult, ParseError, StoreError, StoreResult, ValidationError,
    ValidationResult,
};
pub use eval::{
    evaluate, evaluate_tree, EvaluationContext, EvaluationDetails, EvaluationResult,
    TraceOperator,
};
pub use history::{History, HistoryEntry, DEFAULT_HISTORY_CAPACITY};
pub use lookup::{find_by_id, find_parent};
pub use model::{
    generate_id, now, ComparisonOperator, FieldType, FilterItem, FilterLeaf, FilterNode,
    FilterTree, ItemKind, ItemRef, LogicalOperator, TreeMetadata, MAX_VERSION,
};
pub use store::TreeStore;
pub use text::{count_items, tree_to_text, ItemCounts};
pub use validate::{import_tree, import_value, validate};
