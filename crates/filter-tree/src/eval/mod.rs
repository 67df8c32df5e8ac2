//! Evaluation of filter trees against JSON data.
//!
//! Evaluation never fails. Missing fields, type mismatches and malformed
//! operands all resolve to a defined boolean through the coercion rules in
//! [`coerce`]. Every evaluated item contributes a [`EvaluationDetails`] entry
//! to the trace, so callers can show exactly which conditions failed.
//!
//! # Example
//!
//! ```
//! use filter_tree::{evaluate_tree, ComparisonOperator, EvaluationContext, FilterLeaf, FilterTree};
//! use serde_json::json;
//!
//! let mut tree = FilterTree::new("Adults", "me");
//! tree.root.children.push(FilterLeaf::condition("user.age", ComparisonOperator::GreaterThan, 18).into());
//!
//! let result = evaluate_tree(&tree, &EvaluationContext::new(json!({"user": {"age": 30}})));
//! assert!(result.passed);
//! ```

mod coerce;


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::model::{
    now, ComparisonOperator, FilterLeaf, FilterNode, FilterTree, ItemKind, ItemRef,
    LogicalOperator,
};

use coerce::{resolve_path, strict_equals, to_js_string, to_number};

/// The data a tree is evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    /// Arbitrary JSON; leaf fields are dot-delimited paths into it.
    pub data: Value,
    /// When the evaluation was requested. Informational.
    pub timestamp: DateTime<Utc>,
}

impl EvaluationContext {
    /// Creates a context stamped with the current time.
    pub fn new(data: Value) -> Self {
        Self {
            data,
            timestamp: now(),
        }
    }
}

/// Outcome of evaluating one item, with its trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub passed: bool,
    pub details: EvaluationDetails,
}

/// Trace entry for one evaluated item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDetails {
    pub node_id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub operator: TraceOperator,
    pub result: bool,
    /// Child results, present for nodes only. Empty for a disabled node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<EvaluationResult>>,
}

/// The operator recorded in a trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceOperator {
    Logical(LogicalOperator),
    Comparison(ComparisonOperator),
}

impl std::fmt::Display for TraceOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceOperator::Logical(op) => op.fmt(f),
            TraceOperator::Comparison(op) => op.fmt(f),
        }
    }
}

impl EvaluationResult {
    /// Returns the ids of every traced item whose result was false, pre-order.
    pub fn failed_ids(&self) -> Vec<&str> {
        let mut failed = Vec::new();
        collect_failed(self, &mut failed);
        failed
    }
}

fn collect_failed<'a>(result: &'a EvaluationResult, out: &mut Vec<&'a str>) {
    if !result.details.result {
        out.push(&result.details.node_id);
    }
    for child in result.details.children.iter().flatten() {
        collect_failed(child, out);
    }
}

/// Evaluates a node or leaf against `context`.
pub fn evaluate<'a>(item: impl Into<ItemRef<'a>>, context: &EvaluationContext) -> EvaluationResult {
    match item.into() {
        ItemRef::Node(node) => evaluate_node(node, context),
        ItemRef::Leaf(leaf) => evaluate_leaf(leaf, context),
    }
}

/// Evaluates a whole tree, starting from its root.
pub fn evaluate_tree(tree: &FilterTree, context: &EvaluationContext) -> EvaluationResult {
    let result = evaluate_node(&tree.root, context);
    debug!(
        tree_id = %tree.id,
        version = tree.version,
        passed = result.passed,
        "Evaluated filter tree"
    );
    result
}

fn evaluate_node(node: &FilterNode, context: &EvaluationContext) -> EvaluationResult {
    if !node.enabled {
        return traced(node, true, Some(Vec::new()));
    }

    // All children are evaluated so the trace is complete.
    let children: Vec<EvaluationResult> = node
        .children
        .iter()
        .map(|child| evaluate(child, context))
        .collect();

    let passed = match node.operator {
        LogicalOperator::And => children.iter().all(|child| child.passed),
        LogicalOperator::Or => children.iter().any(|child| child.passed),
    };

    traced(node, passed, Some(children))
}

fn evaluate_leaf(leaf: &FilterLeaf, context: &EvaluationContext) -> EvaluationResult {
    let passed = !leaf.enabled || compare(leaf, resolve_path(&context.data, &leaf.field));
    EvaluationResult {
        passed,
        details: EvaluationDetails {
            node_id: leaf.id.clone(),
            kind: ItemKind::Leaf,
            operator: TraceOperator::Comparison(leaf.operator),
            result: passed,
            children: None,
        },
    }
}

fn traced(node: &FilterNode, passed: bool, children: Option<Vec<EvaluationResult>>) -> EvaluationResult {
    EvaluationResult {
        passed,
        details: EvaluationDetails {
            node_id: node.id.clone(),
            kind: ItemKind::Node,
            operator: TraceOperator::Logical(node.operator),
            result: passed,
            children,
        },
    }
}

/// Applies the leaf's operator to the resolved field value.
fn compare(leaf: &FilterLeaf, field: Option<&Value>) -> bool {
    let operand = &leaf.value;
    match leaf.operator {
        ComparisonOperator::Equals => strict_equals(field, operand),
        ComparisonOperator::NotEquals => !strict_equals(field, operand),
        ComparisonOperator::Contains => {
            to_js_string(field).contains(to_js_string(Some(operand)).as_str())
        }
        ComparisonOperator::NotContains => {
            !to_js_string(field).contains(to_js_string(Some(operand)).as_str())
        }
        ComparisonOperator::GreaterThan => to_number(field) > to_number(Some(operand)),
        ComparisonOperator::LessThan => to_number(field) < to_number(Some(operand)),
        ComparisonOperator::GreaterThanOrEqual => to_number(field) >= to_number(Some(operand)),
        ComparisonOperator::LessThanOrEqual => to_number(field) <= to_number(Some(operand)),
        // A non-array operand fails both membership tests.
        ComparisonOperator::In => match operand {
            Value::Array(items) => items.iter().any(|item| strict_equals(field, item)),
            _ => false,
        },
        ComparisonOperator::NotIn => match operand {
            Value::Array(items) => !items.iter().any(|item| strict_equals(field, item)),
            _ => false,
        },
        ComparisonOperator::IsNull => matches!(field, None | Some(Value::Null)),
        ComparisonOperator::IsNotNull => !matches!(field, None | Some(Value::Null)),
    }
}
