//! Evaluation output formatting.

use filter_tree::{find_by_id, EvaluationResult, FilterTree, ItemRef};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::{dimmed, status_mark, truncate_id};

/// JSON output structure for the eval command.
#[derive(Serialize)]
pub struct EvaluationOutput<'a> {
    pub tree_id: &'a str,
    pub version: u64,
    pub passed: bool,
    pub failed: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<&'a EvaluationResult>,
}

/// Formats an evaluation outcome as JSON.
pub fn format_evaluation_json(
    tree: &FilterTree,
    result: &EvaluationResult,
    trace: bool,
) -> Result<String, serde_json::Error> {
    let output = EvaluationOutput {
        tree_id: &tree.id,
        version: tree.version,
        passed: result.passed,
        failed: result.failed_ids(),
        trace: trace.then_some(result),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats an evaluation outcome, optionally followed by the per-item trace.
pub fn format_evaluation_text(
    tree: &FilterTree,
    result: &EvaluationResult,
    trace: bool,
    use_colors: bool,
) -> String {
    let verdict = match (result.passed, use_colors) {
        (true, true) => "PASS".green().bold().to_string(),
        (false, true) => "FAIL".red().bold().to_string(),
        (true, false) => "PASS".to_string(),
        (false, false) => "FAIL".to_string(),
    };
    let mut output = format!("{verdict}  {}\n", tree.name);

    if trace {
        output.push('\n');
        render_trace(tree, result, 0, use_colors, &mut output);
    }
    output
}

fn render_trace(
    tree: &FilterTree,
    result: &EvaluationResult,
    depth: usize,
    use_colors: bool,
    output: &mut String,
) {
    let details = &result.details;
    let item = find_by_id(&tree.root, &details.node_id);
    let label = match item {
        Some(ItemRef::Leaf(leaf)) => format!("{} {} {}", leaf.field, leaf.operator, leaf.value),
        Some(ItemRef::Node(node)) => node.operator.to_string(),
        None => details.operator.to_string(),
    };
    let skipped = if item.is_some_and(|i| !i.enabled()) {
        dimmed(" (disabled)", use_colors)
    } else {
        String::new()
    };

    output.push_str(&format!(
        "{}{} {label}{skipped}  {}\n",
        "  ".repeat(depth),
        status_mark(details.result, use_colors),
        dimmed(&format!("[{}]", truncate_id(&details.node_id)), use_colors),
    ));

    for child in details.children.iter().flatten() {
        render_trace(tree, child, depth + 1, use_colors, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filter_tree::{evaluate_tree, ComparisonOperator, EvaluationContext, FilterLeaf};
    use serde_json::json;

    fn sample() -> FilterTree {
        let mut tree = FilterTree::new("Admins", "me");
        let mut role = FilterLeaf::condition("role", ComparisonOperator::Equals, "admin");
        role.enabled = false;
        tree.root.children = vec![
            FilterLeaf::condition("age", ComparisonOperator::GreaterThan, 18).into(),
            role.into(),
        ];
        tree
    }

    #[test]
    fn test_text_verdict_only() {
        let tree = sample();
        let result = evaluate_tree(&tree, &EvaluationContext::new(json!({"age": 30})));
        assert_eq!(format_evaluation_text(&tree, &result, false, false), "PASS  Admins\n");
    }

    #[test]
    fn test_text_trace() {
        let tree = sample();
        let result = evaluate_tree(&tree, &EvaluationContext::new(json!({"age": 3})));
        let text = format_evaluation_text(&tree, &result, true, false);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "FAIL  Admins");
        assert!(lines[2].starts_with("✗ AND  ["));
        assert!(lines[3].starts_with("  ✗ age greater_than 18  ["));
        assert!(lines[4].starts_with("  ✓ role equals \"admin\" (disabled)  ["));
    }

    #[test]
    fn test_json_output() {
        let tree = sample();
        let result = evaluate_tree(&tree, &EvaluationContext::new(json!({"age": 3})));
        let value: serde_json::Value =
            serde_json::from_str(&format_evaluation_json(&tree, &result, false).unwrap()).unwrap();

        assert_eq!(value["passed"], false);
        assert_eq!(value["failed"].as_array().unwrap().len(), 2);
        assert!(value.get("trace").is_none());

        let value: serde_json::Value =
            serde_json::from_str(&format_evaluation_json(&tree, &result, true).unwrap()).unwrap();
        assert_eq!(value["trace"]["details"]["type"], "node");
    }
}
