//! Schema validation for imported trees.
//!
//! Untrusted JSON is checked structurally before it is deserialized, so a
//! rejected document yields a [`ValidationError`] naming the exact offending
//! path instead of a generic serde message. Validation fails closed: the first
//! violation found stops the walk.

use std::collections::HashSet;

use chrono::DateTime;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ImportResult, ValidationError, ValidationResult};
use crate::model::{ComparisonOperator, FieldType, FilterTree, LogicalOperator, MAX_VERSION};

/// Checks that `value` has the shape of a filter tree.
pub fn validate(value: &Value) -> ValidationResult<()> {
    let tree = expect_object(value, "tree")?;

    require_string(tree, "id", "id")?;
    let name = require_string(tree, "name", "name")?;
    if name.trim().is_empty() {
        return Err(ValidationError::invalid("name", "must not be empty"));
    }
    if let Some(description) = tree.get("description") {
        if !description.is_string() {
            return Err(ValidationError::wrong_type(
                "description",
                "string",
                json_type(description),
            ));
        }
    }
    require_timestamp(tree, "createdAt")?;
    require_timestamp(tree, "updatedAt")?;
    require_string(tree, "createdBy", "createdBy")?;
    require_version(tree)?;

    let root = tree
        .get("root")
        .ok_or_else(|| ValidationError::missing("root"))?;
    let mut seen = HashSet::new();
    match validate_item(root, "root", &mut seen)? {
        ItemType::Node => Ok(()),
        ItemType::Leaf => Err(ValidationError::invalid(
            "root.type",
            "tree root must be a node",
        )),
    }
}

/// Parses, validates and deserializes a tree from JSON text.
pub fn import_tree(json: &str) -> ImportResult<FilterTree> {
    let value: Value = serde_json::from_str(json).inspect_err(|e| {
        debug!(error = %e, "Rejected import: not JSON");
    })?;
    import_value(value)
}

/// Validates and deserializes an already-parsed JSON value.
pub fn import_value(value: Value) -> ImportResult<FilterTree> {
    validate(&value).inspect_err(|e| {
        debug!(error = %e, "Rejected import: schema violation");
    })?;
    Ok(serde_json::from_value(value)?)
}

enum ItemType {
    Node,
    Leaf,
}

fn validate_item(value: &Value, path: &str, seen: &mut HashSet<String>) -> ValidationResult<ItemType> {
    let item = expect_object(value, path)?;

    let id = require_string(item, "id", &format!("{path}.id"))?;
    if !seen.insert(id.to_string()) {
        return Err(ValidationError::duplicate_id(format!("{path}.id"), id));
    }
    require_bool(item, "enabled", &format!("{path}.enabled"))?;

    let type_path = format!("{path}.type");
    let kind = require_string(item, "type", &type_path)?;
    match kind {
        "node" => {
            require_variant(item, "operator", path, LogicalOperator::ALL.iter().map(|op| op.as_str()))?;
            let children_path = format!("{path}.children");
            let children = item
                .get("children")
                .ok_or_else(|| ValidationError::missing(&children_path))?;
            let Value::Array(children) = children else {
                return Err(ValidationError::wrong_type(
                    children_path,
                    "array",
                    json_type(children),
                ));
            };
            for (index, child) in children.iter().enumerate() {
                validate_item(child, &format!("{children_path}[{index}]"), seen)?;
            }
            Ok(ItemType::Node)
        }
        "leaf" => {
            require_string(item, "field", &format!("{path}.field"))?;
            require_variant(item, "operator", path, ComparisonOperator::ALL.iter().map(|op| op.as_str()))?;
            require_variant(item, "fieldType", path, FieldType::ALL.iter().map(|t| t.as_str()))?;
            // `value` may hold anything, including nothing.
            Ok(ItemType::Leaf)
        }
        other => Err(ValidationError::invalid_variant(type_path, other, ["node", "leaf"])),
    }
}

fn expect_object<'a>(value: &'a Value, path: &str) -> ValidationResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::wrong_type(path, "object", json_type(value)))
}

fn require_string<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> ValidationResult<&'a str> {
    match object.get(key) {
        None => Err(ValidationError::missing(path)),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ValidationError::wrong_type(path, "string", json_type(other))),
    }
}

fn require_bool(object: &Map<String, Value>, key: &str, path: &str) -> ValidationResult<bool> {
    match object.get(key) {
        None => Err(ValidationError::missing(path)),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(ValidationError::wrong_type(path, "boolean", json_type(other))),
    }
}

fn require_variant<'a>(
    object: &Map<String, Value>,
    key: &str,
    parent: &str,
    allowed: impl Iterator<Item = &'a str> + Clone,
) -> ValidationResult<()> {
    let path = format!("{parent}.{key}");
    let value = require_string(object, key, &path)?;
    if allowed.clone().any(|name| name == value) {
        Ok(())
    } else {
        Err(ValidationError::invalid_variant(path, value, allowed))
    }
}

fn require_timestamp(object: &Map<String, Value>, key: &str) -> ValidationResult<()> {
    let value = require_string(object, key, key)?;
    DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|e| ValidationError::invalid(key, format!("not an RFC 3339 timestamp ({e})")))
}

fn require_version(object: &Map<String, Value>) -> ValidationResult<()> {
    match object.get("version") {
        None => Err(ValidationError::missing("version")),
        Some(Value::Number(n)) if n.as_u64().is_some_and(|v| v <= MAX_VERSION) => Ok(()),
        Some(Value::Number(_)) => Err(ValidationError::invalid(
            "version",
            format!("must be an integer between 0 and {MAX_VERSION}"),
        )),
        Some(other) => Err(ValidationError::wrong_type("version", "number", json_type(other))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use serde_json::json;

    fn valid_tree() -> Value {
        json!({
            "id": "tree-1",
            "name": "Adults",
            "description": "People over 18",
            "root": {
                "id": "root",
                "type": "node",
                "operator": "AND",
                "enabled": true,
                "children": [
                    {
                        "id": "age",
                        "type": "leaf",
                        "field": "user.age",
                        "operator": "greater_than",
                        "value": 18,
                        "fieldType": "number",
                        "enabled": true
                    },
                    {
                        "id": "group",
                        "type": "node",
                        "operator": "OR",
                        "enabled": false,
                        "children": []
                    }
                ]
            },
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-02T10:30:00.000Z",
            "createdBy": "alice",
            "version": 3
        })
    }

    #[test]
    fn test_valid_tree_passes() {
        assert_eq!(validate(&valid_tree()), Ok(()));
    }

    #[test]
    fn test_import_valid_tree() {
        let tree = import_tree(&valid_tree().to_string()).unwrap();
        assert_eq!(tree.name, "Adults");
        assert_eq!(tree.version, 3);
        assert_eq!(tree.root.children.len(), 2);
    }

    #[test]
    fn test_leaf_without_value_is_valid() {
        let mut tree = valid_tree();
        tree["root"]["children"][0]
            .as_object_mut()
            .unwrap()
            .remove("value");
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn test_leaf_root_rejected() {
        let mut tree = valid_tree();
        tree["root"] = tree["root"]["children"][0].clone();
        let err = validate(&tree).unwrap_err();
        assert_eq!(err.path(), "root.type");
    }

    #[test]
    fn test_bad_operator_reports_path() {
        let mut tree = valid_tree();
        tree["root"]["children"][0]["operator"] = json!("like");
        let err = validate(&tree).unwrap_err();
        assert_eq!(err.path(), "root.children[0].operator");
        assert!(err.to_string().contains("greater_than_or_equal"));
    }

    #[test]
    fn test_bad_logical_operator() {
        let mut tree = valid_tree();
        tree["root"]["children"][1]["operator"] = json!("XOR");
        let err = validate(&tree).unwrap_err();
        assert_eq!(
            err,
            ValidationError::invalid_variant("root.children[1].operator", "XOR", ["AND", "OR"])
        );
    }

    #[test]
    fn test_bad_field_type() {
        let mut tree = valid_tree();
        tree["root"]["children"][0]["fieldType"] = json!("integer");
        assert_eq!(
            validate(&tree).unwrap_err().path(),
            "root.children[0].fieldType"
        );
    }

    #[test]
    fn test_bad_item_type() {
        let mut tree = valid_tree();
        tree["root"]["children"][1]["type"] = json!("group");
        assert_eq!(validate(&tree).unwrap_err().path(), "root.children[1].type");
    }

    #[test]
    fn test_enabled_must_be_boolean() {
        let mut tree = valid_tree();
        tree["root"]["children"][0]["enabled"] = json!("yes");
        assert_eq!(
            validate(&tree).unwrap_err(),
            ValidationError::wrong_type("root.children[0].enabled", "boolean", "string")
        );
    }

    #[test]
    fn test_children_must_be_array() {
        let mut tree = valid_tree();
        tree["root"]["children"][1]["children"] = json!({});
        assert_eq!(
            validate(&tree).unwrap_err().path(),
            "root.children[1].children"
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut tree = valid_tree();
        tree["name"] = json!("  ");
        assert_eq!(validate(&tree).unwrap_err().path(), "name");
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let mut tree = valid_tree();
        tree["updatedAt"] = json!("yesterday");
        assert_eq!(validate(&tree).unwrap_err().path(), "updatedAt");
    }

    #[test]
    fn test_negative_version_rejected() {
        let mut tree = valid_tree();
        tree["version"] = json!(-1);
        assert_eq!(validate(&tree).unwrap_err().path(), "version");

        tree["version"] = json!("1");
        assert_eq!(
            validate(&tree).unwrap_err(),
            ValidationError::wrong_type("version", "number", "string")
        );
    }

    #[test]
    fn test_version_upper_bound() {
        let mut tree = valid_tree();
        tree["version"] = json!(MAX_VERSION);
        assert_eq!(validate(&tree), Ok(()));

        tree["version"] = json!(MAX_VERSION + 1);
        assert_eq!(validate(&tree).unwrap_err().path(), "version");

        tree["version"] = json!(u64::MAX);
        let err = import_tree(&tree.to_string()).unwrap_err();
        assert!(matches!(err, ImportError::Invalid(_)));
    }

    #[test]
    fn test_missing_root() {
        let mut tree = valid_tree();
        tree.as_object_mut().unwrap().remove("root");
        assert_eq!(validate(&tree).unwrap_err(), ValidationError::missing("root"));
    }

    #[test]
    fn test_description_must_be_string() {
        let mut tree = valid_tree();
        tree["description"] = json!(5);
        assert_eq!(validate(&tree).unwrap_err().path(), "description");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut tree = valid_tree();
        tree["root"]["children"][1]["id"] = json!("age");
        assert_eq!(
            validate(&tree).unwrap_err(),
            ValidationError::duplicate_id("root.children[1].id", "age")
        );
    }

    #[test]
    fn test_deep_nesting_path() {
        let mut tree = valid_tree();
        tree["root"]["children"][1]["children"] = json!([
            {"id": "deep", "type": "leaf", "field": "x", "operator": "equals",
             "fieldType": "string", "enabled": 1}
        ]);
        assert_eq!(
            validate(&tree).unwrap_err().path(),
            "root.children[1].children[0].enabled"
        );
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(
            validate(&json!([1, 2])).unwrap_err(),
            ValidationError::wrong_type("tree", "object", "array")
        );
    }

    #[test]
    fn test_import_rejects_non_json() {
        let err = import_tree("{not json").unwrap_err();
        assert!(matches!(err, ImportError::Json(_)));
    }

    #[test]
    fn test_import_rejects_invalid_tree() {
        let err = import_tree(r#"{"id": "x"}"#).unwrap_err();
        assert!(matches!(err, ImportError::Invalid(_)));
    }
}
