//! Field catalog output formatting.

use filter_tree::{FieldCatalog, UnknownField};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::{dimmed, truncate_id, truncate_str};

/// Formats catalog fields as JSON (the catalog's own shape).
pub fn format_fields_json(catalog: &FieldCatalog) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(catalog)
}

/// Formats catalog fields as a table.
pub fn format_fields_table(catalog: &FieldCatalog, use_colors: bool) -> String {
    if catalog.is_empty() {
        return "No fields found.\n".to_string();
    }

    let mut output = String::new();

    let header = format!("{:<30} {:<8} {:<20} {}", "Path", "Type", "Name", "Values");
    output.push_str(&dimmed(&header, use_colors));
    output.push('\n');

    for field in catalog.fields() {
        let values = field
            .allowed_values
            .as_ref()
            .map(|values| truncate_str(&values.join(", "), 40))
            .unwrap_or_default();
        let line = format!(
            "{:<30} {:<8} {:<20} {}",
            truncate_str(&field.path, 30),
            field.field_type,
            truncate_str(&field.name, 20),
            values
        );
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output
}

/// JSON output structure for `fields --check`.
#[derive(Serialize)]
pub struct FieldCheckOutput<'a> {
    pub known: usize,
    pub unknown: &'a [UnknownField],
}

/// Formats a field check as JSON.
pub fn format_field_check_json(
    catalog: &FieldCatalog,
    unknown: &[UnknownField],
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&FieldCheckOutput {
        known: catalog.len(),
        unknown,
    })
}

/// Formats a field check as text.
pub fn format_field_check_text(unknown: &[UnknownField], use_colors: bool) -> String {
    if unknown.is_empty() {
        return "All condition fields are in the catalog.\n".to_string();
    }

    let mut output = String::new();
    for field in unknown {
        let name = if use_colors {
            field.field.yellow().to_string()
        } else {
            field.field.clone()
        };
        let id = dimmed(&format!("[{}]", truncate_id(&field.leaf_id)), use_colors);
        match &field.suggestion {
            Some(suggestion) => output.push_str(&format!(
                "Unknown field '{name}' {id}. Did you mean '{suggestion}'?\n"
            )),
            None => output.push_str(&format!("Unknown field '{name}' {id}\n")),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_json(
            r#"[
                {"name": "Age", "path": "user.age", "type": "number"},
                {"name": "Role", "path": "user.role", "type": "string", "enum": ["admin", "guest"]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_fields_table() {
        let table = format_fields_table(&catalog(), false);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("Path"));
        assert!(lines[1].starts_with("user.age"));
        assert!(lines[1].contains("number"));
        assert!(lines[2].ends_with("admin, guest"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(format_fields_table(&FieldCatalog::default(), false), "No fields found.\n");
    }

    #[test]
    fn test_field_check_text() {
        let unknown = vec![
            UnknownField {
                leaf_id: "0123456789".to_string(),
                field: "user.agee".to_string(),
                suggestion: Some("user.age".to_string()),
            },
            UnknownField {
                leaf_id: "abc".to_string(),
                field: "plan".to_string(),
                suggestion: None,
            },
        ];
        let text = format_field_check_text(&unknown, false);
        assert_eq!(
            text,
            "Unknown field 'user.agee' [01234567]. Did you mean 'user.age'?\nUnknown field 'plan' [abc]\n"
        );
        assert_eq!(
            format_field_check_text(&[], false),
            "All condition fields are in the catalog.\n"
        );
    }

    #[test]
    fn test_field_check_json() {
        let value: serde_json::Value =
            serde_json::from_str(&format_field_check_json(&catalog(), &[]).unwrap()).unwrap();
        assert_eq!(value["known"], 2);
        assert_eq!(value["unknown"], serde_json::json!([]));
    }
}
