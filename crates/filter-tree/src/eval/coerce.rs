//! Field resolution and per-operator value coercion.
//!
//! Coercion policy differs per operator and is kept that way on purpose:
//! `equals` / `not_equals` / `in` / `not_in` compare strictly, `contains`
//! compares string forms, and the ordering operators compare numeric forms.
//! String and numeric forms follow JavaScript's `String()` and `Number()`
//! conversions, which is what stored trees were authored against.
//!
//! An absent field (missing path segment) is represented as `None` and is
//! distinct from an explicit JSON `null`.

use serde_json::{Number, Value};

/// Walks a dot-delimited path through `data`.
///
/// Object segments are looked up by key; array segments must be decimal
/// indices. Any missing segment yields `None`.
pub(crate) fn resolve_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}

/// Strict equality: same JSON kind and same primitive value.
///
/// Numbers compare by numeric value (`1` equals `1.0`). Arrays and objects are
/// never strictly equal to one another, and an absent field equals nothing.
pub(crate) fn strict_equals(field: Option<&Value>, operand: &Value) -> bool {
    match (field, operand) {
        (Some(Value::Null), Value::Null) => true,
        (Some(Value::Bool(a)), Value::Bool(b)) => a == b,
        (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Some(Value::String(a)), Value::String(b)) => a == b,
        _ => false,
    }
}

/// String form of a value, as `String(v)` would produce it.
pub(crate) fn to_js_string(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return "undefined".to_string();
    };
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_js_string(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Numeric form of a value, as `Number(v)` would produce it. NaN on failure.
pub(crate) fn to_number(value: Option<&Value>) -> f64 {
    let Some(value) = value else {
        return f64::NAN;
    };
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_js_number(s),
        Value::Array(_) => parse_js_number(&to_js_string(Some(value))),
        Value::Object(_) => f64::NAN,
    }
}

fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if f == 0.0 {
        "0".to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{f:.0}")
    } else {
        f.to_string()
    }
}

fn parse_js_number(input: &str) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefixes, radix) in [(["0x", "0X"], 16), (["0o", "0O"], 8), (["0b", "0B"], 2)] {
        if let Some(digits) = prefixes.iter().find_map(|p| trimmed.strip_prefix(p)) {
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }
    // Rust accepts "inf" and "nan" spellings that Number() rejects.
    if trimmed
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}
