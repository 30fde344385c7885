use serde_json::Value;

/// Render a JSON claim value as a single display line.
///
/// Arrays of scalars are joined with ", ", objects fall back to compact JSON.
/// Control characters are stripped so a hostile claim cannot forge terminal
/// output or log lines.
pub fn value_to_string(value: Value) -> String {
    let raw = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) if items.iter().all(is_scalar) => items
            .into_iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };
    strip_control_chars(raw)
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn strip_control_chars(s: String) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}
