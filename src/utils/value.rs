//! Conversion of TOML data into the JSON values templates execute against.

use serde_json::{Map, Number, Value};

/// Convert a TOML value. Datetimes become their RFC 3339 text.
pub fn toml_to_json(value: &toml::Value, lower_keys: bool) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(|v| toml_to_json(v, lower_keys)).collect()),
        toml::Value::Table(table) => Value::Object(toml_table_to_json(table, lower_keys)),
    }
}

pub fn toml_table_to_json(table: &toml::Table, lower_keys: bool) -> Map<String, Value> {
    table
        .iter()
        .map(|(k, v)| (key(k, lower_keys), toml_to_json(v, lower_keys)))
        .collect()
}

/// Lower-case object keys recursively.
pub fn lower_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k.to_lowercase(), lower_keys(v))).collect()),
        Value::Array(items) => Value::Array(items.into_iter().map(lower_keys).collect()),
        other => other,
    }
}

fn key(k: &str, lower: bool) -> String {
    if lower { k.to_lowercase() } else { k.to_owned() }
}

/// Strings of a scalar or array value (`tags = "a"` and `tags = ["a"]`).
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toml_to_json_lowercases_nested_keys() {
        let table: toml::Table = toml::from_str(
            r#"
            Title = "x"
            Count = 3
            Ratio = 0.5
            When = 2024-01-02
            [Nested]
            Key = [1, 2]
        "#,
        )
        .unwrap();

        assert_eq!(
            Value::Object(toml_table_to_json(&table, true)),
            json!({"title": "x", "count": 3, "ratio": 0.5, "when": "2024-01-02", "nested": {"key": [1, 2]}})
        );
    }

    #[test]
    fn test_lower_keys() {
        assert_eq!(lower_keys(json!({"A": [{"B": 1}]})), json!({"a": [{"b": 1}]}));
    }

    #[test]
    fn test_string_list() {
        assert_eq!(string_list(&json!("rust")), vec!["rust"]);
        assert_eq!(string_list(&json!(["a", 2, null])), vec!["a", "2"]);
        assert!(string_list(&json!(true)).is_empty());
    }
}
