// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//
// Minimal JSON Schema validation: only what this engine's structured-output
// contracts need (object `required`/`properties`/`type` checking). Not a
// general-purpose validator.
use serde_json::Value;

/// Validate `value` against a JSON Schema object, returning a list of
/// human-readable violations (empty if valid).
pub fn validate(value: &Value, schema: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    validate_into(value, schema, "$", &mut errors);
    errors
}

fn validate_into(value: &Value, schema: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(schema_obj) = schema.as_object() else { return };

    if let Some(expected_type) = schema_obj.get("type").and_then(Value::as_str) {
        if !type_matches(value, expected_type) {
            errors.push(format!(
                "{path}: expected type {expected_type}, got {}",
                type_name(value)
            ));
            return;
        }
    }

    if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
        let Some(obj) = value.as_object() else { return };
        for field in required {
            if let Some(name) = field.as_str() {
                if !obj.contains_key(name) {
                    errors.push(format!("{path}: missing required field \"{name}\""));
                }
            }
        }
    }

    if let (Some(props), Some(obj)) =
        (schema_obj.get("properties").and_then(Value::as_object), value.as_object())
    {
        for (name, prop_schema) in props {
            if let Some(v) = obj.get(name) {
                validate_into(v, prop_schema, &format!("{path}.{name}"), errors);
            }
        }
    }

    if let Some(items_schema) = schema_obj.get("items") {
        if let Some(arr) = value.as_array() {
            for (i, item) in arr.iter().enumerate() {
                validate_into(item, items_schema, &format!("{path}[{i}]"), errors);
            }
        }
    }
}

fn type_matches(value: &Value, expected: &str) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
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
    use serde_json::json;

    #[test]
    fn valid_object_has_no_errors() {
        let schema = json!({
            "type": "object",
            "required": ["bullet_findings", "open_gaps"],
            "properties": {
                "bullet_findings": {"type": "array"},
                "open_gaps": {"type": "array"}
            }
        });
        let value = json!({"bullet_findings": ["a"], "open_gaps": []});
        assert!(validate(&value, &schema).is_empty());
    }

    #[test]
    fn missing_required_field_reported() {
        let schema = json!({"type": "object", "required": ["a", "b"]});
        let value = json!({"a": 1});
        let errors = validate(&value, &schema);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("b"));
    }

    #[test]
    fn wrong_top_level_type_reported() {
        let schema = json!({"type": "object"});
        let value = json!("not an object");
        let errors = validate(&value, &schema);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn nested_property_type_checked() {
        let schema = json!({
            "type": "object",
            "properties": {"count": {"type": "number"}}
        });
        let value = json!({"count": "five"});
        let errors = validate(&value, &schema);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("count"));
    }
}
