//! JSON text helpers shared by the codec and the transports.
//!
//! `serde_json` accepts bare scalars at the top level, so scalars are
//! serialized directly instead of being wrapped in a one-element array.

pub use serde_json::{Map, Number, Value};

/// Serialize a value to compact JSON text
#[must_use]
pub fn to_text(value: &Value) -> String {
    value.to_string()
}

/// Deserialize JSON text into a value tree
///
/// Empty or whitespace-only input decodes to `null`.
///
/// # Errors
///
/// Returns error if the text is not valid JSON
pub fn from_text(text: &str) -> Result<Value, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
}

/// Render a value the way it appears in a query string
///
/// Strings are unquoted; everything else is compact JSON.
#[must_use]
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Name of a value's JSON kind, for error messages
#[must_use]
pub fn kind_name(value: &Value) -> &'static str {
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
    fn test_scalar_to_text() {
        assert_eq!(to_text(&json!("hello")), "\"hello\"");
        assert_eq!(to_text(&json!(12)), "12");
        assert_eq!(to_text(&json!(true)), "true");
    }

    #[test]
    fn test_from_text_empty_is_null() {
        assert_eq!(from_text("").unwrap(), Value::Null);
        assert_eq!(from_text("  \n").unwrap(), Value::Null);
    }

    #[test]
    fn test_from_text_keeps_order() {
        let value = from_text(r#"{"b": 1, "a": 2}"#).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&json!("hello world")), "hello world");
        assert_eq!(render(&json!(5)), "5");
        assert_eq!(render(&json!(false)), "false");
        assert_eq!(render(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_invalid_text() {
        assert!(from_text("{not json").is_err());
    }
}
