//! Text form of resolved values (interpolation and mapping keys)

use crate::shared::models::Value;

/// Strings as-is, null as `null`, collections as compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Tagged(tagged) => value_to_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Mapping;

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&Value::from("x")), "x");
        assert_eq!(value_to_text(&Value::Null), "null");
        assert_eq!(value_to_text(&Value::from(3)), "3");
        assert_eq!(
            value_to_text(&Value::Sequence(vec![Value::from(1), Value::from("a")])),
            "[1,\"a\"]"
        );

        let mut map = Mapping::new();
        map.insert(Value::from("k"), Value::Bool(true));
        assert_eq!(value_to_text(&Value::Mapping(map)), "{\"k\":true}");
    }
}
