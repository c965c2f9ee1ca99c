//! Path traversal over resolved values

use super::stringify::value_to_text;
use crate::shared::models::Value;

/// Follow `segments` into `value`: mapping key, sequence index, string
/// membership on sequences, character index on strings.
pub fn traverse_value(value: &Value, segments: &[String]) -> Result<Value, String> {
    let mut current = value;
    let mut owned;
    for (i, segment) in segments.iter().enumerate() {
        let next = match current {
            Value::Tagged(tagged) => step(&tagged.value, segment),
            other => step(other, segment),
        };
        match next {
            Some(v) => {
                owned = v;
                current = &owned;
            }
            None => {
                return Err(format!(
                    "path '{}' not found (no '{}' in {})",
                    segments.join("."),
                    segments[i],
                    describe(current)
                ))
            }
        }
    }
    Ok(current.clone())
}

fn step(value: &Value, segment: &str) -> Option<Value> {
    match value {
        Value::Mapping(map) => map
            .get(segment)
            .or_else(|| {
                map.iter()
                    .find(|(k, _)| value_to_text(k) == segment)
                    .map(|(_, v)| v)
            })
            .cloned(),
        Value::Sequence(items) => match segment.parse::<usize>() {
            Ok(index) => items.get(index).cloned(),
            Err(_) => items
                .iter()
                .find(|item| item.as_str() == Some(segment))
                .cloned(),
        },
        Value::String(s) => {
            let index = segment.parse::<usize>().ok()?;
            s.chars().nth(index).map(|c| Value::String(c.to_string()))
        }
        _ => None,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Mapping(_) => "map",
        Value::Sequence(_) => "sequence",
        Value::String(_) => "string",
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::Tagged(_) => "tagged value",
    }
}
