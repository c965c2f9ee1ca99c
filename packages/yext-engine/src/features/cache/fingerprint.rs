//! Cache keys: content and parameter-set hashes (SHA-256, hex)

use std::fmt;

use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha256};

use crate::shared::models::Params;

/// SHA-256 of a document's source text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn compute(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 of a merged parameter set plus the private-filtering flag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamHash(String);

impl ParamHash {
    pub fn compute(params: &Params, filter_private: bool) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(if filter_private {
            b"filter:1\n"
        } else {
            b"filter:0\n"
        });
        let mapping: Mapping = params
            .iter()
            .map(|(name, value)| (Value::from(name.as_str()), value.clone()))
            .collect();
        hasher.update(canonical_yaml(&Value::Mapping(mapping)).as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParamHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mapping keys sorted at every depth, so insertion order never changes
/// the hash.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(String, Value, Value)> = map
                .iter()
                .map(|(k, v)| {
                    let key = canonicalize(k);
                    (serialize(&key), key, canonicalize(v))
                })
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Mapping::new();
            for (_, k, v) in entries {
                sorted.insert(k, v);
            }
            Value::Mapping(sorted)
        }
        Value::Sequence(items) => Value::Sequence(items.iter().map(canonicalize).collect()),
        Value::Tagged(tagged) => {
            let mut tagged = tagged.as_ref().clone();
            tagged.value = canonicalize(&tagged.value);
            Value::Tagged(Box::new(tagged))
        }
        other => other.clone(),
    }
}

fn serialize(value: &Value) -> String {
    serde_yaml::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}

fn canonical_yaml(value: &Value) -> String {
    serialize(&canonicalize(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_sha256_hex() {
        let hash = ContentHash::compute("a: 1\n");
        assert_eq!(hash.as_str().len(), 64);
        assert_eq!(hash, ContentHash::compute("a: 1\n"));
        assert_ne!(hash, ContentHash::compute("a: 2\n"));
    }

    #[test]
    fn test_param_hash_distinguishes_sets() {
        let one = Params::from_pairs([("a", "1")]);
        let two = Params::from_pairs([("a", "1"), ("b", "2")]);
        assert_ne!(ParamHash::compute(&one, true), ParamHash::compute(&two, true));
        assert_ne!(ParamHash::compute(&one, true), ParamHash::compute(&one, false));
    }

    #[test]
    fn test_param_hash_separates_names_from_values() {
        let joined_name = Params::from_pairs([("a=b", "c")]);
        let joined_value = Params::from_pairs([("a", "b=c")]);
        assert_ne!(
            ParamHash::compute(&joined_name, true),
            ParamHash::compute(&joined_value, true)
        );

        let split = Params::from_pairs([("a", "1"), ("b", "2")]);
        let embedded = Params::from_pairs([("a", "1\nb=2")]);
        assert_ne!(ParamHash::compute(&split, true), ParamHash::compute(&embedded, true));
    }

    #[test]
    fn test_param_hash_ignores_nested_key_order() {
        let mut first = Mapping::new();
        first.insert(Value::from("x"), Value::from(1));
        first.insert(Value::from("y"), Value::from(2));
        let mut second = Mapping::new();
        second.insert(Value::from("y"), Value::from(2));
        second.insert(Value::from("x"), Value::from(1));

        let a = Params::from_pairs([("cfg", Value::Mapping(first))]);
        let b = Params::from_pairs([("cfg", Value::Mapping(second))]);
        assert_eq!(ParamHash::compute(&a, true), ParamHash::compute(&b, true));
    }
}
