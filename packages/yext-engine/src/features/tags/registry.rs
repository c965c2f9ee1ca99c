//! Custom tag registry
//!
//! Tags are keyed by their full (expanded) name. A tag written as
//! `name(arg)` resolves to the definition registered for `name` and passes
//! `arg` to its constructor.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::shared::models::{DeclaredType, Value};

/// Whether a computed value is acceptable for the tag
pub type ResolveFn = fn(&Value) -> bool;
/// Build the tagged value; the argument is the `(arg)` suffix, if any
pub type ConstructFn = fn(Value, Option<&str>) -> Result<Value, String>;
/// Turn a constructed value back into plain data for dumping
pub type RepresentFn = fn(&Value) -> Value;

#[derive(Debug, Clone)]
pub struct TagDefinition {
    /// Full tag, e.g. `!upper` or `tag:example.com,2024:point`
    pub tag: String,
    /// Node shape the tag applies to
    pub kind: DeclaredType,
    pub resolve: Option<ResolveFn>,
    pub construct: ConstructFn,
    pub represent: Option<RepresentFn>,
}

impl TagDefinition {
    pub fn new(tag: impl Into<String>, kind: DeclaredType, construct: ConstructFn) -> Self {
        Self {
            tag: tag.into(),
            kind,
            resolve: None,
            construct,
            represent: None,
        }
    }

    pub fn with_resolve(mut self, resolve: ResolveFn) -> Self {
        self.resolve = Some(resolve);
        self
    }

    pub fn with_represent(mut self, represent: RepresentFn) -> Self {
        self.represent = Some(represent);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    definitions: HashMap<String, TagDefinition>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: TagDefinition) -> Option<TagDefinition> {
        self.definitions.insert(definition.tag.clone(), definition)
    }

    pub fn with(mut self, definition: TagDefinition) -> Self {
        self.register(definition);
        self
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Find the definition for a full tag and split off a `(arg)` suffix
    pub fn lookup<'a>(&'a self, tag: &'a str) -> Option<(&'a TagDefinition, Option<&'a str>)> {
        if let Some(definition) = self.definitions.get(tag) {
            return Some((definition, None));
        }
        let inner = tag.strip_suffix(')')?;
        let open = inner.find('(')?;
        let definition = self.definitions.get(&inner[..open])?;
        Some((definition, Some(&inner[open + 1..])))
    }

    /// Run the hooks of `tag` against `value`.
    ///
    /// `None` if the tag is not registered. Kind mismatches, rejected
    /// values, constructor errors and panicking hooks are `Err`.
    pub fn apply(&self, tag: &str, value: Value) -> Option<Result<Value, String>> {
        let (definition, arg) = self.lookup(tag)?;
        if !definition.kind.matches(&value) {
            return Some(Err(format!(
                "tag {} expects a {} node, found {}",
                definition.tag,
                definition.kind,
                DeclaredType::of(&value)
            )));
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            if let Some(resolve) = definition.resolve {
                if !resolve(&value) {
                    return Err(format!("value rejected by tag {}", definition.tag));
                }
            }
            (definition.construct)(value, arg)
        }));

        Some(match outcome {
            Ok(result) => result,
            Err(_) => Err(format!("tag {} hook panicked", definition.tag)),
        })
    }

    /// Plain representation of a constructed value, for callers that dump
    /// values themselves. Tags without a `represent` hook return the value
    /// unchanged.
    pub fn represent(&self, tag: &str, value: &Value) -> Option<Value> {
        let (definition, _) = self.lookup(tag)?;
        let represent = definition.represent;
        let value = value.clone();
        catch_unwind(AssertUnwindSafe(move || match represent {
            Some(represent) => represent(&value),
            None => value,
        }))
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(value: Value, _: Option<&str>) -> Result<Value, String> {
        match value {
            Value::String(s) => Ok(Value::String(s.to_uppercase())),
            other => Ok(other),
        }
    }

    fn repeat(value: Value, arg: Option<&str>) -> Result<Value, String> {
        let times: usize = arg.unwrap_or("1").parse().map_err(|_| "bad count".to_string())?;
        let s = value.as_str().unwrap_or_default().repeat(times);
        Ok(Value::String(s))
    }

    fn explode(_: Value, _: Option<&str>) -> Result<Value, String> {
        panic!("boom")
    }

    fn registry() -> TagRegistry {
        TagRegistry::new()
            .with(TagDefinition::new("!upper", DeclaredType::Scalar, upper))
            .with(TagDefinition::new("!repeat", DeclaredType::Scalar, repeat))
            .with(TagDefinition::new("!explode", DeclaredType::Scalar, explode))
    }

    #[test]
    fn test_apply_and_arguments() {
        let registry = registry();
        assert_eq!(
            registry.apply("!upper", Value::from("abc")),
            Some(Ok(Value::from("ABC")))
        );
        assert_eq!(
            registry.apply("!repeat(3)", Value::from("ab")),
            Some(Ok(Value::from("ababab")))
        );
        assert_eq!(registry.apply("!unknown", Value::Null), None);
    }

    #[test]
    fn test_kind_mismatch_and_panic() {
        let registry = registry();
        let seq = Value::Sequence(vec![Value::from(1)]);
        assert!(matches!(registry.apply("!upper", seq), Some(Err(msg)) if msg.contains("expects a scalar")));
        assert!(matches!(
            registry.apply("!explode", Value::from("x")),
            Some(Err(msg)) if msg.contains("panicked")
        ));
    }

    #[test]
    fn test_represent_defaults_to_identity() {
        let registry = registry();
        assert_eq!(
            registry.represent("!upper", &Value::from("X")),
            Some(Value::from("X"))
        );
    }
}
